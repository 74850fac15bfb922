//! The standard set of 20 ESG indicators.
//!
//! Environmental indicators follow ESRS E1 (climate change), social ones
//! ESRS S1 (own workforce), governance ones ESRS G1, plus one ESRS 2
//! supply-chain disclosure.

use std::sync::LazyLock;

use crate::types::indicator::{Category, Indicator};

static CATALOG: LazyLock<Vec<Indicator>> = LazyLock::new(build);

fn indicator(
    code: &str,
    name: &str,
    category: Category,
    description: &str,
    unit: &str,
    keywords: &[&str],
) -> Indicator {
    Indicator::new(code, name, category, description, unit).with_keywords(keywords.iter().copied())
}

fn build() -> Vec<Indicator> {
    use Category::*;

    vec![
        // ESRS E1
        indicator(
            "E1-1",
            "Total Scope 1 GHG Emissions",
            Environmental,
            "Direct greenhouse gas emissions from owned or controlled sources",
            "tCO2e",
            &["scope 1", "direct emissions", "GHG", "greenhouse gas", "tCO2e"],
        ),
        indicator(
            "E1-2",
            "Total Scope 2 GHG Emissions",
            Environmental,
            "Indirect GHG emissions from purchased electricity, heat, or steam",
            "tCO2e",
            &["scope 2", "indirect emissions", "electricity", "purchased energy", "tCO2e"],
        ),
        indicator(
            "E1-3",
            "Total Scope 3 GHG Emissions",
            Environmental,
            "All other indirect emissions in the value chain",
            "tCO2e",
            &["scope 3", "value chain", "indirect emissions", "financed emissions", "tCO2e"],
        ),
        indicator(
            "E1-4",
            "GHG Emissions Intensity",
            Environmental,
            "GHG emissions per million euros of revenue",
            "tCO2e per €M revenue",
            &["emissions intensity", "carbon intensity", "tCO2e per", "emissions per revenue"],
        ),
        indicator(
            "E1-5",
            "Total Energy Consumption",
            Environmental,
            "Total energy consumption from all sources",
            "MWh or GJ",
            &["energy consumption", "total energy", "energy use", "MWh", "GJ"],
        ),
        indicator(
            "E1-6",
            "Renewable Energy Percentage",
            Environmental,
            "Percentage of energy from renewable sources",
            "%",
            &["renewable energy", "green energy", "renewable percentage", "renewable sources"],
        ),
        indicator(
            "E1-7",
            "Net Zero Target Year",
            Environmental,
            "Target year for achieving net zero emissions",
            "year",
            &["net zero", "carbon neutral", "target year", "2030", "2040", "2050"],
        ),
        indicator(
            "E1-8",
            "Green Financing Volume",
            Environmental,
            "Volume of green financing provided",
            "€ millions",
            &[
                "green financing",
                "sustainable finance",
                "green bonds",
                "climate finance",
                "€M",
                "million",
            ],
        ),
        // ESRS S1
        indicator(
            "S1-1",
            "Total Employees",
            Social,
            "Total number of employees (full-time equivalent)",
            "FTE",
            &["workforce", "employees", "headcount", "staff", "FTE", "full-time equivalent"],
        ),
        indicator(
            "S1-2",
            "Female Employees",
            Social,
            "Percentage of female employees",
            "%",
            &["female employees", "women", "gender diversity", "female representation"],
        ),
        indicator(
            "S1-3",
            "Gender Pay Gap",
            Social,
            "Gender pay gap percentage",
            "%",
            &["gender pay gap", "pay gap", "wage gap", "equal pay"],
        ),
        indicator(
            "S1-4",
            "Training Hours per Employee",
            Social,
            "Average training hours per employee per year",
            "hours",
            &["training hours", "development", "learning", "training per employee"],
        ),
        indicator(
            "S1-5",
            "Employee Turnover Rate",
            Social,
            "Annual employee turnover rate",
            "%",
            &["turnover rate", "attrition", "employee retention", "turnover"],
        ),
        indicator(
            "S1-6",
            "Work-Related Accidents",
            Social,
            "Number of work-related accidents",
            "count",
            &["work-related accidents", "workplace accidents", "injuries", "incidents", "safety"],
        ),
        indicator(
            "S1-7",
            "Collective Bargaining Coverage",
            Social,
            "Percentage of employees covered by collective bargaining agreements",
            "%",
            &["collective bargaining", "union coverage", "collective agreements", "trade union"],
        ),
        // ESRS G1 and ESRS 2
        indicator(
            "G1-1",
            "Board Female Representation",
            Governance,
            "Percentage of women on the board",
            "%",
            &["women directors", "board diversity", "female board members", "women on board"],
        ),
        indicator(
            "G1-2",
            "Board Meetings",
            Governance,
            "Number of board meetings held annually",
            "count/year",
            &["board meetings", "governance meetings", "meetings per year"],
        ),
        indicator(
            "G1-3",
            "Corruption Incidents",
            Governance,
            "Number of corruption incidents reported",
            "count",
            &["corruption", "bribery", "anti-corruption", "corruption incidents", "fraud"],
        ),
        indicator(
            "G1-4",
            "Avg Payment Period to Suppliers",
            Governance,
            "Average payment period to suppliers in days",
            "days",
            &["payment period", "supplier payment", "payment terms", "days payable"],
        ),
        indicator(
            "ESRS2-1",
            "Suppliers Screened for ESG",
            Esrs2,
            "Percentage of suppliers screened for ESG criteria",
            "%",
            &["supplier screening", "ESG screening", "supplier assessment", "supply chain ESG"],
        ),
    ]
}

/// All indicators, in catalog order.
pub fn all() -> &'static [Indicator] {
    &CATALOG
}

/// Look up an indicator by code.
pub fn by_code(code: &str) -> Option<&'static Indicator> {
    all().iter().find(|i| i.code == code)
}

/// Indicators in one category, in catalog order.
pub fn by_category(category: Category) -> Vec<&'static Indicator> {
    all().iter().filter(|i| i.category == category).collect()
}

/// Resolve a list of codes, skipping unknown ones.
///
/// Returns the whole catalog when `codes` is empty.
pub fn select(codes: &[impl AsRef<str>]) -> Vec<Indicator> {
    if codes.is_empty() {
        return all().to_vec();
    }
    codes
        .iter()
        .filter_map(|c| by_code(c.as_ref()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_twenty_unique_codes() {
        let codes: HashSet<&str> = all().iter().map(|i| i.code.as_str()).collect();
        assert_eq!(all().len(), 20);
        assert_eq!(codes.len(), 20);
    }

    #[test]
    fn test_every_indicator_has_keywords() {
        assert!(all().iter().all(|i| !i.keywords.is_empty()));
    }

    #[test]
    fn test_category_counts() {
        assert_eq!(by_category(Category::Environmental).len(), 8);
        assert_eq!(by_category(Category::Social).len(), 7);
        assert_eq!(by_category(Category::Governance).len(), 4);
        assert_eq!(by_category(Category::Esrs2).len(), 1);
    }

    #[test]
    fn test_by_code() {
        let indicator = by_code("S1-3").unwrap();
        assert_eq!(indicator.name, "Gender Pay Gap");
        assert_eq!(indicator.expected_unit, "%");
        assert!(by_code("X9-9").is_none());
    }

    #[test]
    fn test_select_skips_unknown_and_defaults_to_all() {
        let picked = select(&["E1-1", "nope", "G1-3"]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[1].code, "G1-3");

        let none: [&str; 0] = [];
        assert_eq!(select(&none).len(), 20);
    }
}
