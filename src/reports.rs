use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};

use crate::categorizer::CategoryMap;
use crate::error::{Result, SpendsortError};
use crate::fmt::czk;
use crate::importer::Bank;
use crate::models::{CategoryTotal, Transaction};

/// Totals closer to zero than this are reported as neutral.
pub const NEUTRAL_EPSILON: f64 = 0.01;

/// Length of the normalized month in days.
pub const MONTH_DAYS: f64 = 30.0;

pub fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Multiplier that scales `days` worth of data to one month.
pub fn period_factor(days: u32) -> Result<f64> {
    if days == 0 {
        return Err(SpendsortError::InvalidPeriod(days));
    }
    Ok(MONTH_DAYS / f64::from(days))
}

/// Category totals split into three disjoint buckets.
///
/// Incomes are sorted largest first, expenses most negative first and
/// neutral categories keep the order they were first seen in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub incomes: Vec<CategoryTotal>,
    pub expenses: Vec<CategoryTotal>,
    pub neutral: Vec<CategoryTotal>,
}

impl Aggregation {
    pub fn total_income(&self) -> f64 {
        self.incomes.iter().map(|c| c.total).sum()
    }

    pub fn total_expense(&self) -> f64 {
        self.expenses.iter().map(|c| c.total).sum()
    }

    pub fn balance(&self) -> f64 {
        self.total_income() + self.total_expense()
    }

    /// Category names in report order: incomes, expenses, neutral.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.incomes
            .iter()
            .chain(&self.expenses)
            .chain(&self.neutral)
            .map(|c| c.name.as_str())
    }
}

/// Sum month-normalized amounts per category, leaving out skip-listed
/// categories.
pub fn aggregate(
    transactions: &[Transaction],
    days: u32,
    mapping: &CategoryMap,
) -> Result<Aggregation> {
    let factor = period_factor(days)?;

    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for txn in transactions {
        if mapping.is_skipped(&txn.category) {
            continue;
        }
        let slot = *index.entry(txn.category.as_str()).or_insert_with(|| {
            totals.push(CategoryTotal {
                name: txn.category.clone(),
                total: 0.0,
            });
            totals.len() - 1
        });
        totals[slot].total += txn.amount * factor;
    }

    let mut result = Aggregation::default();
    for item in totals {
        if item.total.abs() < NEUTRAL_EPSILON {
            result.neutral.push(item);
        } else if item.total > 0.0 {
            result.incomes.push(item);
        } else {
            result.expenses.push(item);
        }
    }
    result.incomes.sort_by(|a, b| b.total.total_cmp(&a.total));
    result.expenses.sort_by(|a, b| a.total.total_cmp(&b.total));
    Ok(result)
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DetailEntry {
    pub bank: Bank,
    pub amount: String,
    pub info: String,
    pub date: String,
}

/// Transactions behind each reported category, in report order.
#[derive(Debug, Clone, Default)]
pub struct Details {
    pub categories: Vec<(String, Vec<DetailEntry>)>,
}

impl Serialize for Details {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        crate::ordered::serialize(&self.categories, serializer)
    }
}

pub fn group_details(transactions: &[Transaction], aggregation: &Aggregation) -> Details {
    let mut categories: Vec<(String, Vec<DetailEntry>)> = aggregation
        .categories()
        .map(|name| (name.to_string(), Vec::new()))
        .collect();
    let index: HashMap<String, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, (name, _))| (name.clone(), i))
        .collect();

    for txn in transactions {
        if let Some(&slot) = index.get(&txn.category) {
            categories[slot].1.push(DetailEntry {
                bank: txn.bank,
                amount: czk(txn.amount),
                info: txn.info.clone(),
                date: txn.date.clone(),
            });
        }
    }
    Details { categories }
}

// ---------------------------------------------------------------------------
// Summary document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Totals {
    pub incomes: f64,
    pub expenses: f64,
    pub balance: f64,
}

/// The `summary.json` artifact. Amounts are rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Summary {
    pub totals: Totals,
    #[serde(with = "crate::ordered")]
    pub incomes: Vec<(String, f64)>,
    #[serde(with = "crate::ordered")]
    pub expenses: Vec<(String, f64)>,
    pub neutral: Vec<String>,
}

fn rounded(items: &[CategoryTotal]) -> Vec<(String, f64)> {
    items
        .iter()
        .map(|c| (c.name.clone(), round2(c.total)))
        .collect()
}

fn add_into(target: &mut Vec<(String, f64)>, source: &[(String, f64)]) {
    for (name, amount) in source {
        match target.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = round2(entry.1 + amount),
            None => target.push((name.clone(), *amount)),
        }
    }
}

impl Summary {
    pub fn from_aggregation(aggregation: &Aggregation) -> Self {
        Self {
            totals: Totals {
                incomes: round2(aggregation.total_income()),
                expenses: round2(aggregation.total_expense()),
                balance: round2(aggregation.balance()),
            },
            incomes: rounded(&aggregation.incomes),
            expenses: rounded(&aggregation.expenses),
            neutral: aggregation.neutral.iter().map(|c| c.name.clone()).collect(),
        }
    }

    /// Add another summary into this one: matching categories and totals
    /// are summed, neutral names are unioned.
    pub fn absorb(&mut self, other: &Summary) {
        add_into(&mut self.incomes, &other.incomes);
        add_into(&mut self.expenses, &other.expenses);
        self.totals.incomes = round2(self.totals.incomes + other.totals.incomes);
        self.totals.expenses = round2(self.totals.expenses + other.totals.expenses);
        self.totals.balance = round2(self.totals.balance + other.totals.balance);
        for name in &other.neutral {
            if !self.neutral.contains(name) {
                self.neutral.push(name.clone());
            }
        }
    }
}

pub fn combine<'a, I>(summaries: I) -> Summary
where
    I: IntoIterator<Item = &'a Summary>,
{
    let mut combined = Summary::default();
    for summary in summaries {
        combined.absorb(summary);
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn txn(category: &str, amount: f64) -> Transaction {
        Transaction {
            bank: Bank::Csob,
            amount,
            category: category.to_string(),
            info: format!("{category} shop"),
            date: "01.03.2024".to_string(),
        }
    }

    fn mapping() -> CategoryMap {
        CategoryMap::from_json(r#"{"skip": ["Transfer"]}"#).unwrap()
    }

    fn names(items: &[CategoryTotal]) -> Vec<&str> {
        items.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_period_normalization() {
        let txns = vec![txn("Salary", 300.0)];
        let month = aggregate(&txns, 30, &mapping()).unwrap();
        assert_eq!(month.incomes[0].total, 300.0);
        let ten_days = aggregate(&txns, 10, &mapping()).unwrap();
        assert_eq!(ten_days.incomes[0].total, 900.0);
        let two_months = aggregate(&txns, 60, &mapping()).unwrap();
        assert_eq!(two_months.incomes[0].total, 150.0);
    }

    #[test]
    fn test_zero_days_is_rejected() {
        let err = aggregate(&[], 0, &mapping()).unwrap_err();
        assert!(matches!(err, SpendsortError::InvalidPeriod(0)));
    }

    #[test]
    fn test_sort_order() {
        let txns = vec![
            txn("Bonus", 500.0),
            txn("Rent", -12000.0),
            txn("Salary", 40000.0),
            txn("Food", -3000.0),
            txn("Interest", 12.5),
            txn("Fun", -800.0),
        ];
        let result = aggregate(&txns, 30, &mapping()).unwrap();
        assert_eq!(names(&result.incomes), vec!["Salary", "Bonus", "Interest"]);
        assert_eq!(names(&result.expenses), vec!["Rent", "Food", "Fun"]);
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let txns = vec![
            txn("Salary", 1000.0),
            txn("Refunds", 20.0),
            txn("Refunds", -20.0),
            txn("Food", -250.0),
            txn("Salary", 500.0),
            txn("Dust", 0.004),
            txn("Transfer", -7000.0),
        ];
        let result = aggregate(&txns, 45, &mapping()).unwrap();

        let all: Vec<&str> = result.categories().collect();
        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(all.len(), unique.len());
        let expected: HashSet<&str> = ["Salary", "Refunds", "Food", "Dust"].into_iter().collect();
        assert_eq!(unique, expected);
        assert_eq!(names(&result.neutral), vec!["Refunds", "Dust"]);

        let factor = 30.0 / 45.0;
        let included: f64 = txns
            .iter()
            .filter(|t| t.category != "Transfer")
            .map(|t| t.amount * factor)
            .sum();
        let bucketed: f64 = result
            .incomes
            .iter()
            .chain(&result.expenses)
            .chain(&result.neutral)
            .map(|c| c.total)
            .sum();
        assert!((included - bucketed).abs() < 1e-9);
    }

    #[test]
    fn test_totals() {
        let txns = vec![txn("Salary", 2000.0), txn("Food", -1234.56)];
        let result = aggregate(&txns, 30, &mapping()).unwrap();
        assert_eq!(result.total_income(), 2000.0);
        assert_eq!(result.total_expense(), -1234.56);
        assert!((result.balance() - 765.44).abs() < 1e-9);
    }

    #[test]
    fn test_details_follow_report_order_and_skip_list() {
        let txns = vec![
            txn("Food", -100.0),
            txn("Salary", 2000.0),
            txn("Transfer", -50.0),
            txn("Food", -1234.5),
        ];
        let result = aggregate(&txns, 30, &mapping()).unwrap();
        let details = group_details(&txns, &result);
        let keys: Vec<&str> = details.categories.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Salary", "Food"]);
        assert_eq!(details.categories[1].1.len(), 2);
        assert_eq!(details.categories[1].1[1].amount, "-1 234,50 CZK");

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["Food"][0]["bank"], "csob");
        assert_eq!(json["Food"][0]["info"], "Food shop");
        assert_eq!(json["Salary"][0]["date"], "01.03.2024");
    }

    #[test]
    fn test_summary_from_aggregation() {
        let txns = vec![
            txn("Salary", 1000.004),
            txn("Food", -333.333),
            txn("Refunds", 5.0),
            txn("Refunds", -5.0),
        ];
        let result = aggregate(&txns, 30, &mapping()).unwrap();
        let summary = Summary::from_aggregation(&result);
        assert_eq!(summary.incomes, vec![("Salary".to_string(), 1000.0)]);
        assert_eq!(summary.expenses, vec![("Food".to_string(), -333.33)]);
        assert_eq!(summary.neutral, vec!["Refunds".to_string()]);
        assert_eq!(summary.totals.balance, 666.67);

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.starts_with(r#"{"totals":{"incomes":1000.0,"#));
        assert!(json.contains(r#""neutral":["Refunds"]"#));
    }

    #[test]
    fn test_combine_sums_and_unions() {
        let first: Summary = serde_json::from_str(
            r#"{
                "totals": {"incomes": 100.0, "expenses": -40.0, "balance": 60.0},
                "incomes": {"Salary": 100.0},
                "expenses": {"Food": -30.0, "Fun": -10.0},
                "neutral": ["Refunds"]
            }"#,
        )
        .unwrap();
        let second: Summary = serde_json::from_str(
            r#"{
                "totals": {"incomes": 50.5, "expenses": -20.25, "balance": 30.25},
                "incomes": {"Gift": 0.5, "Salary": 50.0},
                "expenses": {"Fun": -20.25},
                "neutral": ["Refunds", "Cashback"]
            }"#,
        )
        .unwrap();

        let combined = combine([&first, &second]);
        assert_eq!(
            combined.incomes,
            vec![("Salary".to_string(), 150.0), ("Gift".to_string(), 0.5)]
        );
        assert_eq!(
            combined.expenses,
            vec![("Food".to_string(), -30.0), ("Fun".to_string(), -30.25)]
        );
        assert_eq!(combined.totals.incomes, 150.5);
        assert_eq!(combined.totals.expenses, -60.25);
        assert_eq!(combined.totals.balance, 90.25);
        assert_eq!(combined.neutral, vec!["Refunds", "Cashback"]);
    }

    #[test]
    fn test_summary_tolerates_missing_sections() {
        let summary: Summary = serde_json::from_str(r#"{"incomes": {"Salary": 1.0}}"#).unwrap();
        assert_eq!(summary.totals, Totals::default());
        assert!(summary.neutral.is_empty());
    }
}
