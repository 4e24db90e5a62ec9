use std::fmt;

use crate::fmt::czk;
use crate::importer::Bank;

/// One normalized row from a bank export.
///
/// `category` is always the final label: resolved, then rewritten.
/// `date` is kept exactly as the bank printed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub bank: Bank,
    pub amount: f64,
    pub category: String,
    pub info: String,
    pub date: String,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})\t-\t{}: {} ({}, {})",
            self.bank,
            self.category,
            czk(self.amount),
            self.info,
            self.date
        )
    }
}

/// Accumulated amount for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub total: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_display() {
        let txn = Transaction {
            bank: Bank::Raiffeisenbank,
            amount: -1234.5,
            category: "Groceries".to_string(),
            info: "Albert".to_string(),
            date: "01.03.2024".to_string(),
        };
        assert_eq!(
            txn.to_string(),
            "(raiffeisenbank)\t-\tGroceries: -1 234,50 CZK (Albert, 01.03.2024)"
        );
    }
}
