//! Cross-account transfer check.
//!
//! Money moved between the user's own accounts shows up once in each
//! bank's export. Before totals are computed every transfer must be paired
//! with an equal and opposite transfer, otherwise the report would count
//! money that never left.

use tracing::{info, warn};

use crate::error::{Result, SpendsortError};
use crate::models::Transaction;

pub struct TransferCheck<'a> {
    pub total: usize,
    pub matched: usize,
    pub unmatched: Vec<&'a Transaction>,
}

impl TransferCheck<'_> {
    pub fn is_balanced(&self) -> bool {
        self.unmatched.is_empty()
    }

    pub fn ensure_balanced(&self) -> Result<()> {
        if self.is_balanced() {
            Ok(())
        } else {
            Err(SpendsortError::UnmatchedTransfers {
                matched: self.matched,
                total: self.total,
            })
        }
    }
}

/// Pair transfers in `transfer_category` by exactly negated amounts.
///
/// Pairing is greedy: each unpaired transfer, in batch order, takes the
/// first later unpaired transfer with the negated amount. With three or
/// more transfers of the same size the leftover is whichever comes last,
/// not necessarily the one a human would pick.
pub fn reconcile_transfers<'a>(
    transactions: &'a [Transaction],
    transfer_category: &str,
) -> TransferCheck<'a> {
    let transfers: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.category == transfer_category)
        .collect();

    let mut paired = vec![false; transfers.len()];
    for i in 0..transfers.len() {
        if paired[i] {
            continue;
        }
        let wanted = -transfers[i].amount;
        if let Some(j) = (i + 1..transfers.len()).find(|&j| !paired[j] && transfers[j].amount == wanted) {
            paired[i] = true;
            paired[j] = true;
        }
    }

    let unmatched: Vec<&Transaction> = transfers
        .iter()
        .zip(&paired)
        .filter(|(_, p)| !**p)
        .map(|(t, _)| *t)
        .collect();
    let check = TransferCheck {
        total: transfers.len(),
        matched: transfers.len() - unmatched.len(),
        unmatched,
    };

    if check.is_balanced() {
        info!("All {} transfers matched", check.total);
    } else {
        warn!("{} of {} transfers matched", check.matched, check.total);
    }
    check
}
