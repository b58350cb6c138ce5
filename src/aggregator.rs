//! Balance and statistics derived from the ledger. Nothing here is persisted.
//!
//! One rule decides whether a transaction credits or debits a user, and both
//! [`balance`] and [`stats`] go through it:
//!
//! 1. If the user is the actor (`userId`), the transaction `type` decides.
//!    This includes transactions the user addressed to themselves.
//! 2. Otherwise the user is the recipient and the amount is incoming,
//!    whatever the actor's `type` says.
//!
//! Transactions the user is not part of, and transactions that are not
//! completed, are ignored.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::dto::{Transaction, TransactionStatus, TransactionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStats {
    pub balance: Decimal,
    pub total_incoming: Decimal,
    pub total_outgoing: Decimal,
    pub transaction_count: usize,
}

/// Direction of `transaction` from `user_id`'s point of view, or `None` if it
/// does not count towards the user's wallet.
pub fn direction_for(user_id: &str, transaction: &Transaction) -> Option<TransactionType> {
    if transaction.status != TransactionStatus::Completed {
        return None;
    }
    if transaction.user_id == user_id {
        Some(transaction.tx_type)
    } else if transaction.recipient_id.as_deref() == Some(user_id) {
        Some(TransactionType::Incoming)
    } else {
        None
    }
}

pub fn stats<'a>(
    user_id: &str,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> WalletStats {
    let mut stats = WalletStats::default();
    for transaction in transactions {
        match direction_for(user_id, transaction) {
            Some(TransactionType::Incoming) => stats.total_incoming += transaction.amount,
            Some(TransactionType::Outgoing) => stats.total_outgoing += transaction.amount,
            None => continue,
        }
        stats.transaction_count += 1;
    }
    stats.balance = stats.total_incoming - stats.total_outgoing;
    stats
}

pub fn balance<'a>(
    user_id: &str,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Decimal {
    stats(user_id, transactions).balance
}
