//! Append-only transaction history.
//!
//! Transactions are created once by [`TransactionLedger::append`] and never
//! mutated or deleted afterwards.

use crate::clock::Clock;
use crate::dto::{new_id, NewTransaction, Transaction, TransactionFilter, TransactionStatus};
use crate::stores::{StoreHandle, TRANSACTIONS_NAMESPACE};
use crate::{Error, Result};

#[derive(Clone)]
pub struct TransactionLedger {
    store: StoreHandle,
    clock: Clock,
}

impl TransactionLedger {
    pub fn new(store: StoreHandle, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// Records a completed transaction.
    ///
    /// `createdAt` comes from the ledger clock unless the caller supplied one.
    pub async fn append(&self, data: NewTransaction) -> Result<Transaction> {
        data.validate()?;

        let created_at = match data.created_at {
            Some(at) => {
                self.clock.observe(at);
                at
            }
            None => self.clock.now(),
        };
        let transaction = Transaction {
            id: new_id("tx"),
            user_id: data.user_id,
            recipient_id: data.recipient_id,
            tx_type: data.tx_type,
            amount: data.amount,
            payment_method_id: data.payment_method_id,
            description: data.description,
            status: TransactionStatus::Completed,
            created_at,
        };
        let record = transaction.clone();
        self.store
            .update(TRANSACTIONS_NAMESPACE, move |transactions: &mut Vec<Transaction>| {
                transactions.push(record);
                Ok(())
            })
            .await?;

        tracing::info!(
            user_id = %transaction.user_id,
            tx_id = %transaction.id,
            tx_type = ?transaction.tx_type,
            amount = %transaction.amount,
            "Appended transaction"
        );
        Ok(transaction)
    }

    pub async fn get(&self, transaction_id: &str) -> Result<Transaction> {
        self.all()
            .await?
            .into_iter()
            .find(|t| t.id == transaction_id)
            .ok_or_else(|| Error::transaction_not_found(transaction_id))
    }

    /// Transactions where `user_id` is the actor or the recipient, narrowed by
    /// `filter`, newest first. Equal timestamps keep insertion order.
    pub async fn query(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        filter.validate()?;

        let mut matching: Vec<_> = self
            .all()
            .await?
            .into_iter()
            .filter(|t| t.involves(user_id) && filter.matches(t))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        tracing::debug!(user_id, count = matching.len(), "Queried transactions");
        Ok(matching)
    }

    /// Every stored transaction in insertion order.
    pub(crate) async fn all(&self) -> Result<Vec<Transaction>> {
        self.store.load(TRANSACTIONS_NAMESPACE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::TransactionType;
    use crate::stores::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn ledger() -> TransactionLedger {
        TransactionLedger::new(StoreHandle::new(MemoryStore::new()), Clock::new())
    }

    #[tokio::test]
    async fn test_append_then_query_round_trip() {
        let ledger = ledger();
        let data = NewTransaction::new("u1", TransactionType::Outgoing, dec!(42.10))
            .recipient("u2")
            .payment_method("pm_1")
            .description("Dinner");

        let appended = ledger.append(data).await.unwrap();

        assert!(appended.id.starts_with("tx_"));
        assert_eq!(appended.status, TransactionStatus::Completed);
        let found = ledger.query("u1", &TransactionFilter::new()).await.unwrap();
        assert_eq!(found, vec![appended.clone()]);
        assert_eq!(found[0].recipient_id.as_deref(), Some("u2"));
        assert_eq!(found[0].amount, dec!(42.10));
        assert_eq!(found[0].description, "Dinner");
        assert_eq!(ledger.get(&appended.id).await.unwrap(), appended);
    }

    #[tokio::test]
    async fn test_append_rejects_negative_amount() {
        let ledger = ledger();
        let result = ledger
            .append(NewTransaction::new("u1", TransactionType::Incoming, dec!(-5)))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(ledger.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        assert!(matches!(
            ledger().get("tx_missing").await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_query_includes_recipient_side() {
        let ledger = ledger();
        ledger
            .append(NewTransaction::new("u2", TransactionType::Outgoing, dec!(10)).recipient("u1"))
            .await
            .unwrap();
        ledger
            .append(NewTransaction::new("u3", TransactionType::Outgoing, dec!(10)))
            .await
            .unwrap();

        let found = ledger.query("u1", &TransactionFilter::new()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].user_id, "u2");
    }

    #[tokio::test]
    async fn test_query_newest_first_with_stable_ties() {
        let ledger = ledger();
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        for (description, offset) in [("old", 0), ("tie-a", 60), ("tie-b", 60), ("new", 120)] {
            ledger
                .append(
                    NewTransaction::new("u1", TransactionType::Incoming, dec!(1))
                        .description(description)
                        .created_at(base + Duration::seconds(offset)),
                )
                .await
                .unwrap();
        }

        let order: Vec<_> = ledger
            .query("u1", &TransactionFilter::new())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.description)
            .collect();
        assert_eq!(order, vec!["new", "tie-a", "tie-b", "old"]);
    }

    #[tokio::test]
    async fn test_query_by_type_is_subset() {
        let ledger = ledger();
        ledger
            .append(NewTransaction::new("u1", TransactionType::Incoming, dec!(100)))
            .await
            .unwrap();
        ledger
            .append(NewTransaction::new("u1", TransactionType::Outgoing, dec!(30)))
            .await
            .unwrap();

        let all = ledger.query("u1", &TransactionFilter::new()).await.unwrap();
        let incoming = ledger
            .query("u1", &TransactionFilter::new().tx_type(TransactionType::Incoming))
            .await
            .unwrap();

        assert_eq!(incoming.len(), 1);
        assert!(incoming.iter().all(|t| t.tx_type == TransactionType::Incoming));
        assert!(incoming.iter().all(|t| all.contains(t)));
    }

    #[tokio::test]
    async fn test_query_by_payment_method_and_range() {
        let ledger = ledger();
        let day = |d| Utc.with_ymd_and_hms(2024, 2, d, 0, 0, 0).unwrap();
        for (d, method) in [(1, "pm_a"), (2, "pm_b"), (3, "pm_a"), (4, "pm_a")] {
            ledger
                .append(
                    NewTransaction::new("u1", TransactionType::Outgoing, dec!(5))
                        .payment_method(method)
                        .created_at(day(d)),
                )
                .await
                .unwrap();
        }

        let found = ledger
            .query(
                "u1",
                &TransactionFilter::new()
                    .payment_method("pm_a")
                    .start_date(day(2))
                    .end_date(day(4)),
            )
            .await
            .unwrap();
        let dates: Vec<_> = found.iter().map(|t| t.created_at).collect();
        assert_eq!(dates, vec![day(4), day(3)]);
    }

    #[tokio::test]
    async fn test_query_rejects_inverted_range() {
        let now = Utc::now();
        let filter = TransactionFilter::new()
            .start_date(now)
            .end_date(now - Duration::days(1));
        assert!(matches!(
            ledger().query("u1", &filter).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_generated_timestamps_do_not_go_backwards() {
        let ledger = ledger();
        let future = Utc::now() + Duration::days(1);
        ledger
            .append(NewTransaction::new("u1", TransactionType::Incoming, dec!(1)).created_at(future))
            .await
            .unwrap();
        let later = ledger
            .append(NewTransaction::new("u1", TransactionType::Incoming, dec!(1)))
            .await
            .unwrap();
        assert!(later.created_at >= future);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_kept() {
        let store = MemoryStore::new().with_latency(std::time::Duration::from_millis(1));
        let ledger = TransactionLedger::new(StoreHandle::new(store), Clock::new());

        let tasks: Vec<_> = (0..25)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger
                        .append(
                            NewTransaction::new("u1", TransactionType::Incoming, dec!(1))
                                .description(format!("t{i}")),
                        )
                        .await
                })
            })
            .collect();
        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap().unwrap().id);
        }

        let stored = ledger.query("u1", &TransactionFilter::new()).await.unwrap();
        assert_eq!(stored.len(), 25);
        assert!(stored.iter().all(|t| ids.contains(&t.id)));
    }
}
