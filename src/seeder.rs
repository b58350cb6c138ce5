//! Idempotent loading of demo data into the registry and the ledger.
//!
//! Seed records have no ids. Duplicates are detected by natural key instead:
//! a payment method by its masked `number`, a transaction by its
//! `description`, both scoped to the seeded user. Re-running the same seed
//! therefore leaves the persisted collections unchanged.
//!
//! All writes go through [`PaymentMethodRegistry`] and [`TransactionLedger`],
//! so seeding obeys the same invariants as normal operations.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

use crate::dto::{NewPaymentMethod, NewTransaction, PaymentMethodKind, TransactionType};
use crate::{Error, PaymentMethodRegistry, Result, TransactionLedger};

/// Payment method fixture. CSV header: `kind,label,number,expires,default`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedPaymentMethod {
    pub kind: PaymentMethodKind,
    pub label: String,
    pub number: String,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(rename = "default", default)]
    pub is_default: bool,
}

/// Transaction fixture. CSV header:
/// `type,recipient,amount,payment_method,description,created_at`.
///
/// `payment_method` refers to a payment method by its masked number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedTransaction {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    #[serde(rename = "recipient", default)]
    pub recipient_id: Option<String>,
    #[serde(deserialize_with = "deserialize_decimal_4dp")]
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn deserialize_decimal_4dp<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    <Decimal as Deserialize>::deserialize(deserializer)
        .map(|dec| dec.round_dp_with_strategy(4, RoundingStrategy::ToZero))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub methods_added: usize,
    pub methods_skipped: usize,
    pub transactions_added: usize,
    pub transactions_skipped: usize,
}

/// Seeds users' wallets. At most one [`SeedSession`] per user is open at a
/// time across all clones of a seeder.
#[derive(Clone)]
pub struct Seeder {
    registry: PaymentMethodRegistry,
    ledger: TransactionLedger,
    sessions: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl Seeder {
    pub fn new(registry: PaymentMethodRegistry, ledger: TransactionLedger) -> Self {
        Self {
            registry,
            ledger,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Merges the fixtures into `user_id`'s wallet, skipping anything that
    /// already exists by natural key.
    ///
    /// Every insert is persisted on its own. If the store fails halfway the
    /// error is returned and a later re-run picks up where this one stopped.
    pub async fn seed(
        &self,
        user_id: &str,
        methods: Vec<SeedPaymentMethod>,
        transactions: Vec<SeedTransaction>,
    ) -> Result<SeedReport> {
        let mut session = self.session(user_id).await?;
        session.seed_methods(methods).await?;
        for transaction in transactions {
            session.seed_transaction(transaction).await?;
        }
        Ok(session.finish())
    }

    /// Starts an incremental seed for `user_id`, snapshotting the natural keys
    /// already present.
    ///
    /// Waits for any other open session for the same user to finish, so the
    /// snapshot cannot go stale while this session holds it.
    pub async fn session(&self, user_id: &str) -> Result<SeedSession> {
        let lock = {
            let mut sessions = self
                .sessions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            sessions.entry(user_id.to_owned()).or_default().clone()
        };
        let guard = lock.lock_owned().await;

        let method_ids = self
            .registry
            .list(user_id)
            .await?
            .into_iter()
            .map(|m| (m.number, m.id))
            .collect();
        let descriptions = self
            .ledger
            .all()
            .await?
            .into_iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.description)
            .collect();

        Ok(SeedSession {
            registry: self.registry.clone(),
            ledger: self.ledger.clone(),
            user_id: user_id.to_owned(),
            method_ids,
            descriptions,
            report: SeedReport::default(),
            _guard: guard,
        })
    }
}

/// Seeding state for one user: the natural keys seen so far and the counts.
pub struct SeedSession {
    registry: PaymentMethodRegistry,
    ledger: TransactionLedger,
    user_id: String,
    /// Masked number -> payment method id.
    method_ids: HashMap<String, String>,
    descriptions: HashSet<String>,
    report: SeedReport,
    _guard: OwnedMutexGuard<()>,
}

impl SeedSession {
    pub async fn seed_methods(&mut self, methods: Vec<SeedPaymentMethod>) -> Result<()> {
        for seed in methods {
            if self.method_ids.contains_key(&seed.number) {
                self.report.methods_skipped += 1;
                continue;
            }
            let mut data = NewPaymentMethod::new(seed.kind, seed.label, seed.number);
            data.expires = seed.expires;
            let method = self.registry.add(&self.user_id, data).await?;
            if seed.is_default {
                self.registry.set_default(&self.user_id, &method.id).await?;
            }
            self.method_ids.insert(method.number, method.id);
            self.report.methods_added += 1;
        }
        Ok(())
    }

    /// Appends one fixture unless a transaction with the same description
    /// already exists for the user.
    pub async fn seed_transaction(&mut self, seed: SeedTransaction) -> Result<bool> {
        if self.descriptions.contains(&seed.description) {
            self.report.transactions_skipped += 1;
            return Ok(false);
        }

        let mut data = NewTransaction::new(self.user_id.clone(), seed.tx_type, seed.amount)
            .description(seed.description.clone());
        data.recipient_id = seed.recipient_id;
        data.created_at = seed.created_at;
        if let Some(number) = seed.payment_method {
            let method_id = self.method_ids.get(&number).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "seed transaction {:?} refers to unknown payment method {number}",
                    seed.description
                ))
            })?;
            data.payment_method_id = Some(method_id.clone());
        }

        self.ledger.append(data).await?;
        self.descriptions.insert(seed.description);
        self.report.transactions_added += 1;
        Ok(true)
    }

    pub fn finish(self) -> SeedReport {
        tracing::info!(
            user_id = %self.user_id,
            methods_added = self.report.methods_added,
            methods_skipped = self.report.methods_skipped,
            transactions_added = self.report.transactions_added,
            transactions_skipped = self.report.transactions_skipped,
            "Seeding finished"
        );
        self.report
    }
}
