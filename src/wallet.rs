use rust_decimal::Decimal;
use std::time::Duration;

use crate::aggregator::{self, WalletStats};
use crate::clock::Clock;
use crate::config::Config;
use crate::stores::{FileStore, Store, StoreHandle};
use crate::{PaymentMethodRegistry, Result, Seeder, TransactionFilter, TransactionLedger};

/// Registry, ledger and seeder sharing one store and one clock.
#[derive(Clone)]
pub struct Wallet {
    registry: PaymentMethodRegistry,
    ledger: TransactionLedger,
    seeder: Seeder,
}

impl Wallet {
    pub fn new(store: StoreHandle) -> Self {
        let clock = Clock::new();
        let registry = PaymentMethodRegistry::new(store.clone(), clock.clone());
        let ledger = TransactionLedger::new(store, clock);
        let seeder = Seeder::new(registry.clone(), ledger.clone());
        Self {
            registry,
            ledger,
            seeder,
        }
    }

    pub fn with_store(store: impl Store + 'static, timeout: Duration) -> Self {
        Self::new(StoreHandle::new(store).with_timeout(timeout))
    }

    /// Opens a wallet backed by a [`FileStore`] in the configured directory.
    pub async fn open(config: &Config) -> Result<Self> {
        let store = FileStore::open(&config.data_dir).await?;
        tracing::info!(data_dir = %config.data_dir.display(), "Opened wallet store");
        Ok(Self::with_store(store, config.store_timeout()))
    }

    pub fn registry(&self) -> &PaymentMethodRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &TransactionLedger {
        &self.ledger
    }

    pub fn seeder(&self) -> &Seeder {
        &self.seeder
    }

    pub async fn balance(&self, user_id: &str) -> Result<Decimal> {
        Ok(self.stats(user_id).await?.balance)
    }

    pub async fn stats(&self, user_id: &str) -> Result<WalletStats> {
        let transactions = self.ledger.all().await?;
        Ok(aggregator::stats(user_id, &transactions))
    }

    /// Statistics over the subset of the user's transactions matching `filter`.
    pub async fn stats_filtered(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<WalletStats> {
        let transactions = self.ledger.query(user_id, filter).await?;
        Ok(aggregator::stats(user_id, &transactions))
    }
}
