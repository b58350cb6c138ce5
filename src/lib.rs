pub mod aggregator;
mod clock;
pub mod config;
pub mod csv_utils;
pub mod dto;
mod error;
mod ledger;
mod registry;
mod runner;
mod seeder;
pub mod stores;
mod wallet;

pub use aggregator::WalletStats;
pub use clock::Clock;
pub use config::Config;
pub use dto::{
    NewPaymentMethod, NewTransaction, PaymentMethod, PaymentMethodKind, PaymentMethodPatch,
    StatementRow, Transaction, TransactionFilter, TransactionStatus, TransactionType,
};
pub use error::{Error, Result};
pub use ledger::TransactionLedger;
pub use registry::PaymentMethodRegistry;
pub use runner::{run_async, RunSummary};
pub use seeder::{SeedPaymentMethod, SeedReport, SeedSession, SeedTransaction, Seeder};
pub use wallet::Wallet;
