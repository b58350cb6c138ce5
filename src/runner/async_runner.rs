use serde::Serialize;
use std::error::Error;
use std::io::Write;
use std::path::Path;

use crate::{
    aggregator::WalletStats,
    csv_utils::{read_csv, write_csv},
    dto::StatementRow,
    seeder::{SeedPaymentMethod, SeedReport, SeedSession, SeedTransaction},
    TransactionFilter, Wallet,
};

use csv_async::{AsyncReaderBuilder, Error as CsvError, Trim};
use tokio::fs::File;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

const BUFFER_SIZE: usize = 1024;

type Result<T, E = Box<dyn Error + Send + Sync>> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub seed: SeedReport,
    pub stats: WalletStats,
}

/// Seeds `user_id`'s wallet from the given fixture files and writes the user's
/// statement (newest first) to the provided writer.
/// Spawns two tasks for the transaction file:
/// * CSV reader - streams seed transactions from the file, deserializes them and sends them to the seeder via channel.
/// * Seeder - receives seed transactions from the channel and appends the ones not seen before.
///
/// # Arguments
/// * `wallet` - The wallet to seed
/// * `user_id` - Owner of the seeded payment methods and transactions
/// * `methods_path` - CSV file with seed payment methods
/// * `transactions_path` - CSV file with seed transactions
/// * `writer` - Where to write the statement (e.g. stdout)
///
/// # Errors
/// Returns an error if:
/// * An input file cannot be read
/// * The CSV is malformed
/// * Seeding fails (storage unavailable, invalid fixture)
/// * Writing to the output fails
pub async fn run<P, Q, W>(
    wallet: &Wallet,
    user_id: &str,
    methods_path: P,
    transactions_path: Q,
    writer: W,
) -> Result<RunSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    W: Write,
{
    let methods = read_csv::<SeedPaymentMethod, _>(methods_path).await?;
    let mut session = wallet.seeder().session(user_id).await?;
    session.seed_methods(methods).await?;

    // Create channel for passing seed transactions from reader to seeder
    let (tx, rx) = mpsc::channel(BUFFER_SIZE);
    let transactions_path = transactions_path.as_ref().to_owned();

    let reader_handle = tokio::spawn(read_transactions(transactions_path, tx));
    let seeder_handle = tokio::spawn(seed_transactions(session, rx));

    // A seeder failure drops the receiver, which makes the reader stop early
    let session = seeder_handle.await??;
    reader_handle.await??;
    let seed = session.finish();

    let transactions = wallet.ledger().query(user_id, &TransactionFilter::new()).await?;
    let rows = transactions
        .iter()
        .map(|transaction| StatementRow::for_user(user_id, transaction));
    write_csv(writer, rows)?;

    let stats = wallet.stats(user_id).await?;
    tracing::info!(
        user_id,
        balance = %stats.balance,
        total_incoming = %stats.total_incoming,
        total_outgoing = %stats.total_outgoing,
        transaction_count = stats.transaction_count,
        "Wallet summary"
    );
    Ok(RunSummary { seed, stats })
}

/// Reads and deserializes seed transactions from a CSV file.
/// Returns them through the provided channel.
async fn read_transactions(
    input_path: impl AsRef<Path> + Send,
    tx: mpsc::Sender<SeedTransaction>,
) -> Result<(), CsvError> {
    let file = File::open(input_path).await?;
    let mut csv_reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .create_deserializer(file);

    let mut records = csv_reader.deserialize::<SeedTransaction>();
    while let Some(result) = records.next().await {
        match result {
            Ok(transaction) => {
                if tx.send(transaction).await.is_err() {
                    // Receiver dropped, exit gracefully
                    break;
                }
            }
            // CSV parsing errors are critical - propagate them
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Seeds transactions received through the channel.
/// Returns the session once the channel is closed by the reader.
async fn seed_transactions(
    mut session: SeedSession,
    mut rx: mpsc::Receiver<SeedTransaction>,
) -> Result<SeedSession, crate::Error> {
    while let Some(transaction) = rx.recv().await {
        session.seed_transaction(transaction).await?;
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{MemoryStore, StoreHandle};
    use rust_decimal_macros::dec;

    fn wallet() -> Wallet {
        Wallet::new(StoreHandle::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_seed_fixtures() -> Result<()> {
        let wallet = wallet();
        let mut output = Vec::new();
        let summary = run(
            &wallet,
            "u1",
            "data/seed_methods.csv",
            "data/seed_transactions.csv",
            &mut output,
        )
        .await?;

        assert_eq!(summary.seed.methods_added, 3);
        assert_eq!(summary.seed.transactions_added, 6);
        assert_eq!(
            summary.stats,
            WalletStats {
                balance: dec!(1183.1725),
                total_incoming: dec!(2540),
                total_outgoing: dec!(1356.8275),
                transaction_count: 6,
            }
        );

        let output = String::from_utf8(output)?;
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("id,created_at,type,counterparty,amount,payment_method_id,description")
        );
        let first = lines.next().unwrap_or_default();
        assert!(first.contains("2024-03-09T21:45:00Z,outgoing,alice,-60,"));
        assert!(first.ends_with(",Dinner split"));
        assert_eq!(lines.count(), 5);

        let default = wallet.registry().default_for("u1").await?.unwrap();
        assert_eq!(default.number, "**** **** **** 4242");
        Ok(())
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() -> Result<()> {
        let wallet = wallet();
        let first = run(
            &wallet,
            "u1",
            "data/seed_methods.csv",
            "data/seed_transactions.csv",
            std::io::sink(),
        )
        .await?;
        let second = run(
            &wallet,
            "u1",
            "data/seed_methods.csv",
            "data/seed_transactions.csv",
            std::io::sink(),
        )
        .await?;

        assert_eq!(second.seed.methods_added, 0);
        assert_eq!(second.seed.methods_skipped, 3);
        assert_eq!(second.seed.transactions_added, 0);
        assert_eq!(second.seed.transactions_skipped, 6);
        assert_eq!(first.stats, second.stats);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_method_reference_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("transactions.csv");
        std::fs::write(
            &path,
            "type,recipient,amount,payment_method,description,created_at\n\
             outgoing,,5,**** 0000,Mystery,\n",
        )?;

        let result = run(
            &wallet(),
            "u1",
            "data/seed_methods.csv",
            &path,
            std::io::sink(),
        )
        .await;
        assert!(result.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_csv_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("transactions.csv");
        std::fs::write(
            &path,
            "type,recipient,amount,payment_method,description,created_at\n\
             sideways,,5,,Broken,\n",
        )?;

        let result = run(
            &wallet(),
            "u1",
            "data/seed_methods.csv",
            &path,
            std::io::sink(),
        )
        .await;
        assert!(result.is_err());
        Ok(())
    }
}
