//! CSV serialization and deserialization utilities.
//!
//! Provides generic functions for reading seed files and writing reports.

use csv_async::{AsyncReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tokio::fs::File;
use tokio_stream::StreamExt;

/// Reads every record of a CSV file with headers into memory.
/// Each record is deserialized into type T.
pub async fn read_csv<T, P>(path: P) -> Result<Vec<T>, csv_async::Error>
where
    T: DeserializeOwned + 'static,
    P: AsRef<Path>,
{
    let file = File::open(path).await?;
    let mut reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .create_deserializer(file);

    let mut records = reader.deserialize::<T>();
    let mut out = Vec::new();
    while let Some(record) = records.next().await {
        out.push(record?);
    }
    Ok(out)
}

/// Writes an iterator of records to a CSV writer.
/// Each record must implement Serialize.
pub fn write_csv<T, W>(writer: W, records: impl Iterator<Item = T>) -> csv::Result<()>
where
    T: Serialize,
    W: Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
