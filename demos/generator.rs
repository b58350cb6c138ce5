//! This example generates a seed transaction CSV covering a number of months
//! (supplied as a command-line argument) for one user.
//!
//! The CSV file can then be fed to the `wallet-ledger` binary together with
//! `data/seed_methods.csv`, whose masked numbers it references.
//!
//! Example (24 months):
//! ```bash
//! cargo run --example generator 24 > data/24_months.csv
//! cargo run -- u1 data/seed_methods.csv data/24_months.csv
//! ```
//! ### Maths
//! Every month m (starting at 1) produces:
//! - one salary of S = BASE_SALARY (incoming),
//! - one rent payment of R = BASE_RENT to the landlord (outgoing),
//! - G = NUM_GROCERY_RUNS grocery payments of A_g = BASE_GROCERY_AMOUNT (outgoing).
//!
//! After M months:
//! - totalIncoming = M·S
//! - totalOutgoing = M·(R + G·A_g)
//! - balance = M·(S − R − G·A_g) = M·(3000 − 1200 − 4·95.5) = 1418·M
//! - transactionCount = M·(2 + G)
//!
//! Descriptions are unique per month, so re-seeding the same file is a no-op.

use chrono::{Duration, TimeZone, Utc};
use csv::Writer;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::{env, error::Error};
use wallet_ledger::{SeedTransaction, TransactionType};

const NUM_GROCERY_RUNS: usize = 4;
const BASE_SALARY: Decimal = dec!(3000);
const BASE_RENT: Decimal = dec!(1200);
const BASE_GROCERY_AMOUNT: Decimal = dec!(95.5);

const CHECKING: &str = "**** 0093";
const VISA: &str = "**** **** **** 4242";

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: cargo run --example generator <num_months>");
        std::process::exit(1);
    }

    let num_months: u32 = match args[1].parse() {
        Ok(n) if n > 0 => n,
        _ => {
            eprintln!("Error: <num_months> must be a positive integer.");
            std::process::exit(1);
        }
    };

    let start = Utc
        .with_ymd_and_hms(2020, 1, 1, 9, 0, 0)
        .single()
        .ok_or("invalid start date")?;
    let mut wtr = Writer::from_writer(std::io::stdout());

    for month in 1..=num_months {
        // Months are approximated as 30 days; only ordering matters here.
        let month_start = start + Duration::days(30 * i64::from(month - 1));

        wtr.serialize(SeedTransaction {
            tx_type: TransactionType::Incoming,
            recipient_id: None,
            amount: BASE_SALARY,
            payment_method: Some(CHECKING.to_string()),
            description: format!("Salary month {month}"),
            created_at: Some(month_start),
        })?;
        wtr.serialize(SeedTransaction {
            tx_type: TransactionType::Outgoing,
            recipient_id: Some("landlord".to_string()),
            amount: BASE_RENT,
            payment_method: Some(CHECKING.to_string()),
            description: format!("Rent month {month}"),
            created_at: Some(month_start + Duration::days(1)),
        })?;
        for run in 1..=NUM_GROCERY_RUNS {
            wtr.serialize(SeedTransaction {
                tx_type: TransactionType::Outgoing,
                recipient_id: Some("grocer".to_string()),
                amount: BASE_GROCERY_AMOUNT,
                payment_method: Some(VISA.to_string()),
                description: format!("Groceries month {month} run {run}"),
                created_at: Some(month_start + Duration::days(7 * run as i64)),
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}
