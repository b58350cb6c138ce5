use std::env;
use std::error::Error;
use std::process;

use tracing_subscriber::EnvFilter;
use wallet_ledger::{run_async, Config, Wallet};

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    init_logging(&config);

    if let Err(err) = run_app(config).await {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

/// Logs go to stderr so the statement on stdout stays machine readable.
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

async fn run_app(config: Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        return Err(
            "Usage: cargo run -- <user-id> <payment_methods.csv> <transactions.csv>".into(),
        );
    }

    let wallet = Wallet::open(&config).await?;
    run_async(&wallet, &args[1], &args[2], &args[3], std::io::stdout()).await?;
    Ok(())
}
