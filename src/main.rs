use cardledger::application::merchants::MerchantService;
use cardledger::application::payments::PaymentService;
use cardledger::config::Settings;
use cardledger::domain::ports::Stores;
use cardledger::infrastructure::in_memory::InMemoryStore;
use cardledger::interfaces::csv::operation_reader::OperationReader;
use cardledger::interfaces::csv::report_writer::ReportWriter;
use cardledger::interfaces::script::ScriptRunner;
use cardledger::telemetry;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use tracing::error;

fn open_stores(settings: &Settings) -> Result<Stores> {
    match &settings.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            use cardledger::infrastructure::rocksdb::RocksDBStore;
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            tracing::info!(path = %db_path.display(), "using RocksDB storage");
            Ok(Stores::shared(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Stores::shared(InMemoryStore::new()))
        }
        None => Ok(Stores::shared(InMemoryStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    telemetry::init(&settings.log_level, settings.log_format).into_diagnostic()?;

    let stores = open_stores(&settings)?;
    let mut runner = ScriptRunner::new(
        PaymentService::new(stores.clone(), settings.context()),
        MerchantService::new(stores.clone()),
        stores,
    );

    // Run operations in file order; a failed row is logged and skipped
    let file = File::open(&settings.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for (index, op_result) in reader.operations().enumerate() {
        let row = index + 1;
        match op_result {
            Ok(op) => {
                if let Err(e) = runner.run(op).await {
                    error!(row, error = %e, "Error processing operation");
                }
            }
            Err(e) => {
                error!(row, error = %e, "Error reading operation");
            }
        }
    }

    let rows = runner.report().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer.write_rows(rows).into_diagnostic()?;

    Ok(())
}
