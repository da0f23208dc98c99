use anyhow::Context;
use clap::{Parser, Subcommand};
use medledger_core::constants::{DEFAULT_LEDGER_FILE, DEFAULT_LEDGER_NAME, DEFAULT_LOG_FILTER};
use medledger_core::{
    Collection, CollectionRegistry, CoreConfig, Dispatcher, InMemoryLedger, Insurance,
    InsuranceClaim, LedgerResult, Patient, Record, ReferenceValidation, Transaction, Treatment,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medledger")]
#[command(about = "MedLedger healthcare ledger CLI")]
struct Cli {
    /// Ledger snapshot file; created on first commit if missing
    #[arg(long, default_value = DEFAULT_LEDGER_FILE)]
    ledger_file: PathBuf,
    /// Ledger (channel) name
    #[arg(long, default_value = DEFAULT_LEDGER_NAME)]
    ledger_name: String,
    /// Refuse writes whose soft references do not resolve
    #[arg(long)]
    enforce_references: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every function in the dispatch table
    Functions,
    /// Invoke a ledger function with positional arguments
    Invoke {
        /// patients, treatments, insurances or claims
        collection: String,
        /// Function name, e.g. CreateClaim
        function: String,
        /// Positional arguments, key first
        args: Vec<String>,
    },
    /// List every record in a collection
    List {
        /// patients, treatments, insurances or claims
        collection: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let output = run(cli)?;
    println!("{output}");
    Ok(())
}

/// Executes one CLI command and returns what it prints.
fn run(cli: Cli) -> anyhow::Result<String> {
    let reference_validation = if cli.enforce_references {
        ReferenceValidation::Enforced
    } else {
        ReferenceValidation::Disabled
    };
    let cfg = Arc::new(CoreConfig::new(&cli.ledger_name, reference_validation)?);
    let dispatcher = Dispatcher::<Transaction>::new()?;

    match cli.command {
        Commands::Functions => {
            let lines: Vec<String> = dispatcher
                .functions()
                .into_iter()
                .map(|f| {
                    let mode = if f.read_only { "read" } else { "write" };
                    format!(
                        "{:<10} {:<20} {:<5} {}",
                        f.collection,
                        f.function,
                        mode,
                        f.params.join(" ")
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        Commands::Invoke {
            collection,
            function,
            args,
        } => {
            let collection: Collection = collection.parse()?;
            let ledger = open_ledger(&cli.ledger_file)?;
            let registry = CollectionRegistry::new(cfg);
            let registration = dispatcher.resolve(collection, &function)?;

            let result = if registration.operation.is_read_only() {
                ledger.evaluate(collection.namespace(), |tx| {
                    dispatcher.invoke(&registry, tx, collection, &function, &args)
                })?
            } else {
                let submitted = ledger.submit(collection.namespace(), |tx| {
                    dispatcher.invoke(&registry, tx, collection, &function, &args)
                })?;
                tracing::info!(
                    tx_id = %submitted.receipt.tx_id,
                    block_num = submitted.receipt.block_num,
                    "committed {function}"
                );
                submitted.value
            };
            Ok(serde_json::to_string_pretty(&result)?)
        }
        Commands::List { collection } => {
            let collection: Collection = collection.parse()?;
            let ledger = open_ledger(&cli.ledger_file)?;
            let registry = CollectionRegistry::new(cfg);
            let lines = match collection {
                Collection::Patient => list::<Patient>(&ledger, &registry)?,
                Collection::Treatment => list::<Treatment>(&ledger, &registry)?,
                Collection::Insurance => list::<Insurance>(&ledger, &registry)?,
                Collection::InsuranceClaim => list::<InsuranceClaim>(&ledger, &registry)?,
            };
            if lines.is_empty() {
                Ok(format!("No {collection} records found."))
            } else {
                Ok(lines.join("\n"))
            }
        }
    }
}

fn open_ledger(path: &Path) -> anyhow::Result<InMemoryLedger> {
    InMemoryLedger::open(path)
        .with_context(|| format!("failed to open ledger file {}", path.display()))
}

fn list<R: Record>(
    ledger: &InMemoryLedger,
    registry: &CollectionRegistry,
) -> anyhow::Result<Vec<String>> {
    let service = registry.service::<R>();
    let entries = ledger.evaluate(R::COLLECTION.namespace(), |tx| -> LedgerResult<_> {
        service.list_entries(tx)
    })?;

    entries
        .into_iter()
        .map(|entry| Ok(format!("{}: {}", entry.key, serde_json::to_string(&entry.record)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(ledger_file: &std::path::Path, args: &[&str]) -> Cli {
        let mut argv = vec![
            "medledger".to_owned(),
            "--ledger-file".to_owned(),
            ledger_file.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| (*a).to_owned()));
        Cli::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn test_invoke_persists_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ledger.json");

        run(cli(&file, &["invoke", "claims", "InitLedger"])).unwrap();
        let output = run(cli(&file, &["invoke", "claims", "ReadClaim", "CLAIM2"])).unwrap();
        assert!(output.contains("\"status\": \"Approved\""));

        let listed = run(cli(&file, &["list", "claims"])).unwrap();
        let keys: Vec<&str> = listed
            .lines()
            .map(|line| line.split(':').next().unwrap())
            .collect();
        assert_eq!(keys, ["CLAIM1", "CLAIM2"]);
    }

    #[test]
    fn test_list_of_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ledger.json");

        let output = run(cli(&file, &["list", "patients"])).unwrap();
        assert_eq!(output, "No patient records found.");
    }

    #[test]
    fn test_errors_surface() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ledger.json");

        assert!(run(cli(&file, &["invoke", "patients", "ReadPatient", "PATIENT1"])).is_err());
        assert!(run(cli(&file, &["invoke", "doctors", "ReadDoctor", "D1"])).is_err());
        assert!(run(cli(&file, &["invoke", "patients", "Drop"])).is_err());
    }

    #[test]
    fn test_enforced_references_reject_orphan_treatment() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ledger.json");

        let err = run(cli(
            &file,
            &["--enforce-references", "invoke", "treatments", "InitLedger"],
        ))
        .unwrap_err();
        assert!(err.to_string().contains("patientID"));
    }

    #[test]
    fn test_functions_lists_table() {
        let dir = tempfile::tempdir().unwrap();
        let output = run(cli(&dir.path().join("ledger.json"), &["functions"])).unwrap();
        assert_eq!(output.lines().count(), 29);
        assert!(output.contains("GetAllPatients"));
    }
}
