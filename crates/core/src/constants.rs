//! Constants used throughout the MedLedger crates.

/// Ledger (channel) name used when `MEDLEDGER_NAME` is not set.
pub const DEFAULT_LEDGER_NAME: &str = "medledger.dev";

/// Address the REST server binds to when `MEDLEDGER_REST_ADDR` is not set.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Snapshot file the CLI uses when `--ledger-file` is not given.
pub const DEFAULT_LEDGER_FILE: &str = "medledger.json";

/// Format version written into ledger snapshot files.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Default `tracing` filter directive for the binaries.
pub const DEFAULT_LOG_FILTER: &str = "medledger=info";
