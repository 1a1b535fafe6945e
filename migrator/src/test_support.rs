//! Test-only helpers: spy steps, state fixtures and log capture.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tempfile::TempDir;
use tracing::{Dispatch, Level};
use tracing_subscriber::fmt::MakeWriter;

use crate::core::state::{SchemaVersion, VersionedState};
use crate::core::step::MigrationStep;

/// Parse a JSON literal into a state, panicking on malformed input.
pub fn state_from(value: Value) -> VersionedState {
    VersionedState::from_value(value).expect("fixture state")
}

/// Step that returns its input untouched.
pub fn noop_step(version: SchemaVersion) -> MigrationStep {
    MigrationStep::from_fn(version, "noop", Ok)
}

/// Shared record of which step versions were invoked, in call order.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<SchemaVersion>>>,
}

impl CallLog {
    pub fn record(&self, version: SchemaVersion) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(version);
    }

    pub fn calls(&self) -> Vec<SchemaVersion> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Step that records its call and marks the state with `step_<version>: true`.
pub fn counting_step(version: SchemaVersion, log: &CallLog) -> MigrationStep {
    let log = log.clone();
    MigrationStep::from_fn(version, "counting", move |mut state| {
        log.record(version);
        state.insert(format!("step_{}", version), json!(true));
        Ok(state)
    })
}

/// Step that records its call and then fails with `step <version> failed`.
pub fn failing_step(version: SchemaVersion, log: &CallLog) -> MigrationStep {
    let log = log.clone();
    MigrationStep::from_fn(version, "failing", move |_state| {
        log.record(version);
        Err(anyhow!("step {} failed", version))
    })
}

/// Run `f` with a subscriber that records events at `INFO` and above; returns the text.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(BufferWriter {
            buffer: buffer.clone(),
        })
        .with_max_level(Level::INFO)
        .with_ansi(false)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    tracing::dispatcher::with_default(&dispatch, f);
    let bytes = buffer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[derive(Clone)]
struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

struct BufferWriterGuard {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = BufferWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        BufferWriterGuard {
            buffer: self.buffer.clone(),
        }
    }
}

impl Write for BufferWriterGuard {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Scratch directory holding state and config files for a test.
pub struct TestDir {
    temp: TempDir,
}

impl TestDir {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create temp dir")?;
        Ok(Self { temp })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `value` as pretty JSON to `<dir>/<name>` and return its path.
    pub fn write_json(&self, name: &str, value: &Value) -> Result<PathBuf> {
        let path = self.temp.path().join(name);
        let mut buf = serde_json::to_string_pretty(value)?;
        buf.push('\n');
        fs::write(&path, buf).with_context(|| format!("write fixture {}", path.display()))?;
        Ok(path)
    }

    /// Write raw text to `<dir>/<name>` and return its path.
    pub fn write_text(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.temp.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write fixture {}", path.display()))?;
        Ok(path)
    }

    pub fn read_json(&self, name: &str) -> Result<Value> {
        let path = self.temp.path().join(name);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("read fixture {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parse fixture {}", path.display()))
    }
}

/// Legacy (pre-v1) wallet state: one wallet with custom tokens and an RSK asset.
pub fn legacy_wallet_state() -> Value {
    json!({
        "activeWalletId": "w1",
        "wallets": [{ "id": "w1", "name": "Wallet 1", "mnemonic": "test mnemonic" }],
        "customTokens": {
            "mainnet": { "w1": [{ "symbol": "TKN", "contractAddress": "0xabc" }] },
            "testnet": { "w1": [] }
        },
        "injectEthereumAsset": "RSK",
        "addresses": { "mainnet": { "w1": {} } },
        "balances": { "mainnet": { "w1": {} } }
    })
}
