//! Application context - wires everything together

use gcdex_bus::{EventBus, EventSubscriber};
use gcdex_core::{Address, TokenAmount};
use gcdex_projection::ProjectionEngine;
use gcdex_runtime::{Call, Journal, Receipt, Runtime, RuntimeError, Transaction};
use gcdex_token::Token;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application context - wires together all components
pub struct AppContext {
    pub runtime: Runtime,
    pub journal: Journal,
    pub bus: EventBus,
    pub projection: Option<Arc<ProjectionEngine>>,
    journal_path: PathBuf,
    projection_path: PathBuf,
    last_timestamp: u64,
}

impl AppContext {
    /// Open the data directory, replaying the journal to rebuild state
    pub async fn new(data_path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref();
        let journal_path = data_path.join("journal");
        let projection_path = data_path.join("projection.db");

        std::fs::create_dir_all(&journal_path)?;

        // Replay the journal to rebuild contract state
        let (journal, entries) = Journal::open(&journal_path)?;
        let runtime = Runtime::replay(&entries)?;
        let last_timestamp = entries.last().map(|e| e.tx.timestamp).unwrap_or(0);

        let bus = EventBus::default();

        // Projections are disposable: rebuild from the log on every start
        let projection = match ProjectionEngine::new(&projection_path).await {
            Ok(engine) => {
                let engine = Arc::new(engine);
                let subscribers: Vec<Arc<dyn EventSubscriber>> = vec![engine.clone()];
                match bus.replay(runtime.events().records(), &subscribers).await {
                    Ok(()) => Some(engine),
                    Err(e) => {
                        tracing::warn!(error = %e, "Projection replay failed, queries disabled");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Projection unavailable");
                None
            }
        };

        Ok(Self {
            runtime,
            journal,
            bus,
            projection,
            journal_path,
            projection_path,
            last_timestamp,
        })
    }

    /// Commit a call from `sender`, stamped with the current time
    pub async fn commit(&mut self, sender: Address, call: Call) -> Result<Receipt, CommitError> {
        let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        self.commit_at(sender, now, call).await
    }

    /// Commit a call at an explicit timestamp.
    ///
    /// Timestamps never go backwards: an earlier one is raised to the
    /// last committed timestamp.
    ///
    /// Flow: Execute → Append to journal → Dispatch events. If the append
    /// fails the runtime is rebuilt from the journal.
    pub async fn commit_at(&mut self, sender: Address, timestamp: u64, call: Call) -> Result<Receipt, CommitError> {
        let tx = Transaction::new(sender, timestamp.max(self.last_timestamp), call);

        // 1. Execute; a rejection leaves the runtime untouched
        let receipt = self.runtime.execute(&tx)?;

        // 2. Append to the journal (source of truth)
        if let Err(e) = self.journal.append(&tx) {
            self.rollback();
            return Err(e.into());
        }
        self.last_timestamp = tx.timestamp;

        // 3. Feed read views
        let subscribers = self.subscribers();
        if let Err(e) = self.bus.dispatch(&receipt.events, &subscribers).await {
            tracing::warn!(error = %e, "Projection update failed");
        }

        Ok(receipt)
    }

    /// Rebuild the runtime from what the journal actually holds
    fn rollback(&mut self) {
        match Journal::read_all(&self.journal_path).and_then(|entries| Runtime::replay(&entries)) {
            Ok(runtime) => self.runtime = runtime,
            Err(e) => tracing::error!(error = %e, "Rollback failed, runtime ahead of journal"),
        }
    }

    fn subscribers(&self) -> Vec<Arc<dyn EventSubscriber>> {
        self.projection
            .iter()
            .map(|p| p.clone() as Arc<dyn EventSubscriber>)
            .collect()
    }

    /// The projection, or an error when it could not be opened
    pub fn projection(&self) -> Result<&ProjectionEngine, anyhow::Error> {
        self.projection
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Projection unavailable; run `gcdex replay --reset`"))
    }

    /// Resolve an account: a `0x…` address, or a label such as `user1`
    pub fn account(&self, name: &str) -> Address {
        name.parse().unwrap_or_else(|_| Address::from_label(name))
    }

    /// Resolve a token by symbol (case-insensitive) or address
    pub fn token(&self, name: &str) -> Result<&Token, anyhow::Error> {
        if let Some(token) = self.runtime.tokens().by_symbol(name) {
            return Ok(token);
        }
        let address: Address = name
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown token: {name}"))?;
        Ok(self.runtime.tokens().get(&address)?)
    }

    /// Parse a human-readable amount of `token`, e.g. `"12.5"`
    pub fn amount(&self, token: &Token, value: &str) -> Result<TokenAmount, anyhow::Error> {
        Ok(TokenAmount::parse_units(value, token.decimals())?)
    }

    /// Symbol for display, or the short address if unknown
    pub fn symbol(&self, address: &Address) -> String {
        self.runtime
            .tokens()
            .get(address)
            .map(|t| t.symbol().to_string())
            .unwrap_or_else(|_| address.short())
    }

    /// Human-readable amount of the token at `address`
    pub fn format(&self, address: &Address, amount: TokenAmount) -> String {
        let decimals = self
            .runtime
            .tokens()
            .get(address)
            .map(|t| t.decimals())
            .unwrap_or(gcdex_core::DEFAULT_DECIMALS);
        amount.format_units(decimals)
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn projection_path(&self) -> &Path {
        &self.projection_path
    }

    /// Check if the exchange has been deployed
    pub fn is_deployed(&self) -> bool {
        self.runtime.is_deployed()
    }

    /// Number of journaled transactions
    pub fn last_sequence(&self) -> u64 {
        self.journal.last_sequence()
    }
}

/// Errors during commit
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("Rejected: {0}")]
    Rejected(RuntimeError),

    #[error("Journal error: {0}")]
    Journal(RuntimeError),
}

impl From<RuntimeError> for CommitError {
    fn from(e: RuntimeError) -> Self {
        if e.is_rejection() {
            CommitError::Rejected(e)
        } else {
            CommitError::Journal(e)
        }
    }
}
