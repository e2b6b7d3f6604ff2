//! Ordered fallbacks for a single extracted field.
//!
//! A chain tries its strategies in order and stops at the first success.
//! Failures are logged and kept so callers can react to a specific one (the
//! diagnostic screenshot, for instance).

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::browser::{BrowserError, BrowserSession};

#[async_trait]
pub trait Strategy<T: Send>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, session: &dyn BrowserSession) -> Result<T, BrowserError>;
}

#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub error: BrowserError,
}

#[derive(Debug)]
pub struct ChainOutcome<T> {
    pub value: Option<T>,
    pub failures: Vec<StrategyFailure>,
}

impl<T> ChainOutcome<T> {
    pub fn failed(&self, strategy: &str) -> bool {
        self.failures.iter().any(|f| f.strategy == strategy)
    }
}

pub struct StrategyChain<T: Send> {
    field: &'static str,
    strategies: Vec<Box<dyn Strategy<T>>>,
}

impl<T: Send> StrategyChain<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            strategies: Vec::new(),
        }
    }

    pub fn then(mut self, strategy: impl Strategy<T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, session: &dyn BrowserSession) -> ChainOutcome<T> {
        let mut failures = Vec::new();

        for strategy in &self.strategies {
            match strategy.attempt(session).await {
                Ok(value) => {
                    debug!(field = self.field, strategy = strategy.name(), "strategy succeeded");
                    return ChainOutcome {
                        value: Some(value),
                        failures,
                    };
                }
                Err(error) => {
                    warn!(
                        field = self.field,
                        strategy = strategy.name(),
                        error = %error,
                        "extraction strategy failed"
                    );
                    failures.push(StrategyFailure {
                        strategy: strategy.name(),
                        error,
                    });
                }
            }
        }

        ChainOutcome {
            value: None,
            failures,
        }
    }
}
