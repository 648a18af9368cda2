use std::fmt;
use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{info, warn};

type StrategyFn<'a, E> = Box<dyn FnOnce() -> BoxFuture<'a, Result<(), E>> + Send + 'a>;

struct Strategy<'a, E> {
    name: &'static str,
    run: StrategyFn<'a, E>,
}

/// Ordered fallback strategies for one target. Strategies run one after the
/// other until the first success; nothing runs in parallel and there is no
/// delay between attempts.
pub struct Escalation<'a, E> {
    target: String,
    strategies: Vec<Strategy<'a, E>>,
}

#[derive(Debug)]
pub struct EscalationError<E> {
    pub target: String,
    /// Every attempt made, in order, with its failure.
    pub attempts: Vec<(&'static str, E)>,
}

impl<E> EscalationError<E> {
    #[must_use]
    pub fn last(&self) -> Option<&E> {
        self.attempts.last().map(|(_, error)| error)
    }
}

impl<E: fmt::Display> fmt::Display for EscalationError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.attempts.last() {
            Some((name, error)) => write!(
                f,
                "{} strategies failed for {}; last ({name}): {error}",
                self.attempts.len(),
                self.target
            ),
            None => write!(f, "no strategies configured for {}", self.target),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for EscalationError<E> {}

impl<'a, E: fmt::Display + Send + 'a> Escalation<'a, E> {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            strategies: Vec::new(),
        }
    }

    /// Append a strategy; it only runs if every earlier one failed.
    #[must_use]
    pub fn then<F, Fut>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), E>> + Send + 'a,
    {
        self.strategies.push(Strategy {
            name,
            run: Box::new(move || strategy().boxed()),
        });
        self
    }

    /// Run strategies in order and return the name of the one that worked.
    ///
    /// # Errors
    /// Returns every attempt's failure when all strategies fail.
    pub async fn run(self) -> Result<&'static str, EscalationError<E>> {
        let total = self.strategies.len();
        let mut attempts = Vec::with_capacity(total);

        for (index, strategy) in self.strategies.into_iter().enumerate() {
            info!(
                "{}: attempt {}/{total} ({})",
                self.target,
                index + 1,
                strategy.name
            );
            match (strategy.run)().await {
                Ok(()) => return Ok(strategy.name),
                Err(error) => {
                    warn!("{}: {} failed: {error}", self.target, strategy.name);
                    attempts.push((strategy.name, error));
                }
            }
        }

        Err(EscalationError {
            target: self.target,
            attempts,
        })
    }
}
