//! Outcome aggregation and windowed reporting
//!
//! Every connection attempt produces exactly one [`Outcome`] on the shared
//! channel. The [`Aggregator`] is the sole receiver: it keeps per-window
//! success/failure counts, flushes them once per reporting interval as a
//! [`WindowReport`], and terminates the run when the cumulative success
//! count reaches the configured target.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

/// Result of one connection attempt by a session slot
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Whether the attempt established a session
    pub success: bool,

    /// Failure detail, present on failed attempts
    pub error: Option<String>,
}

impl Outcome {
    /// An attempt that established a session
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed attempt with its error detail
    pub fn failure(detail: impl fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(detail.to_string()),
        }
    }
}

/// Counts flushed at the end of each reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowReport {
    /// Successful attempts within the window
    pub ok: u64,

    /// Failed attempts within the window
    pub err: u64,

    /// Cumulative successes since the run started
    pub total: u64,
}

impl fmt::Display for WindowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OK: {:04}, Err: {:04}, total: {:04}",
            self.ok, self.err, self.total
        )
    }
}

/// Final counts for a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Sessions established over the whole run
    pub successes: u64,

    /// Failed attempts over the whole run
    pub failures: u64,
}

/// Consumes the outcome stream and reports per-window counts
///
/// The aggregator's single control loop both updates and inspects the
/// cumulative success count, so the completion condition is evaluated
/// synchronously with the triggering event and fires exactly once.
pub struct Aggregator {
    outcomes: mpsc::Receiver<Outcome>,
    target: u64,
    report_interval: Duration,
}

impl Aggregator {
    /// Create an aggregator that completes after `target` successes
    pub fn new(outcomes: mpsc::Receiver<Outcome>, target: u64, report_interval: Duration) -> Self {
        Self {
            outcomes,
            target,
            report_interval,
        }
    }

    /// Run until the target success count is reached
    ///
    /// `report` is invoked once per elapsed window and once more with the
    /// counts of the partial window in which the run completed. A target of
    /// zero completes immediately without waiting for any event.
    pub async fn run<F>(mut self, mut report: F) -> RunTotals
    where
        F: FnMut(&WindowReport) + Send,
    {
        let mut window_ok = 0u64;
        let mut window_err = 0u64;
        let mut total = 0u64;
        let mut failures = 0u64;

        if self.target == 0 {
            report(&WindowReport {
                ok: 0,
                err: 0,
                total: 0,
            });
            return RunTotals::default();
        }

        let mut ticker = time::interval(self.report_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval's first tick completes immediately; consume it so the
        // first report covers a full window.
        ticker.tick().await;

        loop {
            tokio::select! {
                outcome = self.outcomes.recv() => match outcome {
                    Some(outcome) if outcome.success => {
                        window_ok += 1;
                        total += 1;
                        if total == self.target {
                            report(&WindowReport { ok: window_ok, err: window_err, total });
                            break;
                        }
                    }
                    Some(outcome) => {
                        if let Some(detail) = &outcome.error {
                            tracing::debug!(error = %detail, "attempt failed");
                        }
                        window_err += 1;
                        failures += 1;
                    }
                    // All senders gone before the target was reached;
                    // nothing more can arrive.
                    None => break,
                },
                _ = ticker.tick() => {
                    report(&WindowReport { ok: window_ok, err: window_err, total });
                    window_ok = 0;
                    window_err = 0;
                }
            }
        }

        RunTotals {
            successes: total,
            failures,
        }
    }
}
