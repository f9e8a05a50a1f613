use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::models::{Connection, ConnectionIdentity, Notification, QueryConstraints};
use crate::traits::{ConnectionQuery, Notifier};

/// Default pause between check cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

/// Loop policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchMode {
    /// Notify about the first connection found, then stop.
    StopOnFirst,
    /// Poll forever, notifying once per distinct connection.
    #[default]
    Continuous,
}

impl fmt::Display for WatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchMode::StopOnFirst => write!(f, "stop-on-first"),
            WatchMode::Continuous => write!(f, "continuous"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub mode: WatchMode,
    pub poll_interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            mode: WatchMode::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Identities already reported in this process. Only ever grows.
#[derive(Debug, Default)]
pub struct NotifiedSet {
    seen: HashSet<ConnectionIdentity>,
}

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the identity was not present before.
    pub fn insert(&mut self, identity: ConnectionIdentity) -> bool {
        self.seen.insert(identity)
    }

    pub fn contains(&self, identity: &ConnectionIdentity) -> bool {
        self.seen.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Events emitted by the watcher for monitoring/logging.
#[derive(Debug, Clone)]
pub enum WatchEvent<'a> {
    Started {
        mode: WatchMode,
        dates: &'a [String],
        interval: Duration,
    },
    CycleStarted {
        cycle: u64,
    },
    CycleFailed {
        cycle: u64,
        error: &'a str,
    },
    NoConnections {
        cycle: u64,
    },
    NewConnection {
        connection: &'a Connection,
    },
    AlreadyNotified {
        identity: &'a ConnectionIdentity,
    },
    NotificationFailed {
        identity: &'a ConnectionIdentity,
        error: &'a str,
    },
    Sleeping {
        interval: Duration,
    },
    Stopped {
        cycles: u64,
    },
}

/// Trait for receiving watcher events (decoupled logging).
pub trait WatchReporter: Send + Sync {
    fn report(&self, event: WatchEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWatchReporter;

impl WatchReporter for TracingWatchReporter {
    fn report(&self, event: WatchEvent<'_>) {
        match event {
            WatchEvent::Started {
                mode,
                dates,
                interval,
            } => {
                tracing::info!(%mode, ?dates, interval_secs = interval.as_secs(), "Watcher started");
            }
            WatchEvent::CycleStarted { cycle } => {
                tracing::info!(%cycle, "Starting check cycle");
            }
            WatchEvent::CycleFailed { cycle, error } => {
                tracing::warn!(%cycle, %error, "Check cycle failed");
            }
            WatchEvent::NoConnections { cycle } => {
                tracing::info!(%cycle, "No available connections found");
            }
            WatchEvent::NewConnection { connection } => {
                tracing::info!(
                    date = %connection.date,
                    departure_time = %connection.departure_time,
                    url = %connection.booking_url,
                    "Connection found"
                );
            }
            WatchEvent::AlreadyNotified { identity } => {
                tracing::debug!(%identity, "Already notified, skipping");
            }
            WatchEvent::NotificationFailed { identity, error } => {
                tracing::warn!(%identity, %error, "Notification delivery failed");
            }
            WatchEvent::Sleeping { interval } => {
                tracing::info!(interval_secs = interval.as_secs(), "Sleeping");
            }
            WatchEvent::Stopped { cycles } => {
                tracing::info!(%cycles, "Watcher stopped");
            }
        }
    }
}

/// How a [`Watcher::run`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    /// Stop-on-first mode found (and notified about) this connection.
    Found(Connection),
    /// The cancellation token fired.
    Cancelled,
}

/// Polls a [`ConnectionQuery`] and notifies about new connections.
///
/// Owns the notified set and the cycle counter; nothing else mutates them.
pub struct Watcher<Q, N>
where
    Q: ConnectionQuery,
    N: Notifier,
{
    query: Q,
    notifier: N,
    constraints: QueryConstraints,
    config: WatchConfig,
    notified: NotifiedSet,
    cycle: u64,
}

impl<Q, N> Watcher<Q, N>
where
    Q: ConnectionQuery,
    N: Notifier,
{
    pub fn new(query: Q, notifier: N, constraints: QueryConstraints, config: WatchConfig) -> Self {
        Self {
            query,
            notifier,
            constraints,
            config,
            notified: NotifiedSet::new(),
            cycle: 0,
        }
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Run the loop until stop-on-first finds something or `cancel_token` fires.
    pub async fn run<WR: WatchReporter>(
        &mut self,
        cancel_token: CancellationToken,
        reporter: &WR,
    ) -> WatchOutcome {
        reporter.report(WatchEvent::Started {
            mode: self.config.mode,
            dates: &self.constraints.dates,
            interval: self.config.poll_interval,
        });

        let outcome = loop {
            if cancel_token.is_cancelled() {
                break WatchOutcome::Cancelled;
            }

            if let Some(found) = self.step(reporter).await {
                break WatchOutcome::Found(found);
            }

            reporter.report(WatchEvent::Sleeping {
                interval: self.config.poll_interval,
            });
            tokio::select! {
                () = tokio::time::sleep(self.config.poll_interval) => {}
                () = cancel_token.cancelled() => break WatchOutcome::Cancelled,
            }
        };

        reporter.report(WatchEvent::Stopped { cycles: self.cycle });
        outcome
    }

    /// One check cycle without the trailing sleep.
    ///
    /// Returns the connection that ends the run in stop-on-first mode,
    /// `None` otherwise.
    pub async fn step<WR: WatchReporter>(&mut self, reporter: &WR) -> Option<Connection> {
        let connections = self.check(reporter).await;

        match self.config.mode {
            WatchMode::StopOnFirst => {
                let first = connections.into_iter().next()?;
                reporter.report(WatchEvent::NewConnection {
                    connection: &first,
                });
                self.notified.insert(first.identity());
                self.dispatch(&first, reporter).await;
                Some(first)
            }
            WatchMode::Continuous => {
                for connection in &connections {
                    let identity = connection.identity();
                    if self.notified.contains(&identity) {
                        reporter.report(WatchEvent::AlreadyNotified {
                            identity: &identity,
                        });
                        continue;
                    }
                    // Marked before delivery so a failed send is not retried.
                    self.notified.insert(identity);
                    reporter.report(WatchEvent::NewConnection { connection });
                    self.dispatch(connection, reporter).await;
                }
                None
            }
        }
    }

    /// CHECKING: a failed cycle counts as a cycle with no connections.
    async fn check<WR: WatchReporter>(&mut self, reporter: &WR) -> Vec<Connection> {
        self.cycle += 1;
        reporter.report(WatchEvent::CycleStarted { cycle: self.cycle });

        match self.query.query(&self.constraints).await {
            Ok(connections) => {
                if connections.is_empty() {
                    reporter.report(WatchEvent::NoConnections { cycle: self.cycle });
                }
                connections
            }
            Err(e) => {
                let error = e.to_string();
                reporter.report(WatchEvent::CycleFailed {
                    cycle: self.cycle,
                    error: &error,
                });
                Vec::new()
            }
        }
    }

    /// NOTIFYING: delivery errors are reported and swallowed.
    async fn dispatch<WR: WatchReporter>(&self, connection: &Connection, reporter: &WR) {
        let notification = Notification::connection_found(connection);
        if let Err(e) = self.notifier.notify(&notification).await {
            let error = e.to_string();
            reporter.report(WatchEvent::NotificationFailed {
                identity: &connection.identity(),
                error: &error,
            });
        }
    }
}
