//! Poll loops feeding the de-bounce state machine.

use super::{
    PollPolicy, ServiceCheck, ServiceRegistrar, ServiceStatus, StatusTracker, StatusTransition,
};
use crate::bus::{BusError, BusResult, EventBus};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Read-only view of a status owned by a poll loop.
#[derive(Debug, Clone)]
pub struct StatusWatch {
    receiver: watch::Receiver<ServiceStatus>,
}

impl StatusWatch {
    /// Creates a watch that never changes from `status`.
    #[must_use]
    pub fn fixed(status: ServiceStatus) -> Self {
        let (_sender, receiver) = watch::channel(status);
        Self { receiver }
    }

    /// Returns the latest published status.
    #[must_use]
    pub fn current(&self) -> ServiceStatus {
        *self.receiver.borrow()
    }

    /// Waits for the next published status.
    ///
    /// Returns `None` once the owning loop has stopped.
    pub async fn changed(&mut self) -> Option<ServiceStatus> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    /// Waits until the status equals `target`.
    ///
    /// Returns `None` if the owning loop stops first.
    pub async fn wait_for(&mut self, target: ServiceStatus) -> Option<ServiceStatus> {
        self.receiver
            .wait_for(|status| *status == target)
            .await
            .ok()
            .map(|status| *status)
    }
}

/// Handle to one service's poll loop.
///
/// Dropping the subscription does not stop the loop; call
/// [`MonitorSubscription::cancel`] or [`ServiceHealthMonitor::shutdown`].
#[derive(Debug, Clone)]
pub struct MonitorSubscription {
    name: String,
    status: StatusWatch,
    cancel: CancellationToken,
}

impl MonitorSubscription {
    /// Returns the monitored service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a read-only view of the service status.
    #[must_use]
    pub fn status(&self) -> StatusWatch {
        self.status.clone()
    }

    /// Stops the poll loop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns whether the poll loop has been asked to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Health aggregator polling registered services on a schedule.
#[derive(Debug)]
pub struct ServiceHealthMonitor {
    bus: Weak<EventBus>,
    policy: PollPolicy,
    root: CancellationToken,
    services: Mutex<HashMap<String, CancellationToken>>,
}

impl ServiceHealthMonitor {
    /// Creates a monitor emitting transition events on `bus`.
    ///
    /// The monitor keeps only a weak reference to the bus.
    #[must_use]
    pub fn new(bus: &Arc<EventBus>, policy: PollPolicy) -> Arc<Self> {
        Arc::new(Self {
            bus: Arc::downgrade(bus),
            policy,
            root: CancellationToken::new(),
            services: Mutex::new(HashMap::new()),
        })
    }

    /// Installs this monitor as the bus's `services:register` handler.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ShutDown`] when the bus is gone, or
    /// [`BusError::RegistrarAlreadyInstalled`].
    pub fn install(self: &Arc<Self>) -> BusResult<()> {
        let bus = self.bus.upgrade().ok_or(BusError::ShutDown)?;
        bus.set_service_registrar(Arc::clone(self) as Arc<dyn ServiceRegistrar>)
    }

    /// Returns the poll policy.
    #[must_use]
    pub const fn policy(&self) -> PollPolicy {
        self.policy
    }

    fn services(&self) -> BusResult<MutexGuard<'_, HashMap<String, CancellationToken>>> {
        self.services
            .lock()
            .map_err(|err| BusError::LockPoisoned(err.to_string()))
    }

    /// Starts polling `check` under `name` on a background task.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::DuplicateService`] when `name` is already polled,
    /// [`BusError::ShutDown`] after [`ServiceHealthMonitor::shutdown`], or
    /// [`BusError::Runtime`] outside a Tokio runtime.
    pub fn watch(&self, name: &str, check: Arc<dyn ServiceCheck>) -> BusResult<MonitorSubscription> {
        if self.root.is_cancelled() {
            return Err(BusError::ShutDown);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| BusError::Runtime(err.to_string()))?;

        let mut services = self.services()?;
        services.retain(|_, token| !token.is_cancelled());
        if services.contains_key(name) {
            return Err(BusError::DuplicateService(name.to_owned()));
        }

        let cancel = self.root.child_token();
        let (sender, receiver) = watch::channel(ServiceStatus::Unknown);
        let poller = Poller {
            name: name.to_owned(),
            check,
            bus: self.bus.clone(),
            policy: self.policy,
            sender,
            cancel: cancel.clone(),
        };
        runtime.spawn(poller.run());
        services.insert(name.to_owned(), cancel.clone());
        debug!(service = name, interval = ?self.policy.interval(), "health monitor started");

        Ok(MonitorSubscription {
            name: name.to_owned(),
            status: StatusWatch { receiver },
            cancel,
        })
    }

    /// Returns how many poll loops are tracked, cancelled ones included
    /// until the next [`ServiceHealthMonitor::watch`] prunes them.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.services().map_or(0, |services| services.len())
    }

    /// Returns the names of services currently polled.
    #[must_use]
    pub fn watched(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .services()
            .map(|services| {
                services
                    .iter()
                    .filter(|(_, token)| !token.is_cancelled())
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Cancels every poll loop and rejects later registrations.
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}

impl ServiceRegistrar for ServiceHealthMonitor {
    fn register_service(
        &self,
        name: &str,
        check: Arc<dyn ServiceCheck>,
    ) -> BusResult<MonitorSubscription> {
        self.watch(name, check)
    }
}

struct Poller {
    name: String,
    check: Arc<dyn ServiceCheck>,
    bus: Weak<EventBus>,
    policy: PollPolicy,
    sender: watch::Sender<ServiceStatus>,
    cancel: CancellationToken,
}

impl Poller {
    async fn run(self) {
        let mut tracker = StatusTracker::new();
        let mut ticker = time::interval(self.policy.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if !self.cycle(&mut tracker).await {
                break;
            }
        }
        debug!(service = %self.name, "health monitor stopped");
    }

    /// Runs one probe. Returns `false` when the loop should stop.
    async fn cycle(&self, tracker: &mut StatusTracker) -> bool {
        tracker.begin_check();
        self.sender.send_replace(tracker.current());

        let available = tokio::select! {
            () = self.cancel.cancelled() => {
                tracker.abandon_check();
                self.sender.send_replace(tracker.current());
                return false;
            }
            outcome = time::timeout(self.policy.probe_timeout(), self.check.check()) => {
                match outcome {
                    Ok(report) => report.status().is_on(),
                    Err(_) => {
                        trace!(
                            service = %self.name,
                            timeout = ?self.policy.probe_timeout(),
                            "probe timed out"
                        );
                        false
                    }
                }
            }
        };

        let transition = tracker.record(available);
        self.sender.send_replace(tracker.current());
        self.announce(transition)
    }

    fn announce(&self, transition: Option<StatusTransition>) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        if bus.is_shut_down() {
            return false;
        }
        if let Some(change) = transition {
            bus.emit(&change.event_name(&self.name), Value::Null);
        }
        true
    }
}
