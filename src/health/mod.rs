//! Availability monitoring with de-bounced transition events.
//!
//! A [`ServiceHealthMonitor`] is the bus's health aggregator: components
//! register a named [`ServiceCheck`] through
//! [`crate::bus::EventBus::register_service`], and the monitor polls it on a
//! [`PollPolicy`] schedule. Each service keeps a [`ServiceStatus`] owned by
//! its poll loop; the loop emits `check:backOnline:<Name>` and
//! `check:wentOffline:<Name>` only when the status actually changes.

mod check;
mod monitor;
mod policy;
mod status;

pub use check::{ServiceCheck, ServiceCheckReport, ServiceRegistrar, ServiceState};
pub use monitor::{MonitorSubscription, ServiceHealthMonitor, StatusWatch};
pub use policy::PollPolicy;
pub use status::{ParseServiceStatusError, ServiceStatus, StatusTracker, StatusTransition};

#[cfg(test)]
mod tests;
