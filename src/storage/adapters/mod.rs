//! Adapter implementations for storage supervision ports.

pub mod memory;

mod http;
mod process;

pub use http::HttpGatewayProbe;
pub use process::{CommandProcessLauncher, ReadinessPolicy};
