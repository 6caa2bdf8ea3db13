//! Dependency-ordered startup of a topology

mod infrastructure;
mod started;
mod topology_scheduler;

pub use infrastructure::{InfrastructureSettings, DEFAULT_WARMUP};
pub use started::StartedSet;
pub use topology_scheduler::{plan, TopologyScheduler};
