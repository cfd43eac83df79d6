//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend
//!     → Update state.rs
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - Liveness is written here and only read by the dispatcher
//! - Checks are off by default, leaving every backend alive
//! - Forwarding failures do not affect liveness
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod state;

pub use active::HealthMonitor;
pub use state::{HealthState, Liveness};
