//! Reclip dashboard.
//!
//! Holds the state a dashboard renders and the actions that change it:
//! uploads, remote imports, processing, clip generation and history.

pub mod dashboard;
pub mod state;
pub mod telemetry;

pub use dashboard::Dashboard;
pub use state::{CurrentVideo, DashboardState};
pub use telemetry::init_tracing;
