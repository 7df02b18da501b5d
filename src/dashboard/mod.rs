//! Polling dashboard: live charts and history tables over the relay api.

use std::time::Duration;

pub mod poller;
pub mod render;
pub mod view;

pub use poller::{ConnectionState, Dashboard};
pub use view::{build_view, DashboardView};

/// time between history queries
pub const POLLING_RATE: Duration = Duration::from_millis(2000);

/// points kept on each live chart
pub const LIVE_CHART_MAX_POINTS: usize = 20;
