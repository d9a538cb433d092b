// Shared session state: registration, position updates, detection,
// broadcast fan-out, snapshots and cleanup

mod engine;
mod metrics;

pub use engine::{Registration, SwarmSettings, SwarmState};
pub use metrics::{ActivityMetrics, ActivityStats, AlertCounts};
