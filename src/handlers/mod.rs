pub mod health;
pub mod ledgers_handler;
pub mod metrics;
pub mod proofs_handler;
pub mod requests_handler;
pub mod schedule_handler;
pub mod work_types_handler;

pub use health::health_check;
pub use metrics::{metrics_handler, setup_metrics_recorder, MetricsState};
