//! Background workers with explicit lifecycles
//!
//! Both workers follow the same rules: join handles are tracked,
//! cancellation is explicit via a token, and every external call is
//! wrapped in a timeout.

mod alerts;
mod error;
mod import_worker;
mod reconcile_worker;

pub use alerts::LogOperatorAlerts;
pub use error::WorkerError;
pub use import_worker::ImportWorker;
pub use reconcile_worker::ReconcileWorker;
