//! Device reconciliation - desired state vs reported state

pub mod ports;
pub mod state;
