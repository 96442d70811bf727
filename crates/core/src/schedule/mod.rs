//! Display scheduling - operator rules to desired display state

pub mod engine;
pub mod ports;
