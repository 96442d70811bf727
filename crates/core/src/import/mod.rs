//! Event import from the external campus source

pub mod pipeline;
pub mod ports;
