//! Room occupancy resolution

pub mod resolver;
