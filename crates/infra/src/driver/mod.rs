//! Device driver implementations

mod http;

pub use http::HttpDeviceDriver;
