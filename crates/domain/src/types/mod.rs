//! Common data types used throughout the application

pub mod display;
pub mod event;
pub mod report;
pub mod schedule;

pub use display::*;
pub use event::*;
pub use report::*;
pub use schedule::*;
