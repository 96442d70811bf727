//! External campus event feed

mod campus;

pub use campus::CampusEventSource;
