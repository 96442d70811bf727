//! Error conversions from infrastructure crates into domain errors

use signage_domain::SignageError;

/// Map a connection pool failure.
pub fn map_pool_error(err: r2d2::Error) -> SignageError {
    SignageError::Database(format!("pool error: {err}"))
}

/// Map a SQLite failure.
pub fn map_sql_error(err: rusqlite::Error) -> SignageError {
    SignageError::Database(err.to_string())
}

/// Classify an HTTP failure against a display device.
///
/// Timeouts and connection failures are distinct variants so the
/// reconciliation loop can log them apart; everything else counts as the
/// device rejecting the command.
pub fn classify_device_error(err: &reqwest::Error) -> SignageError {
    if err.is_timeout() {
        SignageError::DeviceTimeout(err.to_string())
    } else if err.is_connect() {
        SignageError::DeviceUnreachable(err.to_string())
    } else {
        SignageError::DeviceRejected(err.to_string())
    }
}

/// Map a campus feed failure. Every transport problem is the same to the
/// import pipeline: the source is unavailable and the cycle is skipped.
pub fn map_source_error(err: reqwest::Error) -> SignageError {
    SignageError::SourceUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_errors_map_to_database() {
        let err = map_sql_error(rusqlite::Error::InvalidQuery);
        assert!(matches!(err, SignageError::Database(_)));
    }
}
