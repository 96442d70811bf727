//! Operator alert sink backed by the tracing log stream.

use async_trait::async_trait;
use signage_core::OperatorAlerts;
use signage_domain::Display;
use tracing::{error, info};

/// Emits operator alerts as structured log events.
///
/// Deployments hook their alerting on the `operator_alert` target.
pub struct LogOperatorAlerts;

#[async_trait]
impl OperatorAlerts for LogOperatorAlerts {
    async fn device_failed(&self, disp: &Display, last_error: &str, attempts: u32) {
        error!(
            target: "operator_alert",
            display = %disp.id,
            name = %disp.name,
            attempts,
            error = %last_error,
            "display failed to converge"
        );
    }

    async fn device_recovered(&self, disp: &Display) {
        info!(
            target: "operator_alert",
            display = %disp.id,
            name = %disp.name,
            "display recovered"
        );
    }
}
