use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) const ASSESSMENT_SUBMISSIONS: &str = "assessment_submissions_total";
pub(crate) const PAYMENTS_COMPLETED: &str = "payments_completed_total";
pub(crate) const PAYMENTS_FAILED: &str = "payments_failed_total";
pub(crate) const CERTIFICATES_ISSUED: &str = "certificates_issued_total";
pub(crate) const LIVE_CLASS_TRANSITIONS: &str = "live_class_status_transitions_total";

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    if PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!(ASSESSMENT_SUBMISSIONS, "Assessment attempts submitted");
    metrics::describe_counter!(PAYMENTS_COMPLETED, "Payments verified as completed");
    metrics::describe_counter!(PAYMENTS_FAILED, "Payments marked as failed");
    metrics::describe_counter!(CERTIFICATES_ISSUED, "Certificates issued");
    metrics::describe_counter!(LIVE_CLASS_TRANSITIONS, "Live class status transitions");
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
