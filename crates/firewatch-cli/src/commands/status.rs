//! Status command implementation.
//!
//! Runs a single poll cycle plus the threshold fetch and prints the result.

use std::path::PathBuf;

use anyhow::Result;
use firewatch_core::{Gateway, Monitor};

use crate::format::{FormatOptions, format_dashboard};
use crate::util::write_output;

pub async fn cmd_status<G: Gateway + 'static>(
    monitor: &Monitor<G>,
    json: bool,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let poller = monitor.poller();
    let (report, _) = tokio::join!(poller.refresh_all(), poller.refresh_thresholds());

    if !report.readings.ok && !report.media.ok && !report.status.ok {
        eprintln!("Backend unreachable; showing fallback values.");
    } else if !report.all_ok() {
        let failed: Vec<_> = report
            .failed_sources()
            .iter()
            .map(|s| s.path())
            .collect();
        eprintln!("Using fallback values for {}", failed.join(", "));
    }

    let content = format_dashboard(&monitor.view(), json, opts)?;
    write_output(output, &content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use firewatch_core::{MockEndpoint, MockGateway, ThresholdConfig};

    #[tokio::test]
    async fn test_status_runs_one_cycle() {
        let monitor = Monitor::new(
            MockGateway::builder()
                .thresholds(ThresholdConfig::new(28.0, 150.0))
                .build(),
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");

        cmd_status(&monitor, true, Some(&path), &FormatOptions::new(true, false))
            .await
            .unwrap();

        let gateway = monitor.gateway();
        assert_eq!(gateway.call_count(MockEndpoint::Readings), 1);
        assert_eq!(gateway.call_count(MockEndpoint::Thresholds), 1);

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["thresholds"]["gas_max"], 150.0);
        assert_eq!(value["thresholds_confirmed"], true);
        assert_eq!(value["reading"]["temperature"], 24.5);
    }
}
