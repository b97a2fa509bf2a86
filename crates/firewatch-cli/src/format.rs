//! Output formatting utilities for text and JSON output.

use anyhow::Result;
use firewatch_core::{DashboardView, EffectiveStatus, MonitorEvent, StatusLevel, StatusSource};
use firewatch_types::ThresholdConfig;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::OffsetDateTime;

/// Placeholder shown for values the node did not report.
pub const UNKNOWN_VALUE: &str = "---";

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool, compact: bool) -> Self {
        Self { no_color, compact }
    }

    /// Serialize to JSON, respecting the compact setting.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    /// Highlight a card value when its alert is active.
    fn card(&self, value: String, alert: bool) -> String {
        match (alert, self.no_color) {
            (false, _) => value,
            (true, true) => format!("{} [ALERT]", value),
            (true, false) => format!("{} {}", value.red().bold(), "[ALERT]".red()),
        }
    }

    fn header(&self, text: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            text.bold().to_string()
        }
    }
}

/// Format an optional measurement, `---` when unknown.
#[must_use]
pub fn format_value(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}{}", decimals, v, unit),
        _ => UNKNOWN_VALUE.to_string(),
    }
}

/// Format a status level with color
#[must_use]
pub fn format_status_level(level: &StatusLevel, no_color: bool) -> String {
    let label = level.label().to_uppercase();

    if no_color {
        format!("[{}]", label)
    } else {
        match level {
            StatusLevel::Normal => format!("[{}]", label.green()),
            StatusLevel::Risk => format!("[{}]", label.yellow()),
            StatusLevel::Confirmed => format!("[{}]", label.red().bold()),
            StatusLevel::Unknown(_) => format!("[{}]", label.dimmed()),
        }
    }
}

fn format_effective_status(status: Option<&EffectiveStatus>, opts: &FormatOptions) -> String {
    match status {
        Some(status) => {
            let mut line = format!(
                "{} {}",
                format_status_level(&status.level, opts.no_color),
                status.message
            );
            if status.source == StatusSource::LocalOverride {
                line.push_str(" (local alert)");
            }
            line
        }
        None => UNKNOWN_VALUE.to_string(),
    }
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "???".to_string())
}

fn or_unknown(url: &str) -> &str {
    if url.is_empty() { UNKNOWN_VALUE } else { url }
}

// ============================================================================
// Dashboard formatting
// ============================================================================

/// Multi-line dashboard for `status` and the first `watch` frame.
pub fn format_dashboard_text(view: &DashboardView, opts: &FormatOptions) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Status:       {}\n",
        format_effective_status(view.status.as_ref(), opts)
    ));

    let Some(reading) = &view.reading else {
        out.push_str("Waiting for the first reading...\n");
        return out;
    };

    let thresholds = &view.thresholds;
    out.push_str(&format!(
        "Temperature:  {}\n",
        opts.card(
            format!(
                "{}  (max {} °C)",
                format_value(reading.temperature, 1, " °C"),
                thresholds.temperature_max
            ),
            view.cards.temperature
        )
    ));
    out.push_str(&format!(
        "Humidity:     {}\n",
        format_value(reading.humidity, 0, " %")
    ));
    out.push_str(&format!(
        "Gas level:    {}\n",
        opts.card(
            format!(
                "{}  (max {} ppm)",
                format_value(reading.gas_level, 0, " ppm"),
                thresholds.gas_max
            ),
            view.cards.gas
        )
    ));
    out.push_str(&format!(
        "Fire:         {}\n",
        opts.card(view.cards.fire_card.label().to_string(), view.cards.fire)
    ));

    if let Some(media) = &view.media {
        out.push_str(&format!("Photo:        {}\n", or_unknown(&media.photo_url)));
        out.push_str(&format!("Audio:        {}\n", or_unknown(&media.audio_url)));
    }

    out.push_str(&format!(
        "Updated:      {}\n",
        format_timestamp(reading.timestamp)
    ));
    if !view.thresholds_confirmed {
        out.push_str("(thresholds not confirmed by the backend; using defaults)\n");
    }
    out
}

/// Single-line dashboard for `watch`.
#[must_use]
pub fn format_watch_line(view: &DashboardView, opts: &FormatOptions) -> String {
    let ts = view
        .reading
        .as_ref()
        .map(|r| format_timestamp(r.timestamp))
        .unwrap_or_else(|| UNKNOWN_VALUE.to_string());

    let status = view
        .status
        .as_ref()
        .map(|s| format_status_level(&s.level, opts.no_color))
        .unwrap_or_else(|| format!("[{}]", UNKNOWN_VALUE));

    let reading = view.reading.as_ref();
    let parts = [
        ts,
        status,
        opts.card(
            format_value(reading.and_then(|r| r.temperature), 1, "°C"),
            view.cards.temperature,
        ),
        format_value(reading.and_then(|r| r.humidity), 0, "%"),
        opts.card(
            format!("gas {}", format_value(reading.and_then(|r| r.gas_level), 0, "")),
            view.cards.gas,
        ),
        opts.card(
            format!("fire {}", view.cards.fire_card.label()),
            view.cards.fire,
        ),
    ];

    parts.join("  ") + "\n"
}

pub fn format_dashboard(view: &DashboardView, json: bool, opts: &FormatOptions) -> Result<String> {
    if json {
        opts.as_json(view)
    } else {
        Ok(format_dashboard_text(view, opts))
    }
}

// ============================================================================
// Threshold formatting
// ============================================================================

pub fn format_thresholds_text(
    thresholds: &ThresholdConfig,
    confirmed: bool,
    opts: &FormatOptions,
) -> String {
    let mut out = format!("{}\n", opts.header("Alert thresholds"));
    out.push_str(&format!(
        "  Temperature max:  {} °C\n",
        thresholds.temperature_max
    ));
    out.push_str(&format!("  Gas max:          {} ppm\n", thresholds.gas_max));
    if !confirmed {
        out.push_str("  (defaults; the backend did not provide thresholds)\n");
    }
    out
}

pub fn format_thresholds_json(
    thresholds: &ThresholdConfig,
    confirmed: bool,
    opts: &FormatOptions,
) -> Result<String> {
    #[derive(Serialize)]
    struct ThresholdsOutput<'a> {
        #[serde(flatten)]
        thresholds: &'a ThresholdConfig,
        confirmed: bool,
    }

    opts.as_json(&ThresholdsOutput {
        thresholds,
        confirmed,
    })
}

// ============================================================================
// Notifications
// ============================================================================

/// User-facing text for notification events, `None` for the rest.
#[must_use]
pub fn format_notification(event: &MonitorEvent, opts: &FormatOptions) -> Option<String> {
    match event {
        MonitorEvent::ThresholdsUpdated { thresholds } => {
            let text = format!(
                "Thresholds updated: temperature max {} °C, gas max {} ppm",
                thresholds.temperature_max, thresholds.gas_max
            );
            Some(if opts.no_color {
                text
            } else {
                text.green().to_string()
            })
        }
        MonitorEvent::ThresholdUpdateFailed { error } => {
            let text = format!("Failed to update thresholds: {}", error);
            Some(if opts.no_color {
                text
            } else {
                text.red().to_string()
            })
        }
        _ => None,
    }
}
