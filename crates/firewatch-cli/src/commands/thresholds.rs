//! Threshold commands.
//!
//! `set` goes through a [`ThresholdEditSession`](firewatch_core::ThresholdEditSession)
//! exactly like an interactive editor would: load the confirmed values, begin
//! editing, change the requested fields and commit the whole draft.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use firewatch_core::{Gateway, Monitor, ThresholdField};

use crate::format::{
    FormatOptions, format_notification, format_thresholds_json, format_thresholds_text,
};
use crate::util::write_output;

/// Raw values from the command line, parsed by the edit session.
#[derive(Debug, Clone, Default)]
pub struct ThresholdChanges {
    pub temperature_max: Option<String>,
    pub gas_max: Option<String>,
}

impl ThresholdChanges {
    fn fields(&self) -> Vec<(ThresholdField, &str)> {
        [
            (ThresholdField::TemperatureMax, self.temperature_max.as_deref()),
            (ThresholdField::GasMax, self.gas_max.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}

fn render<G: Gateway + 'static>(
    monitor: &Monitor<G>,
    json: bool,
    opts: &FormatOptions,
) -> Result<String> {
    let view = monitor.view();
    if json {
        format_thresholds_json(&view.thresholds, view.thresholds_confirmed, opts)
    } else {
        Ok(format_thresholds_text(
            &view.thresholds,
            view.thresholds_confirmed,
            opts,
        ))
    }
}

pub async fn cmd_thresholds_show<G: Gateway + 'static>(
    monitor: &Monitor<G>,
    json: bool,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    monitor.poller().refresh_thresholds().await;
    let content = render(monitor, json, opts)?;
    write_output(output, &content)?;
    Ok(())
}

pub async fn cmd_thresholds_set<G: Gateway + 'static>(
    monitor: &Monitor<G>,
    changes: &ThresholdChanges,
    json: bool,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let fields = changes.fields();
    if fields.is_empty() {
        bail!("Nothing to change: pass --temperature-max and/or --gas-max");
    }

    // Unchanged fields are sent as the backend currently has them.
    monitor.poller().refresh_thresholds().await;
    if !monitor.state().thresholds_confirmed() {
        eprintln!("Could not load current thresholds; unchanged fields use defaults.");
    }

    let mut events = monitor.events();
    let session = monitor.edit_session();
    session.begin_edit()?;
    for (field, value) in fields {
        if let Err(e) = session.set_field(field, value) {
            session.cancel().ok();
            return Err(e).with_context(|| format!("Invalid value for {}", field.label()));
        }
    }

    let result = session.commit().await;

    while let Ok(event) = events.try_recv() {
        if let Some(text) = format_notification(&event, opts) {
            eprintln!("{}", text);
        }
    }

    match result {
        Ok(_) => {
            let content = render(monitor, json, opts)?;
            write_output(output, &content)?;
            Ok(())
        }
        Err(e) => Err(e).context("Threshold update failed"),
    }
}
