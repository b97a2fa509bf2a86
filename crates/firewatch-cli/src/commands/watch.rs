//! Watch command implementation.
//!
//! Mounts a [`Monitor`] and prints a line every time the dashboard changes.
//! Ctrl+C cancels the poller; requests already in flight are discarded.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use firewatch_core::{Gateway, Monitor, PollerOptions};
use owo_colors::OwoColorize;

use crate::format::{FormatOptions, format_watch_line};
use crate::util::write_output;

/// Arguments for the watch command.
pub struct WatchArgs<'a> {
    pub api_url: &'a str,
    pub interval: Duration,
    pub count: Option<u32>,
    pub json: bool,
    pub quiet: bool,
    pub output: Option<&'a PathBuf>,
    pub opts: &'a FormatOptions,
}

pub async fn cmd_watch<G: Gateway + 'static>(
    monitor: &mut Monitor<G>,
    args: WatchArgs<'_>,
) -> Result<()> {
    let WatchArgs {
        api_url,
        interval,
        count,
        json,
        quiet,
        output,
        opts,
    } = args;

    let options = PollerOptions::builder().poll_interval(interval).build();
    let mut view = monitor.subscribe();
    monitor.start(options)?;

    if !quiet {
        let header = if opts.no_color {
            format!("Watching: {}", api_url)
        } else {
            format!("Watching: {}", api_url.cyan())
        };
        eprintln!("{}", header);
        match count {
            Some(n) => eprintln!(
                "Interval: {}ms | Count: {} | Press Ctrl+C to stop",
                interval.as_millis(),
                n
            ),
            None => eprintln!("Interval: {}ms | Press Ctrl+C to stop", interval.as_millis()),
        }
        eprintln!("{}", "-".repeat(60));
    }

    let mut shown: u32 = 0;
    loop {
        if count.is_some_and(|n| shown >= n) {
            if !quiet {
                eprintln!("Completed {} updates.", shown);
            }
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\nShutting down...");
                break;
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let dashboard = view.borrow_and_update().clone();
                if dashboard.is_loading() {
                    continue;
                }
                let content = if json {
                    opts.as_json(&dashboard)?
                } else {
                    format_watch_line(&dashboard, opts)
                };
                write_output(output, &content)?;
                shown += 1;
            }
        }
    }

    monitor.shutdown().await;
    Ok(())
}
