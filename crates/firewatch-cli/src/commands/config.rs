//! Config command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::ConfigAction;
use crate::config::Config;
use crate::format::FormatOptions;
use crate::util::write_output;

pub fn cmd_config(
    action: ConfigAction,
    json: bool,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let path = Config::path();
    match action {
        ConfigAction::Show => {
            let config = Config::load();
            let content = if json {
                opts.as_json(&config)?
            } else {
                toml::to_string_pretty(&config).context("Failed to serialize config")?
            };
            write_output(output, &content)
        }
        ConfigAction::Path => write_output(output, &format!("{}\n", path.display())),
        ConfigAction::Init => init_config(&path),
    }
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        eprintln!("Config already exists: {}", path.display());
        return Ok(());
    }
    Config::default().save_to(path)?;
    eprintln!("Created config: {}", path.display());
    Ok(())
}
