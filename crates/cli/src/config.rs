//! Layered configuration: defaults, then a JSON file, then flags.

use std::path::Path;

use forloop::{CONFIG_FILE_NAME, Config};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Resolves the effective config for this invocation.
///
/// An explicit `--config` must exist; `forloop.json` in `cwd` is used only
/// when present.
pub fn resolve(cli: &Cli, cwd: &Path) -> Result<Config> {
	let mut config = match &cli.config {
		Some(path) => Config::from_file(path)?,
		None => {
			let local = cwd.join(CONFIG_FILE_NAME);
			if local.is_file() {
				tracing::debug!(path = %local.display(), "using local config");
				Config::from_file(&local)?
			} else {
				Config::default()
			}
		}
	};

	if let Some(host) = &cli.host {
		config.host = host.clone();
	}
	if let Some(start) = cli.port_start {
		config.port_start = start;
		if cli.port_end.is_none() && config.port_end < start {
			config.port_end = start;
		}
	}
	if let Some(end) = cli.port_end {
		config.port_end = end;
	}
	if let Some(ms) = cli.timeout_ms {
		config.command_timeout_ms = ms;
	}

	config.validate().map_err(CliError::Input)?;
	Ok(config)
}
