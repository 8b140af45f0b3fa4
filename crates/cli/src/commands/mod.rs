//! Subcommand implementations.

mod accept;
mod buttons;
mod detect;
mod prompt;
mod status;
mod targets;

use std::sync::Arc;
use std::time::Instant;

use forloop::{Automation, CdpManager, Config};
use serde::Serialize;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::output::{OutputFormat, ResultBuilder, print_result};

/// Per-invocation state shared by the commands.
pub struct Ctx {
	pub config: Config,
	pub format: OutputFormat,
	pub started: Instant,
}

impl Ctx {
	/// Prints a successful envelope.
	pub fn emit<T: Serialize>(&self, command: &str, data: T, text: impl FnOnce(&T) -> String) {
		let result = ResultBuilder::new(command)
			.started(self.started)
			.data(data)
			.build();
		print_result(&result, self.format, text);
	}

	/// Connects to the IDE and installs the page helper.
	pub async fn automation(&self) -> Result<Automation> {
		let manager = Arc::new(CdpManager::new(self.config.clone()));
		manager.connect().await?;
		Ok(Automation::new(manager))
	}
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
	let ctx = Ctx {
		config,
		format: cli.format,
		started: Instant::now(),
	};

	match cli.command {
		Commands::Status => status::execute(&ctx).await,
		Commands::Targets => targets::execute(&ctx).await,
		Commands::Inject(args) => prompt::inject(&ctx, &args).await,
		Commands::Submit => prompt::submit(&ctx).await,
		Commands::Send(args) => prompt::send(&ctx, &args).await,
		Commands::Accept(args) => accept::execute(&ctx, &args).await,
		Commands::Buttons => buttons::execute(&ctx).await,
		Commands::Detect(args) => detect::execute(&ctx, &args),
	}
}
