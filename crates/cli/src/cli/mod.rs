use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;
use crate::styles::cli_styles;


#[derive(Parser, Debug)]
#[command(name = "forloop")]
#[command(about = "Drive the Antigravity agent panel over the DevTools protocol")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: json (default) or text
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// JSON config file (default: ./forloop.json when present)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Host of the IDE's debugging server
	#[arg(long, global = true, value_name = "HOST")]
	pub host: Option<String>,

	/// First port to probe
	#[arg(long, global = true, value_name = "PORT")]
	pub port_start: Option<u16>,

	/// Last port to probe (inclusive)
	#[arg(long, global = true, value_name = "PORT")]
	pub port_end: Option<u16>,

	/// Per-command timeout in milliseconds
	#[arg(long, global = true, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Connect and report the socket, helper, and chat input state
	Status,

	/// List DevTools targets on every port in range
	Targets,

	/// Replace the chat editor's content
	Inject(PromptArgs),

	/// Click the panel's send button
	Submit,

	/// Inject a prompt, then submit it
	Send(PromptArgs),

	/// Click every accept button in the workbench and panel
	Accept(AcceptArgs),

	/// List buttons with their classification
	Buttons,

	/// Print the test command for a workspace
	Detect(DetectArgs),
}

impl Commands {
	/// Name used in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Status => "status",
			Commands::Targets => "targets",
			Commands::Inject(_) => "inject",
			Commands::Submit => "submit",
			Commands::Send(_) => "send",
			Commands::Accept(_) => "accept",
			Commands::Buttons => "buttons",
			Commands::Detect(_) => "detect",
		}
	}

	/// Whether the command reads connection settings. `detect` runs even
	/// when the config file is broken.
	pub fn needs_config(&self) -> bool {
		!matches!(self, Commands::Detect(_))
	}
}

#[derive(Args, Debug, Clone)]
pub struct PromptArgs {
	/// Prompt text, or `-` to read stdin
	#[arg(value_name = "TEXT", conflicts_with = "file")]
	pub text: Option<String>,

	/// Read the prompt from a file
	#[arg(long, value_name = "FILE")]
	pub file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AcceptArgs {
	/// Keep sweeping until interrupted
	#[arg(long)]
	pub watch: bool,

	/// Delay between sweeps in watch mode
	#[arg(long, value_name = "MS", default_value_t = 1000, requires = "watch")]
	pub interval_ms: u64,

	/// Stop watching after this many sweeps
	#[arg(long, value_name = "N", requires = "watch")]
	pub max_rounds: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
	/// Workspace directory (default: current directory)
	#[arg(value_name = "DIR")]
	pub dir: Option<PathBuf>,
}
