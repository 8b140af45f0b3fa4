use clap::Parser;
use forloop::Config;
use forloop_cli::{
	cli::Cli,
	commands, config,
	error::CliError,
	logging,
	output::{self, OutputFormat, ResultBuilder},
};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let format = cli.format;
	let command = cli.command.name();

	let config = if cli.command.needs_config() {
		std::env::current_dir()
			.map_err(CliError::Io)
			.and_then(|cwd| config::resolve(&cli, &cwd))
	} else {
		Ok(Config::default())
	};
	let outcome = match config {
		Ok(config) => commands::dispatch(cli, config).await,
		Err(err) => Err(err),
	};

	if let Err(err) = outcome {
		handle_error(command, err, format);
		std::process::exit(1);
	}
}

fn handle_error(command: &str, err: CliError, format: OutputFormat) {
	let cmd_error = err.to_command_error();

	// Humans read stderr
	output::print_error_stderr(&cmd_error);

	// Agents read the envelope on stdout
	if format != OutputFormat::Text {
		let result: output::CommandResult<()> = ResultBuilder::new(command).command_error(cmd_error).build();
		output::print_result(&result, format, |_| String::new());
	}
}
