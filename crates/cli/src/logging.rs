use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Logs to stderr so stdout carries only the result envelope. `RUST_LOG`
/// overrides the `-v` count.
pub fn init_logging(verbosity: u8) {
	// Runtime errors surface through the envelope; its own warnings are noise
	// until -v. Per-frame tracing needs -vv.
	let filter = match verbosity {
		0 => "warn,forloop_runtime=error",
		1 => "info,forloop_runtime=warn",
		_ => "debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr.with_max_level(tracing::Level::TRACE))
		.with_target(verbosity > 0)
		.compact()
		.init();
}
