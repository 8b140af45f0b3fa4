use super::Ctx;
use crate::cli::DetectArgs;
use crate::error::{CliError, Result};
use crate::project::detect_test_command;

pub fn execute(ctx: &Ctx, args: &DetectArgs) -> Result<()> {
	let dir = match &args.dir {
		Some(dir) => dir.clone(),
		None => std::env::current_dir()?,
	};
	if !dir.is_dir() {
		return Err(CliError::Input(format!("not a directory: {}", dir.display())));
	}

	let detected = detect_test_command(&dir).ok_or(CliError::NotDetected { dir })?;
	ctx.emit("detect", detected, |d| d.cmd.clone());
	Ok(())
}
