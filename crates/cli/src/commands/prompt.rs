//! `inject`, `submit`, `send`.

use std::io::Read;

use forloop::PromptOutcome;
use serde::Serialize;

use super::Ctx;
use crate::cli::PromptArgs;
use crate::error::{CliError, Result};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptData {
	success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	chars: Option<usize>,
}

/// Prompt text from the argument, `-` (stdin), or `--file`.
pub(crate) fn read_prompt(args: &PromptArgs) -> Result<String> {
	let raw = match (&args.text, &args.file) {
		(Some(text), _) if text == "-" => {
			let mut buf = String::new();
			std::io::stdin().read_to_string(&mut buf)?;
			buf
		}
		(Some(text), _) => text.clone(),
		(None, Some(path)) => std::fs::read_to_string(path)?,
		(None, None) => return Err(CliError::Input("prompt text required (TEXT, -, or --file)".into())),
	};

	let text = raw.trim_end_matches(['\r', '\n']).to_string();
	if text.trim().is_empty() {
		return Err(CliError::Input("prompt is empty".into()));
	}
	Ok(text)
}

fn finish(ctx: &Ctx, command: &'static str, outcome: PromptOutcome, chars: Option<usize>) -> Result<()> {
	if !outcome.success {
		return Err(CliError::Panel {
			command,
			message: outcome.error.unwrap_or_else(|| "panel did not confirm".into()),
		});
	}
	ctx.emit(command, PromptData { success: true, chars }, |data| match data.chars {
		Some(n) => format!("{command}: ok ({n} chars)"),
		None => format!("{command}: ok"),
	});
	Ok(())
}

pub async fn inject(ctx: &Ctx, args: &PromptArgs) -> Result<()> {
	let text = read_prompt(args)?;
	let automation = ctx.automation().await?;
	let outcome = automation.inject_prompt(&text).await;
	automation.manager().dispose();
	finish(ctx, "inject", outcome, Some(text.chars().count()))
}

pub async fn submit(ctx: &Ctx) -> Result<()> {
	let automation = ctx.automation().await?;
	let outcome = automation.submit_prompt().await;
	automation.manager().dispose();
	finish(ctx, "submit", outcome, None)
}

pub async fn send(ctx: &Ctx, args: &PromptArgs) -> Result<()> {
	let text = read_prompt(args)?;
	let automation = ctx.automation().await?;
	let outcome = automation.send_prompt(&text).await;
	automation.manager().dispose();
	finish(ctx, "send", outcome, Some(text.chars().count()))
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use super::*;

	fn args(text: Option<&str>, file: Option<PathBuf>) -> PromptArgs {
		PromptArgs {
			text: text.map(str::to_string),
			file,
		}
	}

	#[test]
	fn text_argument_is_verbatim() {
		let text = read_prompt(&args(Some("Test with `backticks` and $dollars"), None)).unwrap();
		assert_eq!(text, "Test with `backticks` and $dollars");
	}

	#[test]
	fn file_trailing_newline_trimmed() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("prompt.md");
		std::fs::write(&path, "line one\nline two\n\n").unwrap();

		let text = read_prompt(&args(None, Some(path))).unwrap();
		assert_eq!(text, "line one\nline two");
	}

	#[test]
	fn missing_or_blank_prompt_rejected() {
		assert!(matches!(read_prompt(&args(None, None)), Err(CliError::Input(_))));
		assert!(matches!(read_prompt(&args(Some("  "), None)), Err(CliError::Input(_))));
	}
}
