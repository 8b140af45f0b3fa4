use colored::Colorize;
use forloop::ButtonClass;

use super::Ctx;
use crate::error::Result;

pub async fn execute(ctx: &Ctx) -> Result<()> {
	let automation = ctx.automation().await?;
	let buttons = automation.scan_buttons().await?;
	automation.manager().dispose();

	ctx.emit("buttons", buttons, |buttons| {
		if buttons.is_empty() {
			return "no buttons".to_string();
		}
		buttons
			.iter()
			.map(|b| {
				let class = match b.class {
					ButtonClass::Accept => b.class.as_str().green(),
					ButtonClass::Submit => b.class.as_str().cyan(),
					ButtonClass::Neutral => b.class.as_str().dimmed(),
				};
				let state = match (b.visible, b.disabled) {
					(false, _) => " (hidden)",
					(true, true) => " (disabled)",
					(true, false) => "",
				};
				format!("{:<7} {:<5} {:?}{state}", class, b.scope, b.text)
			})
			.collect::<Vec<_>>()
			.join("\n")
	});
	Ok(())
}
