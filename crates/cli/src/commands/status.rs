use forloop::{ChatInputInfo, SocketInfo, SubmitButtonInfo};
use serde::Serialize;

use super::Ctx;
use crate::error::Result;
use crate::output::flag;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
	socket: SocketInfo,
	helper_installed: bool,
	chat_input: ChatInputInfo,
	submit_button: SubmitButtonInfo,
}

pub async fn execute(ctx: &Ctx) -> Result<()> {
	let automation = ctx.automation().await?;
	let manager = automation.manager();

	let Some(socket) = manager.connected_socket() else {
		return Err(forloop::AutomationError::NotConnected.into());
	};
	let helper_installed = automation.helper_installed().await?;
	let chat_input = automation.find_chat_input().await?;
	let submit_button = automation.find_submit_button().await?;
	manager.dispose();

	ctx.emit(
		"status",
		StatusData {
			socket,
			helper_installed,
			chat_input,
			submit_button,
		},
		|data| {
			format!(
				"target      {} ({})\nsocket      {}\nhelper      {}\nchat input  {}\nsend button {}",
				data.socket.title,
				data.socket.target_id,
				data.socket.web_socket_debugger_url,
				flag(data.helper_installed),
				flag(data.chat_input.found),
				flag(data.submit_button.found),
			)
		},
	);
	Ok(())
}
