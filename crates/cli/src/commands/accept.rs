//! `accept`: one sweep, or a polling loop with `--watch`.

use std::time::Duration;

use forloop::{AcceptSummary, Automation};
use serde::Serialize;

use super::Ctx;
use crate::cli::AcceptArgs;
use crate::error::Result;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchSummary {
	rounds: u32,
	found: u32,
	clicked: u32,
	/// Sweeps that failed (socket lost, page threw)
	failed_rounds: u32,
	reconnects: u32,
}

pub async fn execute(ctx: &Ctx, args: &AcceptArgs) -> Result<()> {
	let automation = ctx.automation().await?;

	if !args.watch {
		let summary = automation.click_accept_buttons().await;
		automation.manager().dispose();
		let summary = summary?;
		ctx.emit("accept", summary, |s: &AcceptSummary| {
			if s.found == 0 {
				"no accept button found".to_string()
			} else {
				format!("clicked {}/{} accept button(s)", s.clicked, s.found)
			}
		});
		return Ok(());
	}

	let totals = watch(&automation, Duration::from_millis(args.interval_ms), args.max_rounds).await;
	automation.manager().dispose();
	ctx.emit("accept", totals, |t| {
		format!(
			"{} round(s): clicked {}/{} accept button(s), {} failed, {} reconnect(s)",
			t.rounds, t.clicked, t.found, t.failed_rounds, t.reconnects
		)
	});
	Ok(())
}

/// Sweeps until `max_rounds` or Ctrl-C, reconnecting between rounds when the
/// socket drops.
async fn watch(automation: &Automation, interval: Duration, max_rounds: Option<u32>) -> WatchSummary {
	let manager = automation.manager();
	let mut totals = WatchSummary::default();

	loop {
		if max_rounds.is_some_and(|max| totals.rounds >= max) {
			break;
		}

		if !manager.is_connector_active() {
			if manager.try_connect().await {
				totals.reconnects += 1;
			} else {
				totals.failed_rounds += 1;
			}
		}

		if manager.is_connector_active() {
			match automation.click_accept_buttons().await {
				Ok(summary) => {
					totals.found += summary.found;
					totals.clicked += summary.clicked;
				}
				Err(e) => {
					tracing::warn!(error = %e, round = totals.rounds, "accept sweep failed");
					totals.failed_rounds += 1;
				}
			}
		}
		totals.rounds += 1;

		if max_rounds.is_some_and(|max| totals.rounds >= max) {
			break;
		}
		tokio::select! {
			_ = tokio::time::sleep(interval) => {}
			_ = tokio::signal::ctrl_c() => {
				tracing::info!("interrupted");
				break;
			}
		}
	}

	totals
}
