use forloop_protocol::TargetInfo;
use forloop_runtime::{probe_all, select_target};
use serde::Serialize;

use super::Ctx;
use crate::error::Result;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PortReport {
	port: u16,
	reachable: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
	/// Target discovery would attach to on this port
	#[serde(skip_serializing_if = "Option::is_none")]
	selected: Option<String>,
	targets: Vec<TargetInfo>,
}

pub async fn execute(ctx: &Ctx) -> Result<()> {
	let options = ctx.config.discovery_options();
	let probes = probe_all(&options).await.map_err(forloop::AutomationError::from)?;

	let reports: Vec<PortReport> = probes
		.into_iter()
		.map(|probe| match probe.targets {
			Ok(targets) => PortReport {
				port: probe.port,
				reachable: true,
				error: None,
				selected: select_target(&targets, &options).map(|t| t.id.clone()),
				targets,
			},
			Err(e) => PortReport {
				port: probe.port,
				reachable: false,
				error: Some(e.to_string()),
				selected: None,
				targets: Vec::new(),
			},
		})
		.collect();

	ctx.emit("targets", reports, |reports| {
		let mut lines = Vec::new();
		for report in reports {
			if !report.reachable {
				lines.push(format!("{}  unreachable", report.port));
				continue;
			}
			lines.push(format!("{}  {} target(s)", report.port, report.targets.len()));
			for target in &report.targets {
				let marker = if report.selected.as_deref() == Some(target.id.as_str()) {
					"*"
				} else {
					" "
				};
				lines.push(format!("  {marker} {:<14} {}  {}", target.target_type, target.title, target.url));
			}
		}
		lines.join("\n")
	});
	Ok(())
}
