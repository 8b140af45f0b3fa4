//! The injected helper running in headless Chromium.
//!
//! Each test launches its own browser with a throwaway profile, renders a
//! small panel-shaped DOM into `about:blank`, and drives it through
//! [`CdpManager`] and [`Automation`]. The browser comes from `FORLOOP_CHROME`
//! or the usual names on `PATH`; without one the tests log and return.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use forloop::classify::normalize;
use forloop::helper::HELPER_VERSION;
use forloop::{AcceptSummary, Automation, ButtonFacts, CdpManager, Config, classify};
use serde_json::{Value, json};
use tempfile::TempDir;

const BROWSER_NAMES: &[&str] = &[
	"chromium",
	"chromium-browser",
	"google-chrome",
	"google-chrome-stable",
	"chrome",
];

const EDITOR: &str = r#"<div contenteditable="true" data-lexical-editor="true"></div>"#;

fn browser_binary() -> Option<PathBuf> {
	if let Some(path) = std::env::var_os("FORLOOP_CHROME") {
		return Some(PathBuf::from(path));
	}
	BROWSER_NAMES.iter().find_map(|name| which::which(name).ok())
}

fn free_port() -> u16 {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	listener.local_addr().unwrap().port()
}

struct Browser {
	child: Child,
	port: u16,
	_profile: TempDir,
}

impl Browser {
	fn launch() -> Option<Self> {
		let Some(binary) = browser_binary() else {
			eprintln!("skipping: no Chromium found (set FORLOOP_CHROME)");
			return None;
		};
		let port = free_port();
		let profile = tempfile::tempdir().unwrap();
		let child = Command::new(&binary)
			.args([
				"--headless=new",
				"--no-sandbox",
				"--disable-gpu",
				"--no-first-run",
				"--no-default-browser-check",
			])
			.arg(format!("--remote-debugging-port={port}"))
			.arg(format!("--user-data-dir={}", profile.path().display()))
			.arg("about:blank")
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()
			.unwrap_or_else(|e| panic!("failed to launch {}: {e}", binary.display()));

		Some(Self {
			child,
			port,
			_profile: profile,
		})
	}

	fn config(&self) -> Config {
		Config {
			port_start: self.port,
			port_end: self.port,
			title_hint: None,
			url_markers: Vec::new(),
			command_timeout_ms: 5000,
			submit_settle_ms: 0,
			..Config::default()
		}
	}

	/// Connects once the debugging port answers.
	async fn connect(&self) -> Automation {
		let manager = Arc::new(CdpManager::new(self.config()));
		for _ in 0..100 {
			if manager.try_connect().await {
				return Automation::new(manager);
			}
			tokio::time::sleep(Duration::from_millis(100)).await;
		}
		panic!("browser on port {} never became reachable", self.port);
	}
}

impl Drop for Browser {
	fn drop(&mut self) {
		let _ = self.child.kill();
		let _ = self.child.wait();
	}
}

fn ns() -> String {
	format!("window[{}]", json!(Config::default().namespace))
}

async fn eval(automation: &Automation, expression: &str) -> Value {
	automation
		.manager()
		.evaluate(expression)
		.await
		.unwrap()
		.unwrap_or(Value::Null)
}

/// Replaces the page body with `top`, plus the agent panel iframe holding
/// `panel` when given.
async fn render(automation: &Automation, top: &str, panel: Option<&str>) {
	let script = format!(
		r#"(() => {{
			document.body.innerHTML = {top};
			const panel = {panel};
			if (panel !== null) {{
				const frame = document.createElement('iframe');
				frame.id = {id};
				frame.style.width = '640px';
				frame.style.height = '400px';
				document.body.appendChild(frame);
				frame.contentDocument.body.innerHTML = panel;
			}}
			return true;
		}})()"#,
		top = json!(top),
		panel = json!(panel),
		id = json!(Config::default().panel_iframe_id),
	);
	assert_eq!(eval(automation, &script).await, json!(true));
}

#[tokio::test]
async fn page_classifier_agrees_with_host() {
	let Some(browser) = Browser::launch() else { return };
	let automation = browser.connect().await;

	let labels = [
		"Accept",
		"  ACCEPT  ",
		"Accept all",
		"Accept\n  changes",
		"Apply",
		"Keep (Ctrl+Enter)",
		"Allow once",
		"Approve",
		"Confirm",
		"Cancel",
		"Reject all",
		"Accept or cancel",
		"Apply & stop",
		"Keep discarding",
		"Accept (cancels others)",
		"Cancelled",
		"Keeping",
		"Accepted",
		"Auto-accept",
		"Submit",
		"Send message",
		"Sender",
		"",
		"Run",
		"Öffnen",
	];
	let mut cases = Vec::new();
	for label in labels {
		for (visible, disabled) in [(true, false), (false, false), (true, true)] {
			cases.push((label, visible, disabled));
		}
	}

	let expression = format!(
		"({}).map(([text, visible, disabled]) => {}.classify(text, visible, disabled))",
		json!(cases),
		ns()
	);
	let page: Vec<String> = serde_json::from_value(eval(&automation, &expression).await).unwrap();

	assert_eq!(page.len(), cases.len());
	for ((text, visible, disabled), page_class) in cases.iter().zip(&page) {
		let host = classify(&ButtonFacts::new(*text, *visible, *disabled));
		assert_eq!(page_class, host.as_str(), "{text:?} visible={visible} disabled={disabled}");
	}
}

#[tokio::test]
async fn is_accept_button_reads_rendered_state() {
	let Some(browser) = Browser::launch() else { return };
	let automation = browser.connect().await;

	render(
		&automation,
		r#"
		<button>Accept</button>
		<button>Cancel</button>
		<button disabled>Accept</button>
		<button style="display:none">Accept</button>
		<button style="visibility:hidden">Accept</button>
		<button style="width:0;height:0;padding:0;border:0;overflow:hidden">Accept</button>
		<div role="button" aria-disabled="true">Accept</div>
		<button>Keep discarding</button>
		<button aria-label="Approve"></button>
		"#,
		None,
	)
	.await;

	let expression = format!(
		r#"Array.from(document.querySelectorAll('button, [role="button"]')).map((el) => {}.isAcceptButton(el))"#,
		ns()
	);
	assert_eq!(
		eval(&automation, &expression).await,
		json!([true, false, false, false, false, false, false, false, true])
	);
}

#[tokio::test]
async fn click_accept_buttons_survives_failing_click() {
	let Some(browser) = Browser::launch() else { return };
	let automation = browser.connect().await;

	render(&automation, "<p>nothing to accept</p>", None).await;
	assert_eq!(
		automation.click_accept_buttons().await.unwrap(),
		AcceptSummary { found: 0, clicked: 0 }
	);

	render(
		&automation,
		r#"
		<button onclick="window.clicks = (window.clicks || 0) + 1">Accept</button>
		<button id="detached">Apply</button>
		<button onclick="window.cancelled = true">Cancel</button>
		"#,
		Some(r#"<button onclick="parent.clicks = (parent.clicks || 0) + 1">Keep</button>"#),
	)
	.await;
	eval(
		&automation,
		"document.getElementById('detached').click = () => { throw new Error('node is detached'); }; true",
	)
	.await;

	let summary = automation.click_accept_buttons().await.unwrap();
	assert_eq!(summary, AcceptSummary { found: 3, clicked: 2 });
	assert_eq!(eval(&automation, "window.clicks").await, json!(2));
	assert_eq!(eval(&automation, "window.cancelled === true").await, json!(false));
}

#[tokio::test]
async fn inject_prompt_replaces_editor_content() {
	let Some(browser) = Browser::launch() else { return };
	let automation = browser.connect().await;

	let panel = format!(r#"<form>{EDITOR}<button type="button">Send</button></form>"#);
	render(&automation, "", Some(&panel)).await;

	let prompt = "Test with `backticks` and $dollars and \"quotes\"";
	let outcome = automation.inject_prompt(prompt).await;
	assert!(outcome.success, "{outcome:?}");
	let input = automation.find_chat_input().await.unwrap();
	assert!(input.found && input.is_lexical && input.has_iframe_doc);
	assert_eq!(normalize(input.text.as_deref().unwrap_or_default()), normalize(prompt));

	// selectAll + delete clears the previous prompt
	assert!(automation.inject_prompt("second").await.success);
	let input = automation.find_chat_input().await.unwrap();
	assert_eq!(normalize(input.text.as_deref().unwrap_or_default()), "second");

	assert!(automation.inject_prompt("line one\nline two").await.success);
}

#[tokio::test]
async fn inject_prompt_reports_why_it_failed() {
	let Some(browser) = Browser::launch() else { return };
	let automation = browser.connect().await;

	render(&automation, "", Some("<p>loading</p>")).await;
	let outcome = automation.inject_prompt("hello").await;
	assert_eq!(outcome.error.as_deref(), Some("chat input not found"));

	render(&automation, "", None).await;
	let outcome = automation.inject_prompt("hello").await;
	assert_eq!(outcome.error.as_deref(), Some("chat input not found"));

	// Found, but read-only: nothing lands in the editor.
	render(
		&automation,
		"",
		Some(r#"<div contenteditable="false" data-lexical-editor="true"></div>"#),
	)
	.await;
	let outcome = automation.inject_prompt("hello").await;
	assert!(!outcome.success);
	assert_eq!(outcome.error.as_deref(), Some("editor did not accept the injected text"));

	// An editor that eats spaces does not count as holding "a b".
	render(
		&automation,
		"",
		Some(
			r#"<div contenteditable="true" data-lexical-editor="true" oninput="this.textContent = this.textContent.replace(/\s/g, '')"></div>"#,
		),
	)
	.await;
	let outcome = automation.inject_prompt("a b").await;
	assert_eq!(outcome.error.as_deref(), Some("editor did not accept the injected text"));
}

#[tokio::test]
async fn submit_button_fallbacks() {
	let Some(browser) = Browser::launch() else { return };
	let automation = browser.connect().await;

	// Labeled send button wins over other buttons in the form.
	let panel = format!(
		r#"<form>{EDITOR}<button type="button" title="Attach">+</button><button type="button" onclick="parent.sent = (parent.sent || 0) + 1">Send</button></form>"#
	);
	render(&automation, "", Some(&panel)).await;
	let button = automation.find_submit_button().await.unwrap();
	assert_eq!(button.text.as_deref(), Some("Send"));
	assert!(automation.submit_prompt().await.success);
	assert_eq!(eval(&automation, "window.sent").await, json!(1));

	// Then `type=submit`.
	let panel = format!(r#"<form>{EDITOR}<button type="submit">Go</button><button type="button">Other</button></form>"#);
	render(&automation, "", Some(&panel)).await;
	let button = automation.find_submit_button().await.unwrap();
	assert_eq!(button.text.as_deref(), Some("Go"));

	// Then the last usable button next to the editor.
	let panel = format!(
		r#"<div>{EDITOR}<button type="button" title="More">...</button><button type="button" aria-label="icon"></button></div>"#
	);
	render(&automation, "", Some(&panel)).await;
	let button = automation.find_submit_button().await.unwrap();
	assert!(button.found);
	assert_eq!(button.text.as_deref(), Some("icon"));

	// A disabled send button is never picked.
	let panel = format!(r#"<form>{EDITOR}<button type="button" disabled>Send</button></form>"#);
	render(&automation, "", Some(&panel)).await;
	assert!(!automation.find_submit_button().await.unwrap().found);
	let outcome = automation.submit_prompt().await;
	assert_eq!(outcome.error.as_deref(), Some("submit button not found"));
}

#[tokio::test]
async fn installer_is_idempotent_per_version() {
	let Some(browser) = Browser::launch() else { return };
	let automation = browser.connect().await;
	let manager = automation.manager();
	let ns = ns();

	assert_eq!(eval(&automation, &format!("{ns}.version")).await, json!(HELPER_VERSION));

	eval(&automation, &format!("{ns}.marker = 'kept'; true")).await;
	manager.install_helper().await.unwrap();
	assert_eq!(eval(&automation, &format!("{ns}.marker")).await, json!("kept"));

	// A different version stamp is replaced wholesale.
	eval(&automation, &format!("{ns}.version = 'stale'; true")).await;
	manager.install_helper().await.unwrap();
	assert_eq!(eval(&automation, &format!("{ns}.marker === undefined")).await, json!(true));
	assert_eq!(eval(&automation, &format!("{ns}.version")).await, json!(HELPER_VERSION));

	// A reload wipes the namespace; the next call reinstalls it.
	manager.send_command("Page.reload", json!({})).await.unwrap();
	for _ in 0..50 {
		tokio::time::sleep(Duration::from_millis(100)).await;
		if let Ok(Some(state)) = manager.evaluate("document.readyState").await {
			if state == "complete" {
				break;
			}
		}
	}
	assert!(!automation.helper_installed().await.unwrap());
	render(&automation, "<button>Accept</button>", None).await;
	let buttons = automation.scan_buttons().await.unwrap();
	assert_eq!(buttons.len(), 1);
	assert!(automation.helper_installed().await.unwrap());
}
