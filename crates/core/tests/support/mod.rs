//! A scripted stand-in for the IDE: a `/json/list` endpoint plus a DevTools
//! socket whose `Runtime.evaluate` handler simulates the page helper.

#![allow(dead_code)]

use std::sync::Arc;

use forloop::classify::{ButtonClass, ButtonFacts, classify};
use forloop::helper::MISSING_SENTINEL;
use forloop::Config;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Simulated page state behind the helper.
#[derive(Debug, Default)]
pub struct Page {
	pub installed: bool,
	pub installs: usize,
	pub has_editor: bool,
	pub editor_text: String,
	pub submits: usize,
	pub buttons: Vec<FakeButton>,
	/// Every evaluation throws
	pub throw: Option<String>,
	/// Evaluations go unanswered
	pub stall: bool,
	/// Last prompt argument as received on the wire
	pub last_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FakeButton {
	pub facts: ButtonFacts,
	/// `click()` throws, as if the element detached
	pub detached: bool,
	pub clicks: usize,
}

impl FakeButton {
	pub fn new(text: &str, visible: bool, disabled: bool) -> Self {
		Self {
			facts: ButtonFacts::new(text, visible, disabled),
			detached: false,
			clicks: 0,
		}
	}

	pub fn detached(mut self) -> Self {
		self.detached = true;
		self
	}
}

pub struct FakeIde {
	pub server: MockServer,
	pub page: Arc<Mutex<Page>>,
	kill: Arc<watch::Sender<u64>>,
}

impl FakeIde {
	pub async fn start() -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let ws_port = listener.local_addr().unwrap().port();

		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/json/list"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!([
				{
					"id": "shared",
					"type": "page",
					"title": "Shared Process",
					"url": "vscode-file://vscode-app/shared.html",
					"webSocketDebuggerUrl": format!("ws://127.0.0.1:{ws_port}/devtools/page/shared")
				},
				{
					"id": "main",
					"type": "page",
					"title": "demo - Antigravity",
					"url": "vscode-file://vscode-app/workbench/workbench.html",
					"webSocketDebuggerUrl": format!("ws://127.0.0.1:{ws_port}/devtools/page/main")
				}
			])))
			.mount(&server)
			.await;

		let page = Arc::new(Mutex::new(Page {
			has_editor: true,
			..Default::default()
		}));
		let kill = Arc::new(watch::channel(0u64).0);

		let accept_page = Arc::clone(&page);
		let accept_kill = Arc::clone(&kill);
		tokio::spawn(async move {
			while let Ok((stream, _)) = listener.accept().await {
				let page = Arc::clone(&accept_page);
				let kill = accept_kill.subscribe();
				tokio::spawn(serve_socket(stream, page, kill));
			}
		});

		Self { server, page, kill }
	}

	pub fn port(&self) -> u16 {
		self.server.address().port()
	}

	pub fn config(&self) -> Config {
		Config {
			port_start: self.port(),
			port_end: self.port(),
			probe_timeout_ms: 500,
			command_timeout_ms: 2_000,
			submit_settle_ms: 0,
			..Default::default()
		}
	}

	/// Closes every open DevTools socket from the IDE side.
	pub fn drop_sockets(&self) {
		self.kill.send_modify(|n| *n += 1);
	}

	/// Simulates a reload: the helper global disappears.
	pub fn reload(&self) {
		self.page.lock().installed = false;
	}
}

async fn serve_socket(
	stream: tokio::net::TcpStream,
	page: Arc<Mutex<Page>>,
	mut kill: watch::Receiver<u64>,
) {
	let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
		return;
	};
	let (mut sink, mut source) = ws.split();

	loop {
		tokio::select! {
			_ = kill.changed() => {
				let _ = sink.send(Message::Close(None)).await;
				return;
			}
			frame = source.next() => {
				let text = match frame {
					Some(Ok(Message::Text(text))) => text,
					Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
					Some(Ok(_)) => continue,
				};
				let request: Value = serde_json::from_str(&text).unwrap();
				let id = request["id"].as_u64().unwrap();
				let expression = request["params"]["expression"].as_str().unwrap_or_default();

				if let Some(result) = evaluate(&page, expression) {
					let reply = json!({"id": id, "result": result});
					if sink.send(Message::Text(reply.to_string())).await.is_err() {
						return;
					}
				}
			}
		}
	}
}

fn by_value(value: Value) -> Value {
	let kind = match &value {
		Value::Bool(_) => "boolean",
		Value::String(_) => "string",
		Value::Number(_) => "number",
		_ => "object",
	};
	json!({"result": {"type": kind, "value": value}})
}

/// Answers one `Runtime.evaluate`, or `None` to leave it unanswered.
fn evaluate(page: &Mutex<Page>, expression: &str) -> Option<Value> {
	let mut page = page.lock();

	if page.stall {
		return None;
	}
	if let Some(message) = &page.throw {
		return Some(json!({
			"result": {"type": "object", "subtype": "error", "description": message},
			"exceptionDetails": {
				"exceptionId": 1,
				"text": "Uncaught",
				"lineNumber": 0,
				"columnNumber": 0,
				"exception": {"type": "object", "subtype": "error", "description": message}
			}
		}));
	}

	if expression.contains("const NS =") {
		page.installed = true;
		page.installs += 1;
		return Some(by_value(json!(true)));
	}
	if expression.contains("return !!ns && ns.version") {
		return Some(by_value(json!(page.installed)));
	}

	let Some((function, args)) = parse_call(expression) else {
		return Some(json!({"result": {"type": "undefined"}}));
	};
	if !page.installed {
		return Some(by_value(json!(MISSING_SENTINEL)));
	}

	let value = match function.as_str() {
		"tryInjectPrompt" => {
			let text = args.first().and_then(Value::as_str).unwrap_or_default().to_string();
			page.last_prompt = Some(text.clone());
			if page.has_editor {
				page.editor_text = text;
				json!({"success": true, "error": null})
			} else {
				json!({"success": false, "error": "chat input not found"})
			}
		}
		"trySubmitPrompt" => {
			let has_send = page
				.buttons
				.iter()
				.any(|b| classify(&b.facts) == ButtonClass::Submit);
			if page.has_editor && has_send {
				page.submits += 1;
				page.editor_text.clear();
				json!({"success": true, "error": null})
			} else {
				json!({"success": false, "error": "submit button not found"})
			}
		}
		"clickAcceptButtons" => {
			let mut found = 0;
			let mut clicked = 0;
			for button in page.buttons.iter_mut() {
				if classify(&button.facts) != ButtonClass::Accept {
					continue;
				}
				found += 1;
				if !button.detached {
					button.clicks += 1;
					clicked += 1;
				}
			}
			json!({"found": found, "clicked": clicked})
		}
		"scanButtons" => Value::Array(
			page.buttons
				.iter()
				.map(|b| {
					json!({
						"text": forloop::classify::normalize(&b.facts.text),
						"visible": b.facts.visible,
						"disabled": b.facts.disabled,
						"class": classify(&b.facts),
						"scope": "panel"
					})
				})
				.collect(),
		),
		"describeChatInput" => {
			if page.has_editor {
				json!({
					"found": true,
					"tagName": "DIV",
					"isLexical": true,
					"hasIframeDoc": true,
					"text": page.editor_text
				})
			} else {
				json!({"found": false, "tagName": null, "isLexical": false, "hasIframeDoc": false, "text": null})
			}
		}
		"describeSubmitButton" => {
			match page.buttons.iter().find(|b| classify(&b.facts) == ButtonClass::Submit) {
				Some(button) => json!({
					"found": true,
					"text": button.facts.text,
					"disabled": false,
					"tagName": "BUTTON"
				}),
				None => json!({"found": false, "text": null, "disabled": false, "tagName": null}),
			}
		}
		_ => return Some(json!({"result": {"type": "undefined"}})),
	};
	Some(by_value(value))
}

/// Pulls `fn` and its JSON arguments out of `ns["fn"](args)`.
fn parse_call(expression: &str) -> Option<(String, Vec<Value>)> {
	let marker = "return ns[\"";
	let start = expression.find(marker)? + marker.len();
	let rest = &expression[start..];
	let name_end = rest.find("\"](")?;
	let function = rest[..name_end].to_string();
	let args_start = name_end + 3;
	let args_end = rest.rfind("); })()")?;
	let args: Vec<Value> = serde_json::from_str(&format!("[{}]", &rest[args_start..args_end])).ok()?;
	Some((function, args))
}
