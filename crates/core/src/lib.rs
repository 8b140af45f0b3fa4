//! forloop: drive the Antigravity agent panel over the DevTools protocol
//!
//! The agent panel lives in a sandboxed iframe that extension APIs cannot
//! reach. This crate attaches to the IDE's remote debugging endpoint instead,
//! installs a small helper script in the workbench page, and calls it to fill
//! the chat editor, press send, and click accept buttons.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use forloop::{Automation, CdpManager, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = Arc::new(CdpManager::new(Config::default()));
//!     if !manager.try_connect().await {
//!         eprintln!("start Antigravity with --remote-debugging-port=9000");
//!         return Ok(());
//!     }
//!
//!     let automation = Automation::new(Arc::clone(&manager));
//!     let outcome = automation.send_prompt("Fix the failing tests").await;
//!     println!("sent: {}", outcome.success);
//!
//!     let summary = automation.click_accept_buttons().await?;
//!     println!("accepted {}/{}", summary.clicked, summary.found);
//!
//!     manager.dispose();
//!     Ok(())
//! }
//! ```

pub mod automation;
pub mod classify;
pub mod config;
pub mod error;
pub mod helper;
pub mod manager;

pub use automation::{
	AcceptSummary, Automation, ChatInputInfo, PromptOutcome, ScannedButton, SubmitButtonInfo,
};
pub use classify::{ButtonClass, ButtonFacts, classify};
pub use config::{CONFIG_FILE_NAME, Config};
pub use error::{AutomationError, Result};
pub use helper::{HelperConfig, installer_script};
pub use manager::{CdpManager, ConnectionState, SocketInfo};
