//! Test command detection for a workspace
//!
//! Looks for marker files in a single directory (no recursion) and picks the
//! test command of the highest-priority match. Ties go to the rule listed
//! first.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The script `npm init` writes when no tests exist.
pub const NPM_PLACEHOLDER_TEST: &str = r#"echo "Error: no test specified" && exit 1"#;

/// A detected test command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedCommand {
	/// Shell command to run
	pub cmd: String,
	/// Tool family (`npm`, `cargo`, ...)
	pub kind: String,
	/// Language or ecosystem label
	pub lang: String,
	pub priority: u8,
}

struct Rule {
	cmd: &'static str,
	kind: &'static str,
	lang: &'static str,
	priority: u8,
	applies: fn(&Path) -> bool,
}

const RULES: &[Rule] = &[
	Rule {
		cmd: "npm test",
		kind: "npm",
		lang: "JavaScript/TypeScript",
		priority: 10,
		applies: has_npm_test_script,
	},
	Rule {
		cmd: "deno test",
		kind: "deno",
		lang: "Deno",
		priority: 10,
		applies: |dir| exists(dir, "deno.json") || exists(dir, "deno.jsonc"),
	},
	Rule {
		cmd: "pytest",
		kind: "pytest",
		lang: "Python",
		priority: 10,
		applies: |dir| is_python(dir) && (exists(dir, "pytest.ini") || exists(dir, "pyproject.toml")),
	},
	Rule {
		cmd: "python -m pytest",
		kind: "python",
		lang: "Python",
		priority: 8,
		applies: |dir| is_python(dir) && !exists(dir, "pytest.ini") && !exists(dir, "pyproject.toml"),
	},
	Rule {
		cmd: "cargo test",
		kind: "cargo",
		lang: "Rust",
		priority: 10,
		applies: |dir| exists(dir, "Cargo.toml"),
	},
	Rule {
		cmd: "go test ./...",
		kind: "go",
		lang: "Go",
		priority: 10,
		applies: |dir| exists(dir, "go.mod"),
	},
	Rule {
		cmd: "mvn test",
		kind: "maven",
		lang: "Java/Kotlin",
		priority: 10,
		applies: |dir| exists(dir, "pom.xml"),
	},
	Rule {
		cmd: "./gradlew test",
		kind: "gradle",
		lang: "Java/Kotlin",
		priority: 10,
		applies: |dir| exists(dir, "build.gradle") || exists(dir, "build.gradle.kts"),
	},
	Rule {
		cmd: "dotnet test",
		kind: "dotnet",
		lang: ".NET",
		priority: 10,
		applies: |dir| has_extension(dir, &["csproj", "sln"]),
	},
	Rule {
		cmd: "make test",
		kind: "make",
		lang: "Make",
		priority: 6,
		applies: |dir| exists(dir, "Makefile"),
	},
];

fn exists(dir: &Path, name: &str) -> bool {
	dir.join(name).exists()
}

fn is_python(dir: &Path) -> bool {
	["pyproject.toml", "setup.py", "requirements.txt"]
		.iter()
		.any(|name| exists(dir, name))
}

fn has_extension(dir: &Path, extensions: &[&str]) -> bool {
	let Ok(entries) = fs::read_dir(dir) else {
		return false;
	};
	entries.flatten().any(|entry| {
		entry
			.path()
			.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| extensions.contains(&ext))
	})
}

/// A `package.json` with a non-empty `scripts.test` other than the npm
/// placeholder. Unreadable or malformed files count as absent.
fn has_npm_test_script(dir: &Path) -> bool {
	let path = dir.join("package.json");
	let Ok(raw) = fs::read_to_string(&path) else {
		return false;
	};
	let manifest: serde_json::Value = match serde_json::from_str(&raw) {
		Ok(manifest) => manifest,
		Err(e) => {
			debug!(path = %path.display(), error = %e, "ignoring malformed package.json");
			return false;
		}
	};
	manifest["scripts"]["test"]
		.as_str()
		.is_some_and(|script| !script.is_empty() && script != NPM_PLACEHOLDER_TEST)
}

/// Infers the test command for `dir`, or `None` when no marker matches.
pub fn detect_test_command(dir: &Path) -> Option<DetectedCommand> {
	let mut best: Option<&Rule> = None;
	for rule in RULES {
		if !(rule.applies)(dir) {
			continue;
		}
		debug!(dir = %dir.display(), cmd = rule.cmd, priority = rule.priority, "test command candidate");
		if best.is_none_or(|b| rule.priority > b.priority) {
			best = Some(rule);
		}
	}

	best.map(|rule| DetectedCommand {
		cmd: rule.cmd.to_string(),
		kind: rule.kind.to_string(),
		lang: rule.lang.to_string(),
		priority: rule.priority,
	})
}
