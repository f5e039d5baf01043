//! [`ScriptedRunner`], a fake process runner.
//!
//! Commands are matched by the prefix of their rendered form
//! (`"yarn add"` matches `yarn add --dev nightwatch`). The first matching
//! script decides the exit code, the output lines, and an optional effect
//! on the project directory. Unmatched commands succeed silently.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use devscaffold_presets::{CommandLine, Error, OutputLine, OutputStream, ProcessRunner, Result};
use serde_json::{Value, json};

type Effect = Box<dyn Fn(&CommandLine, &Path) + Send + Sync>;

struct Script {
    prefix: String,
    exit_code: i32,
    output: Vec<OutputLine>,
    effect: Option<Effect>,
}

/// Records every command it is asked to run and replays scripted results.
pub struct ScriptedRunner {
    root: PathBuf,
    scripts: Vec<Script>,
    missing_programs: HashSet<String>,
    recorded: Mutex<Vec<CommandLine>>,
}

impl ScriptedRunner {
    /// A runner whose effects apply to the project at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scripts: Vec::new(),
            missing_programs: HashSet::new(),
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Commands starting with `prefix` exit with `exit_code`.
    pub fn on(mut self, prefix: &str, exit_code: i32) -> Self {
        self.scripts.push(Script {
            prefix: prefix.to_string(),
            exit_code,
            output: Vec::new(),
            effect: None,
        });
        self
    }

    /// Commands starting with `prefix` succeed and apply `effect` to the project root.
    pub fn on_effect(
        mut self,
        prefix: &str,
        effect: impl Fn(&CommandLine, &Path) + Send + Sync + 'static,
    ) -> Self {
        self.scripts.push(Script {
            prefix: prefix.to_string(),
            exit_code: 0,
            output: Vec::new(),
            effect: Some(Box::new(effect)),
        });
        self
    }

    /// Attach output lines to the most recently added script.
    pub fn printing(mut self, lines: &[(OutputStream, &str)]) -> Self {
        if let Some(script) = self.scripts.last_mut() {
            script.output.extend(lines.iter().map(|(stream, text)| OutputLine {
                stream: *stream,
                text: text.to_string(),
            }));
        }
        self
    }

    /// Starting `program` fails as if it were not installed.
    pub fn without_program(mut self, program: &str) -> Self {
        self.missing_programs.insert(program.to_string());
        self
    }

    /// A runner that behaves like yarn and npm on a scratch project.
    ///
    /// `yarn init -p` creates `package.json` and `yarn.lock`; `yarn add`
    /// and `npm install` record their arguments as dev dependencies, npm
    /// also writing `package-lock.json`.
    pub fn node_toolchain(root: impl Into<PathBuf>) -> Self {
        Self::new(root)
            .on_effect("yarn init", |_, root| {
                let name = root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "scratch".to_string());
                write_manifest(root, &json!({ "name": name, "packageManager": "yarn@4.5.0" }));
                fs::write(root.join("yarn.lock"), "__metadata:\n  version: 8\n").unwrap();
            })
            .on_effect("yarn add", |command, root| add_dev_dependencies(command, root))
            .on_effect("npm install", |command, root| {
                add_dev_dependencies(command, root);
                fs::write(root.join("package-lock.json"), "{\"lockfileVersion\": 3}\n").unwrap();
            })
    }

    /// Rendered form of every command run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        command: &CommandLine,
        sink: &mut (dyn FnMut(OutputLine) + Send),
    ) -> Result<i32> {
        if self.missing_programs.contains(&command.program) {
            return Err(Error::CommandNotFound {
                command: command.to_string(),
            });
        }
        self.recorded.lock().unwrap().push(command.clone());

        let rendered = command.to_string();
        let Some(script) = self.scripts.iter().find(|s| rendered.starts_with(&s.prefix)) else {
            return Ok(0);
        };
        for line in &script.output {
            sink(line.clone());
        }
        if let Some(effect) = &script.effect {
            effect(command, &self.root);
        }
        Ok(script.exit_code)
    }
}

fn write_manifest(root: &Path, manifest: &Value) {
    let mut bytes = serde_json::to_vec_pretty(manifest).unwrap();
    bytes.push(b'\n');
    fs::write(root.join("package.json"), bytes).unwrap();
}

/// Record every non-flag argument of `command` as a dev dependency.
fn add_dev_dependencies(command: &CommandLine, root: &Path) {
    let path = root.join("package.json");
    let mut manifest: Value = fs::read(&path)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_else(|| json!({}));

    let fields = manifest.as_object_mut().unwrap();
    let deps = fields
        .entry("devDependencies")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .unwrap();
    for token in command.args.iter().filter(|a| !a.starts_with('-')).skip(1) {
        let (name, version) = split_token(token);
        deps.insert(name.to_string(), json!(version));
    }
    write_manifest(root, &manifest);
}

/// `@scope/pkg@range` → (`@scope/pkg`, `range`); bare names get `^1.0.0`.
fn split_token(token: &str) -> (&str, &str) {
    let search_from = usize::from(token.starts_with('@'));
    match token[search_from..].find('@') {
        Some(idx) => (&token[..search_from + idx], &token[search_from + idx + 1..]),
        None => (token, "^1.0.0"),
    }
}
