//! Shared test utilities for amd-split tests
//!
//! Two stand-ins for the external bundler live here: `ScriptedBundler`, which
//! replays a fixed outcome per target and records call order, and
//! `GraphBundler`, which traces a small dependency graph the way r.js does.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use amd_split::{BundleRequest, BundleStream, FileArtifact, ModuleBundler, WriteRecorder};
use amd_split_config::SplitConfig;
use futures::StreamExt;
use futures::stream;
use parking_lot::Mutex;
use serde_json::Value;

/// Outcome of one scripted build.
#[derive(Debug, Clone)]
pub enum Script {
    Write {
        modules: Vec<String>,
        content: String,
        delay: Option<Duration>,
    },
    Fail {
        message: String,
        delay: Option<Duration>,
    },
    /// The stream ends without producing a file.
    Empty,
    /// The stream never produces anything.
    Hang,
}

impl Script {
    pub fn write(modules: &[&str], content: &str) -> Self {
        Script::Write {
            modules: modules.iter().map(|m| m.to_string()).collect(),
            content: content.to_string(),
            delay: None,
        }
    }

    pub fn fail(message: &str) -> Self {
        Script::Fail {
            message: message.to_string(),
            delay: None,
        }
    }

    pub fn after(self, delay: Duration) -> Self {
        match self {
            Script::Write {
                modules, content, ..
            } => Script::Write {
                modules,
                content,
                delay: Some(delay),
            },
            Script::Fail { message, .. } => Script::Fail {
                message,
                delay: Some(delay),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Invoked(String),
    Emitted(String),
    Failed(String),
}

/// Bundler double keyed by logical target name.
#[derive(Default)]
pub struct ScriptedBundler {
    scripts: HashMap<String, Script>,
    events: Arc<Mutex<Vec<Event>>>,
    requests: Mutex<Vec<BundleRequest>>,
}

impl ScriptedBundler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, target: &str, script: Script) -> Self {
        self.scripts.insert(target.to_string(), script);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn requests(&self) -> Vec<BundleRequest> {
        self.requests.lock().clone()
    }

    pub fn request_for(&self, target: &str) -> Option<BundleRequest> {
        self.requests
            .lock()
            .iter()
            .find(|r| r.target == target)
            .cloned()
    }

    pub fn invoked(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Invoked(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    /// Index of the first event matching `event`.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

impl ModuleBundler for ScriptedBundler {
    fn bundle(&self, request: BundleRequest, recorder: WriteRecorder) -> BundleStream {
        let target = request.target.clone();
        self.events.lock().push(Event::Invoked(target.clone()));
        self.requests.lock().push(request.clone());

        let path = request.out.clone().unwrap_or_else(|| "main.js".to_string());
        let events = Arc::clone(&self.events);
        let script = self
            .scripts
            .get(&target)
            .cloned()
            .unwrap_or_else(|| Script::write(&[], ""));

        match script {
            Script::Write {
                modules,
                content,
                delay,
            } => stream::once(async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                for module in modules {
                    recorder.record(module);
                }
                events.lock().push(Event::Emitted(target));
                Ok(FileArtifact::new(path, content))
            })
            .boxed(),
            Script::Fail { message, delay } => stream::once(async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                events.lock().push(Event::Failed(target));
                Err(message.into())
            })
            .boxed(),
            Script::Empty => stream::empty().boxed(),
            Script::Hang => stream::pending().boxed(),
        }
    }
}

/// Bundler double that traces a dependency graph.
///
/// Roots are the `name` option plus the `include` list. Dependencies are
/// written before their dependents. `excludeShallow` modules are not written
/// but their dependencies are still traced.
#[derive(Default)]
pub struct GraphBundler {
    graph: HashMap<String, Vec<String>>,
    requests: Mutex<Vec<BundleRequest>>,
}

impl GraphBundler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module(mut self, id: &str, deps: &[&str]) -> Self {
        self.graph
            .insert(id.to_string(), deps.iter().map(|d| d.to_string()).collect());
        self
    }

    pub fn requests(&self) -> Vec<BundleRequest> {
        self.requests.lock().clone()
    }

    pub fn trace(&self, roots: &[String], excluded: &HashSet<String>) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut written = Vec::new();
        for root in roots {
            self.visit(root, excluded, &mut visited, &mut written);
        }
        written
    }

    fn visit(
        &self,
        id: &str,
        excluded: &HashSet<String>,
        visited: &mut HashSet<String>,
        written: &mut Vec<String>,
    ) {
        if !visited.insert(id.to_string()) {
            return;
        }
        for dep in self.graph.get(id).into_iter().flatten() {
            self.visit(dep, excluded, visited, written);
        }
        if !excluded.contains(id) {
            written.push(id.to_string());
        }
    }
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

impl ModuleBundler for GraphBundler {
    fn bundle(&self, request: BundleRequest, recorder: WriteRecorder) -> BundleStream {
        self.requests.lock().push(request.clone());
        let config = request.to_resolver_config();

        let mut roots: Vec<String> = config["name"].as_str().map(str::to_string).into_iter().collect();
        roots.extend(strings(&config["include"]));
        let excluded: HashSet<String> = strings(&config["excludeShallow"]).into_iter().collect();

        let written = self.trace(&roots, &excluded);
        let content: String = written
            .iter()
            .map(|id| format!("define('{id}', function () {{}});\n"))
            .collect();
        for id in written {
            recorder.record(id);
        }

        let path = config["out"].as_str().unwrap_or("main.js").to_string();
        stream::once(futures::future::ready(Ok(FileArtifact::new(path, content)))).boxed()
    }
}

pub fn config(value: Value) -> SplitConfig {
    SplitConfig::from_value(value).expect("valid config")
}

pub fn module_names(ids: &[amd_split::ModuleId]) -> Vec<&str> {
    ids.iter().map(|id| id.as_str()).collect()
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// A subscriber writing INFO and above into this capture, without ANSI colors.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .with_writer(move || sink.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
