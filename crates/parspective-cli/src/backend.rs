//! Handing placement, allocation and routing to an external program.
//!
//! The program is run once per stage as `CMD <stage> <algorithm>`. It reads
//! a JSON [`ParRequest`] from stdin and writes the stage's result as JSON to
//! stdout: placements (`{"vertex": [x, y]}`), allocations
//! (`{"vertex": {"cores": [start, end]}}`) or routes (`{"net": tree}`).

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use parspective_core::{
    Allocations, Constraint, Machine, Net, Placements, Routes, VerticesResources,
};

use crate::plan::Stage;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Cannot run place-and-route command '{command}': {source}")]
    Spawn { command: String, source: io::Error },

    #[error("Place-and-route command is empty")]
    EmptyCommand,

    #[error("Cannot send netlist to '{command}': {source}")]
    Stdin { command: String, source: io::Error },

    #[error("'{command}' failed during {stage} ({status}): {stderr}")]
    Failed {
        command: String,
        stage: Stage,
        status: String,
        stderr: String,
    },

    #[error("'{command}' returned invalid {stage} results: {source}")]
    BadOutput {
        command: String,
        stage: Stage,
        source: serde_json::Error,
    },
}

/// Everything a stage may need to know. Earlier results are absent when the
/// stage does not use them.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParRequest<'a> {
    pub vertices_resources: &'a VerticesResources,
    pub nets: &'a [Net],
    pub machine: &'a Machine,
    pub constraints: &'a [Constraint],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placements: Option<&'a Placements>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocations: Option<&'a Allocations>,
    pub core_resource: &'a str,
}

pub trait ParBackend {
    fn place(&mut self, request: &ParRequest<'_>, algorithm: &str)
        -> Result<Placements, BackendError>;

    fn allocate(
        &mut self,
        request: &ParRequest<'_>,
        algorithm: &str,
    ) -> Result<Allocations, BackendError>;

    fn route(&mut self, request: &ParRequest<'_>, algorithm: &str) -> Result<Routes, BackendError>;
}

/// Runs an external command for every stage. The command line is split on
/// whitespace.
#[derive(Debug, Clone)]
pub struct ExternalBackend {
    command: String,
}

impl ExternalBackend {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    fn run<T: DeserializeOwned>(
        &self,
        stage: Stage,
        algorithm: &str,
        request: &ParRequest<'_>,
    ) -> Result<T, BackendError> {
        let mut words = self.command.split_whitespace();
        let program = words.next().ok_or(BackendError::EmptyCommand)?;
        let body = serde_json::to_vec(request).map_err(|e| BackendError::Stdin {
            command: self.command.clone(),
            source: io::Error::from(e),
        })?;
        info!("Running {stage} with '{algorithm}' via '{}'", self.command);

        let mut child = Command::new(program)
            .args(words)
            .arg(stage.as_str())
            .arg(algorithm)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BackendError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // The command may fill its output pipes before reading all its input.
        let writer = child
            .stdin
            .take()
            .map(|mut stdin| thread::spawn(move || stdin.write_all(&body)));

        let output = child.wait_with_output().map_err(|source| BackendError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        if let Some(writer) = writer {
            let sent = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            match sent {
                Ok(()) => {}
                // The exit status says more than the broken pipe would.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("'{}' closed stdin early", self.command);
                }
                Err(source) => {
                    return Err(BackendError::Stdin {
                        command: self.command.clone(),
                        source,
                    })
                }
            }
        }

        if !output.status.success() {
            return Err(BackendError::Failed {
                command: self.command.clone(),
                stage,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|source| BackendError::BadOutput {
            command: self.command.clone(),
            stage,
            source,
        })
    }
}

impl ParBackend for ExternalBackend {
    fn place(
        &mut self,
        request: &ParRequest<'_>,
        algorithm: &str,
    ) -> Result<Placements, BackendError> {
        self.run(Stage::Place, algorithm, request)
    }

    fn allocate(
        &mut self,
        request: &ParRequest<'_>,
        algorithm: &str,
    ) -> Result<Allocations, BackendError> {
        self.run(Stage::Allocate, algorithm, request)
    }

    fn route(&mut self, request: &ParRequest<'_>, algorithm: &str) -> Result<Routes, BackendError> {
        self.run(Stage::Route, algorithm, request)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use parspective_core::Link;

    /// Write an executable shell script and return its path.
    fn script(dir: &Path, body: &str) -> String {
        let path = dir.join("par");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    struct Inputs {
        vertices_resources: VerticesResources,
        nets: Vec<Net>,
        machine: Machine,
        constraints: Vec<Constraint>,
    }

    impl Inputs {
        fn new() -> Self {
            Self {
                vertices_resources: VerticesResources::from([(
                    "v".to_string(),
                    [("cores".to_string(), 1)].into(),
                )]),
                nets: vec![Net::new("v", &["v"])],
                machine: Machine::new(2, 2).unwrap(),
                constraints: vec![Constraint::reserve("cores", 0, 1)],
            }
        }

        /// Enough vertices that the request fills several pipe buffers.
        fn large(count: usize) -> Self {
            let mut inputs = Self::new();
            for i in 0..count {
                inputs
                    .vertices_resources
                    .insert(format!("vertex{i}"), [("cores".to_string(), 1)].into());
            }
            inputs
        }

        fn request(&self) -> ParRequest<'_> {
            ParRequest {
                vertices_resources: &self.vertices_resources,
                nets: &self.nets,
                machine: &self.machine,
                constraints: &self.constraints,
                placements: None,
                allocations: None,
                core_resource: "cores",
            }
        }
    }

    #[test]
    fn test_stage_results() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = Inputs::new();
        let command = script(
            dir.path(),
            r#"cat > /dev/null
case "$1" in
  place) echo '{"v": [1, 0]}' ;;
  allocate) echo '{"v": {"cores": [1, 2]}}' ;;
  route) echo '{"0": {"chip": [1, 0], "children": [{"route": "north", "vertex": "v"}]}}' ;;
esac"#,
        );
        let mut backend = ExternalBackend::new(&command);

        let placements = backend.place(&inputs.request(), "default").unwrap();
        assert_eq!(placements["v"], (1, 0));

        let allocations = backend.allocate(&inputs.request(), "greedy").unwrap();
        assert_eq!(allocations["v"]["cores"].start, 1);

        let routes = backend.route(&inputs.request(), "ner").unwrap();
        assert_eq!(routes[&0].children[0].route, parspective_core::Route::Link(Link::North));
    }

    #[test]
    fn test_request_and_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = Inputs::new();
        let seen = dir.path().join("seen.json");
        let args = dir.path().join("args.txt");
        let command = script(
            dir.path(),
            &format!(
                "cat > {}\necho \"$@\" > {}\necho '{{}}'",
                seen.display(),
                args.display()
            ),
        );
        let placements = ExternalBackend::new(&command)
            .place(&inputs.request(), "sa")
            .unwrap();
        assert!(placements.is_empty());

        assert_eq!(fs::read_to_string(&args).unwrap().trim(), "place sa");
        let request: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&seen).unwrap()).unwrap();
        assert_eq!(request["core_resource"], "cores");
        assert_eq!(request["machine"]["width"], 2);
        assert_eq!(request["nets"][0]["source"], "v");
        assert!(request.get("placements").is_none());
    }

    #[test]
    fn test_failure_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = Inputs::new();
        let command = script(dir.path(), "echo 'unknown placer' >&2\nexit 3");
        let err = ExternalBackend::new(&command)
            .place(&inputs.request(), "doesnotexist")
            .unwrap_err();
        match err {
            BackendError::Failed { stage, stderr, .. } => {
                assert_eq!(stage, Stage::Place);
                assert_eq!(stderr, "unknown placer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_output_written_before_input_read() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(
            dir.path(),
            "head -c 200000 /dev/zero | tr '\\0' x >&2\ncat > /dev/null\necho '{}'",
        );
        let inputs = Inputs::large(20_000);
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let result = ExternalBackend::new(&command).place(&inputs.request(), "default");
            let _ = tx.send(result.map(|p| p.len()));
        });
        let placed = rx
            .recv_timeout(std::time::Duration::from_secs(30))
            .expect("place-and-route command blocked");
        assert_eq!(placed.unwrap(), 0);
    }

    #[test]
    fn test_bad_output() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = Inputs::new();
        let command = script(dir.path(), "cat > /dev/null\necho 'not json'");
        let err = ExternalBackend::new(&command)
            .route(&inputs.request(), "default")
            .unwrap_err();
        assert!(matches!(err, BackendError::BadOutput { stage: Stage::Route, .. }));
    }

    #[test]
    fn test_missing_command() {
        let inputs = Inputs::new();
        let err = ExternalBackend::new("/no/such/par-command")
            .place(&inputs.request(), "default")
            .unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));

        let err = ExternalBackend::new("  ")
            .place(&inputs.request(), "default")
            .unwrap_err();
        assert!(matches!(err, BackendError::EmptyCommand));
    }
}
