use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::runtime::Runtime;

use seqc_core::model::{MultilineText, Output};
use seqc_core::{CellFailure, CellReply, Kernel, KernelError};

const DRIVER: &str = include_str!("../python/kernel.py");

/// Cuánto esperamos a que el intérprete termine tras cerrar stdin.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Cómo lanzar el intérprete.
#[derive(Debug, Clone)]
pub struct KernelSpec {
    /// Ejecutable de Python (`python3` por defecto).
    pub program: String,
    /// Directorio de trabajo del intérprete; los paths relativos de las
    /// celdas se resuelven aquí.
    pub working_dir: PathBuf,
}

impl KernelSpec {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self { program: program.into(),
               working_dir: working_dir.into() }
    }
}

#[derive(Serialize)]
struct KernelRequest<'a> {
    cell: usize,
    source: &'a str,
}

#[derive(Debug, Deserialize)]
struct KernelResponse {
    cell: Option<usize>,
    status: String,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    ename: Option<String>,
    #[serde(default)]
    evalue: Option<String>,
    #[serde(default)]
    traceback: Vec<String>,
}

impl KernelResponse {
    fn into_reply(self) -> Result<CellReply, KernelError> {
        let mut outputs = Vec::new();
        if !self.stdout.is_empty() {
            outputs.push(Output::Stream { name: "stdout".into(),
                                          text: MultilineText::new(self.stdout) });
        }
        if !self.stderr.is_empty() {
            outputs.push(Output::Stream { name: "stderr".into(),
                                          text: MultilineText::new(self.stderr) });
        }
        if let Some(result) = self.result {
            let mut data = Map::new();
            data.insert("text/plain".into(), json!(result));
            outputs.push(Output::ExecuteResult { execution_count: None,
                                                 data,
                                                 metadata: Map::new() });
        }
        let failure = match self.status.as_str() {
            "ok" => None,
            "error" => {
                let ename = self.ename.unwrap_or_else(|| "Exception".into());
                let evalue = self.evalue.unwrap_or_default();
                outputs.push(Output::Error { ename: ename.clone(),
                                             evalue: evalue.clone(),
                                             traceback: self.traceback });
                Some(CellFailure { ename, evalue })
            }
            other => return Err(KernelError::Protocol(format!("unknown status '{other}'"))),
        };
        Ok(CellReply { outputs, failure })
    }
}

/// Sesión Python en un subproceso.
///
/// Todas las celdas comparten el mismo namespace. El intérprete se mata si
/// se agota el deadline de una celda o al hacer drop del kernel.
///
/// Usa un runtime tokio propio de un solo hilo; no debe invocarse desde
/// dentro de otro runtime tokio.
pub struct PythonKernel {
    runtime: Runtime,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    program: String,
    alive: bool,
}

impl std::fmt::Debug for PythonKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PythonKernel")
         .field("program", &self.program)
         .field("pid", &self.child.id())
         .field("alive", &self.alive)
         .finish()
    }
}

impl PythonKernel {
    pub fn start(spec: &KernelSpec) -> Result<Self, KernelError> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let spawn_err = |e: std::io::Error| KernelError::Spawn { program: spec.program.clone(),
                                                                 reason: e.to_string() };

        let mut child = {
            let _guard = runtime.enter();
            Command::new(&spec.program).arg("-u")
                                       .arg("-c")
                                       .arg(DRIVER)
                                       .current_dir(&spec.working_dir)
                                       .stdin(Stdio::piped())
                                       .stdout(Stdio::piped())
                                       .stderr(Stdio::inherit())
                                       .kill_on_drop(true)
                                       .spawn()
                                       .map_err(spawn_err)?
        };

        let stdin = child.stdin.take().ok_or_else(|| KernelError::Protocol("kernel stdin not captured".into()))?;
        let stdout = child.stdout
                          .take()
                          .ok_or_else(|| KernelError::Protocol("kernel stdout not captured".into()))?;
        debug!("kernel '{}' started in {} (pid {:?})",
               spec.program,
               spec.working_dir.display(),
               child.id());

        Ok(Self { runtime,
                  child,
                  stdin: Some(stdin),
                  stdout: BufReader::new(stdout).lines(),
                  program: spec.program.clone(),
                  alive: true })
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    fn kill(&mut self) {
        self.alive = false;
        self.stdin = None;
        let killed = self.runtime.block_on(self.child.kill());
        if let Err(e) = killed {
            warn!("failed to kill kernel '{}': {}", self.program, e);
        }
    }
}

impl Kernel for PythonKernel {
    fn execute(&mut self, cell: usize, source: &str, deadline: Instant) -> Result<CellReply, KernelError> {
        if !self.alive {
            return Err(KernelError::Exited);
        }
        let mut line = serde_json::to_string(&KernelRequest { cell, source }).map_err(|e| KernelError::Protocol(e.to_string()))?;
        line.push('\n');

        let deadline = tokio::time::Instant::from_std(deadline);
        let Self { runtime, stdin, stdout, .. } = &mut *self;
        let stdin = stdin.as_mut().ok_or(KernelError::Exited)?;
        let outcome = runtime.block_on(async {
                                 tokio::time::timeout_at(deadline, async {
                                     stdin.write_all(line.as_bytes()).await?;
                                     stdin.flush().await?;
                                     stdout.next_line().await
                                 }).await
                             });

        let reply_line = match outcome {
            Err(_elapsed) => {
                self.kill();
                return Err(KernelError::DeadlineExceeded);
            }
            Ok(Err(e)) => {
                self.kill();
                return Err(KernelError::Io(e));
            }
            Ok(Ok(None)) => {
                self.alive = false;
                return Err(KernelError::Exited);
            }
            Ok(Ok(Some(l))) => l,
        };

        // Tras una respuesta inválida el canal queda desincronizado.
        let reply = parse_reply(cell, &reply_line);
        if reply.is_err() {
            self.kill();
        }
        reply
    }

    fn shutdown(&mut self) -> Result<(), KernelError> {
        if !self.alive {
            return Ok(());
        }
        self.alive = false;
        // Cerrar stdin termina el loop del driver.
        self.stdin = None;
        // El `Sleep` del timeout necesita el reactor: se arma dentro del runtime.
        let child = &mut self.child;
        let waited = self.runtime.block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await });
        match waited {
            Ok(status) => {
                let status = status?;
                debug!("kernel '{}' exited with {}", self.program, status);
                Ok(())
            }
            Err(_) => {
                warn!("kernel '{}' ignored shutdown, killing", self.program);
                self.runtime.block_on(self.child.kill())?;
                Ok(())
            }
        }
    }
}

fn parse_reply(cell: usize, line: &str) -> Result<CellReply, KernelError> {
    let response: KernelResponse =
        serde_json::from_str(line).map_err(|e| KernelError::Protocol(format!("bad reply for cell {cell}: {e}")))?;
    if response.cell != Some(cell) {
        return Err(KernelError::Protocol(format!("reply for cell {:?}, expected {}", response.cell, cell)));
    }
    response.into_reply()
}

impl Drop for PythonKernel {
    fn drop(&mut self) {
        if self.alive {
            let _ = self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_for_another_cell_is_rejected() {
        let err = parse_reply(2, r#"{"cell": 1, "status": "ok"}"#).unwrap_err();
        assert!(matches!(err, KernelError::Protocol(ref m) if m.contains("expected 2")));
    }

    #[test]
    fn non_json_line_is_a_protocol_error() {
        assert!(matches!(parse_reply(1, "hi"), Err(KernelError::Protocol(_))));
    }

    #[test]
    fn error_reply_carries_failure_and_output() {
        let reply = parse_reply(3,
                                r#"{"cell": 3, "status": "error", "stdout": "a\n", "ename": "ValueError", "evalue": "bad", "traceback": ["tb"]}"#)
                    .unwrap();
        assert_eq!(reply.failure,
                   Some(CellFailure { ename: "ValueError".into(),
                                      evalue: "bad".into() }));
        assert_eq!(reply.outputs.len(), 2);
    }
}
