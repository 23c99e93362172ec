//! Engine backed by a long-lived worker process.
//!
//! The worker loads the model once and then serves requests over
//! line-delimited JSON: it announces `{"status":"ready"}` on startup, reads one
//! request per line on stdin and answers one line on stdout after writing the
//! waveform to the requested `output_path` as a WAV file. A single worker
//! serves one request at a time.

use super::{EngineError, EngineOutput, EngineParams, SynthesisEngine};
use crate::domain::audio::decode_wav;
use crate::infrastructure::temp::TempStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct ProcessEngineSettings {
    pub command: String,
    pub script: Option<PathBuf>,
    pub model_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct WorkerRequest<'a> {
    entry: &'static str,
    prompt_wav: &'a Path,
    text: &'a str,
    output_path: &'a Path,
    params: &'a EngineParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    sentences_bucket_max_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WorkerResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

struct Worker {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Worker {
    fn spawn(settings: &ProcessEngineSettings) -> Result<Self, EngineError> {
        let mut command = Command::new(&settings.command);
        if let Some(script) = &settings.script {
            command.arg(script);
        }
        let mut child = command
            .arg("--model_dir")
            .arg(&settings.model_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| EngineError::Startup(format!("{}: {}", settings.command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Startup("worker stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Startup("worker stdout unavailable".to_string()))?;

        let mut worker = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };

        let ready = worker.read_response()?;
        if ready.status != "ready" {
            return Err(EngineError::Startup(
                ready.error.unwrap_or_else(|| format!("unexpected status '{}'", ready.status)),
            ));
        }

        Ok(worker)
    }

    fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn call(&mut self, request: &WorkerRequest<'_>) -> Result<WorkerResponse, EngineError> {
        let mut line = serde_json::to_string(request)
            .map_err(|e| EngineError::Worker(format!("failed to encode request: {}", e)))?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;
        self.read_response()
    }

    /// Read the next JSON line, skipping anything the model libraries print.
    fn read_response(&mut self) -> Result<WorkerResponse, EngineError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.stdout.read_line(&mut line)? == 0 {
                return Err(EngineError::Worker("worker exited".to_string()));
            }
            let trimmed = line.trim();
            if trimmed.starts_with('{') {
                return serde_json::from_str(trimmed).map_err(|e| {
                    EngineError::MalformedOutput(format!("unparseable worker response: {}", e))
                });
            }
            tracing::debug!(output = trimmed, "Engine worker output");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub struct ProcessSynthesisEngine {
    settings: ProcessEngineSettings,
    worker: Mutex<Option<Worker>>,
    temp: TempStore,
}

impl ProcessSynthesisEngine {
    /// Start the worker and wait until the model is loaded.
    pub fn start(settings: ProcessEngineSettings, temp: TempStore) -> Result<Self, EngineError> {
        let started = Instant::now();
        let worker = Worker::spawn(&settings)?;
        tracing::info!(
            command = %settings.command,
            model_dir = %settings.model_dir.display(),
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Synthesis engine initialized"
        );

        Ok(Self {
            settings,
            worker: Mutex::new(Some(worker)),
            temp,
        })
    }

    fn run(
        &self,
        entry: &'static str,
        prompt_wav: &Path,
        text: &str,
        params: &EngineParams,
        sentences_bucket_max_size: Option<u32>,
    ) -> Result<EngineOutput, EngineError> {
        let output = self.temp.allocate("engine", "wav");
        let request = WorkerRequest {
            entry,
            prompt_wav,
            text,
            output_path: output.path(),
            params,
            sentences_bucket_max_size,
        };

        let response = {
            let mut slot = self.worker.lock();
            if !slot.as_mut().map(Worker::is_alive).unwrap_or(false) {
                tracing::warn!("Engine worker not running, restarting");
                *slot = None;
                *slot = Some(Worker::spawn(&self.settings)?);
            }
            let worker = slot
                .as_mut()
                .ok_or_else(|| EngineError::Worker("worker unavailable".to_string()))?;
            match worker.call(&request) {
                Ok(response) => response,
                Err(e) => {
                    // A broken pipe leaves the worker in an unknown state
                    *slot = None;
                    return Err(e);
                }
            }
        };

        match response.status.as_str() {
            "ok" => {}
            "invalid_shape" => {
                return Err(EngineError::MalformedOutput(
                    response.error.unwrap_or_else(|| "no detail".to_string()),
                ))
            }
            _ => {
                return Err(EngineError::Inference(
                    response.error.unwrap_or_else(|| format!("status '{}'", response.status)),
                ))
            }
        }

        let bytes = std::fs::read(output.path())
            .map_err(|e| EngineError::MalformedOutput(format!("no waveform written: {}", e)))?;
        let decoded =
            decode_wav(&bytes).map_err(|e| EngineError::MalformedOutput(e.to_string()))?;

        Ok(EngineOutput {
            sample_rate: decoded.sample_rate as i64,
            channels: decoded.channels,
            samples: decoded.samples,
        })
    }
}

impl SynthesisEngine for ProcessSynthesisEngine {
    fn synthesize(
        &self,
        prompt_wav: &Path,
        text: &str,
        params: &EngineParams,
    ) -> Result<EngineOutput, EngineError> {
        self.run("infer", prompt_wav, text, params, None)
    }

    fn synthesize_bucketed(
        &self,
        prompt_wav: &Path,
        text: &str,
        params: &EngineParams,
        sentences_bucket_max_size: u32,
    ) -> Result<EngineOutput, EngineError> {
        self.run(
            "infer_fast",
            prompt_wav,
            text,
            params,
            Some(sentences_bucket_max_size),
        )
    }
}
