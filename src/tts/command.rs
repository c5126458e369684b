//! Offline backend that shells out to a local synthesis program.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::tts::{ensure_parent, SpeechSynthesizer, SynthesisError};

/// Runs `program args…` with the text on stdin.
///
/// `{output}` and `{language}` in `args` are replaced per call, e.g.
/// `espeak-ng -v {language} -w {output}` or
/// `piper --model en.onnx --output_file {output}`.
#[derive(Debug, Clone)]
pub struct CommandTts {
    program: String,
    args: Vec<String>,
}

impl CommandTts {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn expand_args(&self, output: &Path, language: &str) -> Vec<String> {
        let output = output.display().to_string();
        self.args
            .iter()
            .map(|a| a.replace("{output}", &output).replace("{language}", language))
            .collect()
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandTts {
    async fn synthesize(
        &self,
        text: &str,
        output: &Path,
        language: &str,
    ) -> Result<PathBuf, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }
        ensure_parent(output).await?;

        let args = self.expand_args(output, language);
        log::debug!("tts: running {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SynthesisError::Command(format!("cannot spawn {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that exits early is reported through its exit status.
            if let Err(e) = stdin.write_all(text.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(SynthesisError::Command(format!("writing stdin: {e}")));
                }
            }
        }

        let result = child
            .wait_with_output()
            .await
            .map_err(|e| SynthesisError::Command(e.to_string()))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(SynthesisError::Command(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }

        let written = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(SynthesisError::Command(format!(
                "{} produced no audio at {}",
                self.program,
                output.display()
            )));
        }

        Ok(output.to_path_buf())
    }
}
