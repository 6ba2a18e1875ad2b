use crate::error::VoiceError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maximum audio input size for STT (10 MiB). Prevents OOM from oversized payloads.
pub const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Default timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Converts a submitted audio blob into transcript text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String, VoiceError>;
}

/// Returns `true` for mime types a browser recorder may submit.
fn is_supported_mime(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("audio/") || essence == "video/webm" || essence == "application/octet-stream"
}

/// Speech-to-text via a whisper.cpp-compatible binary.
///
/// The binary is run as `<binary> -m <model> -f -` with the audio on stdin and
/// is expected to print the transcript on stdout.
#[derive(Debug, Clone)]
pub struct SttService {
    model_path: PathBuf,
    binary_path: PathBuf,
    timeout: Duration,
}

impl SttService {
    pub fn new(model_path: impl Into<PathBuf>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            binary_path: binary_path.into(),
            timeout: STT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Transcriber for SttService {
    async fn transcribe(&self, audio_data: &[u8], mime_type: &str) -> Result<String, VoiceError> {
        if audio_data.is_empty() {
            return Err(VoiceError::Stt("audio data is empty".to_string()));
        }
        if audio_data.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::Stt(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio_data.len(),
                MAX_STT_INPUT_BYTES
            )));
        }
        if !is_supported_mime(mime_type) {
            return Err(VoiceError::Stt(format!(
                "unsupported audio mime type: {}",
                mime_type
            )));
        }

        tracing::debug!(bytes = audio_data.len(), mime_type, "starting transcription");

        let mut command = Command::new(&self.binary_path);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg("-")
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Stt(format!("Failed to spawn STT binary: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Stt("Failed to open stdin".to_string()))?;

        // Write on a separate task so a full stdout pipe cannot deadlock us.
        let audio_owned = audio_data.to_vec();
        let write_task = tokio::spawn(async move { stdin.write_all(&audio_owned).await });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Stt(format!(
                    "STT process timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Stt(format!("Failed to read stdout: {}", e)))?;

        // A binary that exits before draining stdin is judged by its exit
        // status, not by the broken pipe.
        if let Err(e) = write_task.await {
            return Err(VoiceError::Stt(format!("Stdin task failed: {}", e)));
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Stt(format!("STT binary failed: {}", stderr)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_recorder_mime_types_are_supported() {
        assert!(is_supported_mime("audio/webm;codecs=opus"));
        assert!(is_supported_mime("audio/mpeg"));
        assert!(is_supported_mime("video/webm"));
        assert!(is_supported_mime("application/octet-stream"));
        assert!(!is_supported_mime("image/png"));
        assert!(!is_supported_mime("text/plain"));
    }
}
