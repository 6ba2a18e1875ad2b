use crate::error::VoiceError;
use async_trait::async_trait;
use raahi_types::voice::{VoiceProfile, LOCALE_EN_US};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::RwLock;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion from
/// oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Default timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Converts reply text into a stored audio file.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesizes `text` in `locale` and returns the stored file name.
    async fn synthesize(&self, text: &str, locale: &str) -> Result<String, VoiceError>;
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    if Path::new(path).is_absolute() {
        PathBuf::from(path)
    } else {
        base.join(path)
    }
}

/// Piper-backed synthesizer that writes one WAV file per reply into the
/// audio directory.
#[derive(Debug, Clone)]
pub struct TtsService {
    profiles: Arc<RwLock<HashMap<String, VoiceProfile>>>,
    voices_dir: PathBuf,
    piper_binary: PathBuf,
    audio_dir: PathBuf,
    timeout: Duration,
}

impl TtsService {
    pub fn new(
        voices_dir: impl AsRef<Path>,
        piper_binary: impl AsRef<Path>,
        audio_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
            voices_dir: voices_dir.as_ref().to_path_buf(),
            piper_binary: piper_binary.as_ref().to_path_buf(),
            audio_dir: audio_dir.as_ref().to_path_buf(),
            timeout: TTS_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Registers the voice used for `profile.locale`, replacing any previous one.
    pub async fn add_profile(&self, profile: VoiceProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.locale.clone(), profile);
    }

    /// Returns the profile for `locale`, falling back to the English voice.
    pub async fn profile_for(&self, locale: &str) -> Option<VoiceProfile> {
        let profiles = self.profiles.read().await;
        profiles
            .get(locale)
            .or_else(|| profiles.get(LOCALE_EN_US))
            .cloned()
    }

    async fn run_piper(
        &self,
        text: &str,
        profile: &VoiceProfile,
        output_path: &Path,
    ) -> Result<(), VoiceError> {
        let model_path = resolve(&self.voices_dir, &profile.model_path);
        if !model_path.exists() {
            return Err(VoiceError::Tts(format!(
                "Model file not found: {:?}",
                model_path
            )));
        }

        if profile.speed < 0.1 || profile.speed > 10.0 {
            return Err(VoiceError::Config(
                "Speed must be between 0.1 and 10.0".to_string(),
            ));
        }

        let mut command = Command::new(&self.piper_binary);
        command
            .arg("--model")
            .arg(model_path)
            .arg("--output_file")
            .arg(output_path)
            // Length scale is the inverse of speed.
            .arg("--length_scale")
            .arg((1.0 / profile.speed).to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(config) = &profile.config_path {
            command.arg("--config").arg(resolve(&self.voices_dir, config));
        }

        if let Some(speaker) = profile.speaker_id {
            command.arg("--speaker").arg(speaker.to_string());
        }

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("Failed to spawn piper: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Tts("Failed to open stdin".to_string()))?;
        let text_owned = text.to_string();

        // Write on a separate task to avoid deadlock if the output buffer fills up.
        let write_task = tokio::spawn(async move { stdin.write_all(text_owned.as_bytes()).await });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "TTS process timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("Failed to wait for piper: {}", e)))?;

        match write_task.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(VoiceError::Tts(format!(
                    "Failed to write to piper stdin: {}",
                    e
                )))
            }
            Err(e) => return Err(VoiceError::Tts(format!("Stdin task failed: {}", e))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!("Piper failed: {}", stderr)));
        }

        Ok(())
    }
}

#[async_trait]
impl Synthesizer for TtsService {
    async fn synthesize(&self, text: &str, locale: &str) -> Result<String, VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let profile = self
            .profile_for(locale)
            .await
            .ok_or_else(|| VoiceError::ProfileNotFound(locale.to_string()))?;

        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(|e| VoiceError::Tts(format!("Failed to create audio dir: {}", e)))?;

        let filename = format!("response_{}.wav", uuid::Uuid::new_v4().simple());
        let output_path = self.audio_dir.join(&filename);

        tracing::info!(
            locale,
            voice = %profile.model_path,
            file = %filename,
            "synthesizing reply"
        );

        if let Err(e) = self.run_piper(text, &profile, &output_path).await {
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(e);
        }

        let written = tokio::fs::metadata(&output_path)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);
        if !written {
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(VoiceError::Tts("piper produced no audio".to_string()));
        }

        Ok(filename)
    }
}
