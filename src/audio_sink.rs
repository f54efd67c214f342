use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to save audio: {0}")]
    FailedToSaveAudio(#[from] std::io::Error),
}

/// Core trait for audio output handling
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    /// Deliver the encoded (MP3) audio for one assistant message.
    /// `autoplay` marks the newest reply that should start on its own.
    async fn deliver(&self, index: usize, audio: &[u8], autoplay: bool) -> Result<PathBuf, AudioError>;
}

/// Writes each clip to `<dir>/message-<index>.mp3`; the newest autoplay
/// clip is also copied to `<dir>/latest.mp3` for an external player to pick up.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, AudioError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("message-{:04}.mp3", index))
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join("latest.mp3")
    }
}

#[async_trait::async_trait]
impl AudioSink for FileSink {
    async fn deliver(&self, index: usize, audio: &[u8], autoplay: bool) -> Result<PathBuf, AudioError> {
        let path = self.clip_path(index);
        tokio::fs::write(&path, audio).await?;
        log::debug!("💾 Saved {} bytes of audio to {}", audio.len(), path.display());

        if autoplay {
            tokio::fs::write(self.latest_path(), audio).await?;
            log::info!("▶️ Message {} ready for playback", index);
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_sink_writes_clips() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("audio")).await.unwrap();

        let path = sink.deliver(3, b"ID3fake", false).await.unwrap();
        assert_eq!(path, sink.clip_path(3));
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3fake");
        assert!(!sink.latest_path().exists());

        sink.deliver(5, b"ID3newer", true).await.unwrap();
        assert_eq!(std::fs::read(sink.latest_path()).unwrap(), b"ID3newer");
        assert!(path.file_name().unwrap().to_str().unwrap().contains("0003"));
    }
}
