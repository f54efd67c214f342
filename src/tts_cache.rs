//! Per-message speech audio cache.
//!
//! Each assistant message index owns a slot that is filled at most once.
//! Concurrent requests for the same index wait on the single in-flight
//! synthesis; a failed synthesis leaves the slot empty so the next request
//! tries again. Clearing the cache detaches every existing slot, so a
//! synthesis that completes after a clear lands in a slot nobody can reach.

use crate::tts::{Synthesizer, TTSError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// Encoded audio shared between the cache and its readers
pub type AudioBytes = Arc<[u8]>;

/// Handle to the cache entry for one message index.
#[derive(Clone)]
pub struct AudioSlot {
    index: usize,
    cell: Arc<OnceCell<AudioBytes>>,
}

impl AudioSlot {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self) -> Option<AudioBytes> {
        self.cell.get().cloned()
    }

    /// Return the cached audio or run `synthesizer` to produce it.
    pub async fn get_or_synthesize(
        &self,
        text: &str,
        synthesizer: &dyn Synthesizer,
    ) -> Result<AudioBytes, TTSError> {
        let audio = self
            .cell
            .get_or_try_init(|| async {
                log::debug!("🔊 Synthesizing audio for message {}", self.index);
                let audio = synthesizer.synthesize(text).await?;
                Ok::<AudioBytes, TTSError>(Arc::from(audio))
            })
            .await;

        match audio {
            Ok(audio) => Ok(audio.clone()),
            Err(e) => {
                log::warn!("⚠️ Audio for message {} failed: {}", self.index, e);
                Err(e)
            }
        }
    }
}

#[derive(Default)]
pub struct TtsCache {
    slots: Mutex<HashMap<usize, Arc<OnceCell<AudioBytes>>>>,
}

impl TtsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot for `index`, created on first use.
    pub(crate) fn slot(&self, index: usize) -> AudioSlot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let cell = slots.entry(index).or_default().clone();
        AudioSlot { index, cell }
    }

    /// Audio already synthesized for `index`, without triggering synthesis
    pub fn cached(&self, index: usize) -> Option<AudioBytes> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(&index).and_then(|cell| cell.get().cloned())
    }

    /// Indices holding synthesized audio, ascending
    pub fn cached_indices(&self) -> Vec<usize> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let mut indices: Vec<usize> = slots
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(index, _)| *index)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Number of indices holding synthesized audio
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn clear(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.clear();
    }
}
