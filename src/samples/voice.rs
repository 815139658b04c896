// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Voice management for polyphonic sample playback.
//!
//! Handles voice allocation, stealing the oldest voice when the pool is full,
//! and idempotent removal.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use super::loader::PreloadStatus;
use super::registry::SampleResource;
use crate::audio::{ActiveSource, Device};
use crate::keys::LogicalKey;
use crate::playsync::CancelHandle;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one voice. Ids increase in spawn order and are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(u64);

impl VoiceId {
    /// Allocates the next voice id.
    pub fn next() -> VoiceId {
        VoiceId(NEXT_VOICE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice-{}", self.0)
    }
}

/// Reasons a voice could not be spawned. None of them are fatal; the hit is
/// simply not heard.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("sample for key {0} is still loading")]
    NotReady(LogicalKey),

    #[error("sample for key {key} failed to load: {reason}")]
    LoadFailed { key: LogicalKey, reason: String },

    #[error("audio device rejected voice: {0}")]
    Device(String),
}

/// Represents an active voice playing a sample.
#[derive(Debug)]
pub struct Voice {
    /// Unique ID for this voice.
    id: VoiceId,
    /// The key that spawned this voice.
    key: LogicalKey,
    /// Volume copied from the sample resource at spawn time.
    volume: f32,
    /// Cancel handle shared with the source in the mixer.
    cancel_handle: CancelHandle,
}

impl Voice {
    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn key(&self) -> LogicalKey {
        self.key
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Stops playback. Safe to call more than once.
    fn stop(&self) {
        self.cancel_handle.cancel();
    }
}

/// The result of a successful spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawned {
    /// The new voice.
    pub voice: VoiceId,
    /// The oldest voice, if it was stolen to make room.
    pub evicted: Option<VoiceId>,
}

/// A bounded set of playing voices, oldest first.
pub struct VoicePool {
    /// Active voices in spawn order.
    voices: VecDeque<Voice>,
    /// Maximum number of concurrent voices.
    max_voices: usize,
    /// Where voices are played.
    device: Arc<dyn Device>,
}

impl VoicePool {
    /// Creates a new voice pool.
    pub fn new(max_voices: usize, device: Arc<dyn Device>) -> Self {
        Self {
            voices: VecDeque::with_capacity(max_voices.max(1)),
            max_voices: max_voices.max(1),
            device,
        }
    }

    /// Spawns an independent voice from the key's current resource at the
    /// resource's current volume. When the pool is full the oldest voice is
    /// stopped and removed first.
    pub fn spawn(
        &mut self,
        key: LogicalKey,
        resource: &SampleResource,
    ) -> Result<Spawned, SpawnError> {
        let sample = match resource.preload().status() {
            PreloadStatus::Ready(sample) => sample,
            PreloadStatus::Pending => return Err(SpawnError::NotReady(key)),
            PreloadStatus::Failed(e) => {
                return Err(SpawnError::LoadFailed {
                    key,
                    reason: e.to_string(),
                })
            }
        };

        let id = VoiceId::next();
        let volume = resource.volume();
        let cancel_handle = CancelHandle::new();
        self.device
            .play(ActiveSource {
                id,
                source: sample.create_source(volume),
                cancel_handle: cancel_handle.clone(),
            })
            .map_err(|e| SpawnError::Device(e.to_string()))?;

        let evicted = if self.voices.len() >= self.max_voices {
            self.voices.pop_front().map(|oldest| {
                oldest.stop();
                warn!(
                    max_voices = self.max_voices,
                    voice = %oldest.id,
                    key = %oldest.key,
                    "Voice limit reached, stealing oldest"
                );
                oldest.id
            })
        } else {
            None
        };

        debug!(voice = %id, key = %key, volume, sample = %resource.locator(), "Spawned voice");
        self.voices.push_back(Voice {
            id,
            key,
            volume,
            cancel_handle,
        });

        Ok(Spawned { voice: id, evicted })
    }

    fn remove(&mut self, id: VoiceId) -> Option<Voice> {
        let index = self.voices.iter().position(|voice| voice.id == id)?;
        self.voices.remove(index)
    }

    /// Stops a voice early and removes it. Returns false if the voice was
    /// already gone.
    pub fn stop(&mut self, id: VoiceId) -> bool {
        match self.remove(id) {
            Some(voice) => {
                voice.stop();
                true
            }
            None => false,
        }
    }

    /// Removes a voice that played to its end. Returns false if the voice was
    /// already gone.
    pub fn complete(&mut self, id: VoiceId) -> bool {
        self.remove(id).is_some()
    }

    /// Stops every voice spawned from the given key.
    pub fn stop_key(&mut self, key: LogicalKey) -> Vec<VoiceId> {
        let mut stopped = Vec::new();
        self.voices.retain(|voice| {
            if voice.key == key {
                voice.stop();
                stopped.push(voice.id);
                false
            } else {
                true
            }
        });
        stopped
    }

    /// Stops every voice.
    pub fn stop_all(&mut self) -> Vec<VoiceId> {
        self.voices
            .drain(..)
            .map(|voice| {
                voice.stop();
                voice.id
            })
            .collect()
    }

    /// Returns the current number of active voices.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    pub fn contains(&self, id: VoiceId) -> bool {
        self.voices.iter().any(|voice| voice.id == id)
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|voice| voice.id == id)
    }
}

impl fmt::Debug for VoicePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePool")
            .field("active_voices", &self.voices.len())
            .field("max_voices", &self.max_voices)
            .field("device", &self.device.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::audio::{completion_channel, mock};
    use crate::config::{default_key_sounds, PreloadMode};
    use crate::samples::loader::{PreloadHandle, SampleLoader};
    use crate::samples::registry::{KitDefinition, SampleRegistry};
    use crate::testutil::write_kit;

    fn setup(root: &Path, max_voices: usize) -> (SampleRegistry, VoicePool, Arc<mock::Device>) {
        write_kit(&root.join("kit"), 1000, 44100).unwrap();
        let kits = vec![KitDefinition::new("kit", root.join("kit"), default_key_sounds())];
        let mut registry = SampleRegistry::new(
            kits,
            Arc::new(SampleLoader::new(44100)),
            PreloadMode::Inline,
            0.6,
        );
        registry.load("kit").unwrap();

        let (tx, _rx) = completion_channel();
        let device = Arc::new(mock::Device::get("mock", 44100, tx));
        let pool = VoicePool::new(max_voices, device.clone());
        (registry, pool, device)
    }

    fn key(c: char) -> LogicalKey {
        LogicalKey::from_char(c).unwrap()
    }

    #[test]
    fn test_overlapping_voices_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, mut pool, device) = setup(dir.path(), 64);
        let q = key('Q');

        let first = pool.spawn(q, registry.get(q).unwrap()).unwrap();
        let second = pool.spawn(q, registry.get(q).unwrap()).unwrap();

        assert_ne!(first.voice, second.voice);
        assert_eq!(pool.len(), 2);
        assert_eq!(device.play_count(), 2);

        assert!(pool.stop(first.voice));
        assert!(device.is_stopped(first.voice));
        assert!(!device.is_stopped(second.voice));
    }

    #[test]
    fn test_volume_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, mut pool, _device) = setup(dir.path(), 64);
        let q = key('Q');

        let first = pool.spawn(q, registry.get(q).unwrap()).unwrap();
        registry.set_volume(q, 0.2);
        let second = pool.spawn(q, registry.get(q).unwrap()).unwrap();

        assert_eq!(pool.voice(first.voice).unwrap().volume(), 0.6);
        assert_eq!(pool.voice(second.voice).unwrap().volume(), 0.2);
    }

    #[test]
    fn test_full_pool_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, mut pool, device) = setup(dir.path(), 64);

        let mut ids = Vec::new();
        for i in 0..64 {
            let k = LogicalKey::all().nth(i % 27).unwrap();
            let spawned = pool.spawn(k, registry.get(k).unwrap()).unwrap();
            assert_eq!(spawned.evicted, None);
            ids.push(spawned.voice);
        }
        assert_eq!(pool.len(), 64);

        let q = key('Q');
        let spawned = pool.spawn(q, registry.get(q).unwrap()).unwrap();
        assert_eq!(spawned.evicted, Some(ids[0]));
        assert_eq!(pool.len(), 64);
        assert!(!pool.contains(ids[0]));
        assert!(device.is_stopped(ids[0]));
        assert!(!device.is_stopped(ids[1]));

        // The next spawn steals the next oldest.
        let spawned = pool.spawn(q, registry.get(q).unwrap()).unwrap();
        assert_eq!(spawned.evicted, Some(ids[1]));
    }

    #[test]
    fn test_removal_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, mut pool, _device) = setup(dir.path(), 1);
        let q = key('Q');

        let first = pool.spawn(q, registry.get(q).unwrap()).unwrap();
        let second = pool.spawn(q, registry.get(q).unwrap()).unwrap();
        assert_eq!(second.evicted, Some(first.voice));

        // The evicted voice's completion arrives late.
        assert!(!pool.complete(first.voice));
        assert!(!pool.stop(first.voice));
        assert_eq!(pool.len(), 1);

        assert!(pool.complete(second.voice));
        assert!(!pool.complete(second.voice));
        assert!(!pool.stop(second.voice));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_stop_key_and_stop_all() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, mut pool, _device) = setup(dir.path(), 64);
        let (q, w) = (key('Q'), key('W'));

        let q1 = pool.spawn(q, registry.get(q).unwrap()).unwrap().voice;
        let w1 = pool.spawn(w, registry.get(w).unwrap()).unwrap().voice;
        let q2 = pool.spawn(q, registry.get(q).unwrap()).unwrap().voice;

        assert_eq!(pool.stop_key(q), vec![q1, q2]);
        assert_eq!(pool.len(), 1);
        assert!(pool.stop_key(q).is_empty());

        assert_eq!(pool.stop_all(), vec![w1]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pending_sample_is_not_spawned() {
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, mut pool, device) = setup(dir.path(), 64);
        let t = key('T');
        registry.replace_preload(t, PreloadHandle::default());

        let err = pool.spawn(t, registry.get(t).unwrap()).unwrap_err();
        assert!(matches!(err, SpawnError::NotReady(pending) if pending == t));
        assert!(pool.is_empty());
        assert_eq!(device.play_count(), 0);

        // Other keys are unaffected.
        let q = key('Q');
        assert!(pool.spawn(q, registry.get(q).unwrap()).is_ok());
        assert_eq!(device.play_count(), 1);
    }

    #[test]
    fn test_failed_sample_is_not_spawned() {
        let dir = tempfile::tempdir().unwrap();
        write_kit(&dir.path().join("kit"), 10, 44100).unwrap();
        std::fs::remove_file(dir.path().join("kit").join("cowbell.wav")).unwrap();
        let kits = vec![KitDefinition::new("kit", dir.path().join("kit"), default_key_sounds())];
        let mut registry = SampleRegistry::new(
            kits,
            Arc::new(SampleLoader::new(44100)),
            PreloadMode::Inline,
            0.6,
        );
        assert!(registry.load("kit").is_err());

        let (tx, _rx) = completion_channel();
        let device = Arc::new(mock::Device::get("mock", 44100, tx));
        let mut pool = VoicePool::new(4, device.clone());

        let p = key('P');
        let err = pool.spawn(p, registry.get(p).unwrap()).unwrap_err();
        assert!(matches!(err, SpawnError::LoadFailed { key: failed, .. } if failed == p));
        assert!(pool.is_empty());
        assert_eq!(device.play_count(), 0);
    }
}
