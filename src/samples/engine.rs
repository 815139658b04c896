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

//! The pad engine: the single owner of every piece of mutable trigger state.
//!
//! Events are applied one at a time. A trigger moves its key to Held, silences
//! whatever the key chokes, spawns a voice and fires the feedback hook. A
//! release returns the key to Idle and, by default, stops that key's voices.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::choke::ChokeResolver;
use super::error::ResourceLoadError;
use super::loader::SampleLoader;
use super::registry::{KitDefinition, SampleRegistry};
use super::tracker::KeyStateTracker;
use super::voice::{VoiceId, VoicePool};
use crate::audio::Device;
use crate::config::{Pad, ReleaseBehavior};
use crate::keys::LogicalKey;

/// Notified after every key that goes down. Implementations must return
/// quickly; the engine calls it inline.
pub trait FeedbackHook: Send {
    fn key_triggered(&self, key: LogicalKey);
}

/// A feedback hook that does nothing.
pub struct NoFeedback;

impl FeedbackHook for NoFeedback {
    fn key_triggered(&self, _key: LogicalKey) {}
}

/// What a trigger did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The key was already held.
    Suppressed,
    /// A voice was spawned.
    Played {
        voice: VoiceId,
        evicted: Option<VoiceId>,
        choked: Vec<VoiceId>,
    },
    /// The key went down but its sample is not playable yet or failed to load.
    Silent { choked: Vec<VoiceId> },
}

/// The sound-trigger engine.
pub struct PadEngine {
    registry: SampleRegistry,
    pool: VoicePool,
    chokes: ChokeResolver,
    keys: KeyStateTracker,
    release: ReleaseBehavior,
    feedback: Box<dyn FeedbackHook>,
}

impl PadEngine {
    /// Builds the engine and loads the pad's default kit. Missing samples are
    /// logged; their keys stay silent.
    pub fn new(pad: &Pad, device: Arc<dyn Device>, feedback: Box<dyn FeedbackHook>) -> Self {
        let loader = Arc::new(SampleLoader::new(device.sample_rate()));
        let mut registry = SampleRegistry::new(
            KitDefinition::from_pad(pad),
            loader,
            pad.preload(),
            pad.default_volume(),
        );
        match registry.load(pad.default_kit()) {
            Ok(()) => {}
            Err(e @ ResourceLoadError::MissingSamples { .. }) => {
                warn!(err = %e, "Starting with missing samples")
            }
            Err(e) => error!(err = %e, "Unable to load default kit"),
        }

        info!(
            device = %device,
            kit = pad.default_kit(),
            max_voices = pad.max_voices(),
            release = ?pad.release(),
            "Pad engine ready"
        );

        Self {
            registry,
            pool: VoicePool::new(pad.max_voices(), device),
            chokes: ChokeResolver::new(pad.choke_groups().to_vec()),
            keys: KeyStateTracker::new(),
            release: pad.release(),
            feedback,
        }
    }

    /// Handles a key going down.
    pub fn trigger(&mut self, key: LogicalKey) -> TriggerOutcome {
        if !self.keys.press(key) {
            return TriggerOutcome::Suppressed;
        }

        let choked = self.chokes.choke(key);
        for id in &choked {
            self.pool.stop(*id);
        }

        let spawned = match self.registry.get(key) {
            Some(resource) => match self.pool.spawn(key, resource) {
                Ok(spawned) => Some(spawned),
                Err(e) => {
                    debug!(key = %key, err = %e, "Key triggered without sound");
                    None
                }
            },
            None => None,
        };

        let outcome = match spawned {
            Some(spawned) => {
                if let Some(evicted) = spawned.evicted {
                    self.chokes.forget(evicted);
                }
                self.chokes.track(key, spawned.voice);
                TriggerOutcome::Played {
                    voice: spawned.voice,
                    evicted: spawned.evicted,
                    choked,
                }
            }
            None => TriggerOutcome::Silent { choked },
        };

        self.feedback.key_triggered(key);
        outcome
    }

    /// Handles a key going up. Returns the voices that were stopped.
    pub fn release(&mut self, key: LogicalKey) -> Vec<VoiceId> {
        if !self.keys.release(key) {
            return Vec::new();
        }

        match self.release {
            ReleaseBehavior::Stop => {
                let stopped = self.pool.stop_key(key);
                for id in &stopped {
                    self.chokes.forget(*id);
                }
                stopped
            }
            ReleaseBehavior::PlayToCompletion => Vec::new(),
        }
    }

    /// A trigger immediately followed by a return to Idle that leaves the
    /// voice playing. For inputs that never report a key going up.
    pub fn tap(&mut self, key: LogicalKey) -> TriggerOutcome {
        let outcome = self.trigger(key);
        if outcome != TriggerOutcome::Suppressed {
            self.keys.release(key);
        }
        outcome
    }

    /// Triggers a raw input. Inputs outside the pad alphabet are ignored.
    pub fn trigger_input(&mut self, input: &str) -> Option<TriggerOutcome> {
        match LogicalKey::from_input(input) {
            Ok(key) => Some(self.trigger(key)),
            Err(e) => {
                debug!(err = %e, "Ignoring input");
                None
            }
        }
    }

    /// Releases a raw input. Inputs outside the pad alphabet are ignored.
    pub fn release_input(&mut self, input: &str) -> Vec<VoiceId> {
        match LogicalKey::from_input(input) {
            Ok(key) => self.release(key),
            Err(e) => {
                debug!(err = %e, "Ignoring input");
                Vec::new()
            }
        }
    }

    /// Switches to the named kit. Playing voices are not affected.
    pub fn switch_kit(&mut self, kit: &str) -> Result<(), ResourceLoadError> {
        info!(kit, "Switching kit");
        self.registry.load(kit)
    }

    /// Switches to the kit at the given position.
    pub fn select_kit(&mut self, index: usize) -> Result<(), ResourceLoadError> {
        let kit = self
            .registry
            .kit_name(index)
            .ok_or_else(|| ResourceLoadError::UnknownKit(format!("#{}", index + 1)))?
            .to_string();
        self.switch_kit(&kit)
    }

    /// Switches to the kit after the active one, wrapping around.
    pub fn next_kit(&mut self) -> Result<(), ResourceLoadError> {
        let next = match self.registry.active_index() {
            Some(index) => (index + 1) % self.registry.kit_count().max(1),
            None => 0,
        };
        self.select_kit(next)
    }

    /// Sets one key's volume from a 0 to 100 percentage.
    pub fn set_volume(&mut self, key: LogicalKey, percent: u8) {
        debug!(key = %key, percent, "Setting key volume");
        self.registry.set_volume_percent(key, percent);
    }

    /// Sets every key's volume from a 0 to 100 percentage.
    pub fn set_overall_volume(&mut self, percent: u8) {
        debug!(percent, "Setting overall volume");
        self.registry.set_all_volumes_percent(percent);
    }

    /// Handles a voice that played to its end. Returns false if the voice had
    /// already been removed.
    pub fn on_voice_ended(&mut self, id: VoiceId) -> bool {
        self.chokes.forget(id);
        self.pool.complete(id)
    }

    /// Stops every voice and returns every key to Idle.
    pub fn stop_all(&mut self) -> Vec<VoiceId> {
        let stopped = self.pool.stop_all();
        for id in &stopped {
            self.chokes.forget(*id);
        }
        self.keys.clear();
        stopped
    }

    pub fn is_held(&self, key: LogicalKey) -> bool {
        self.keys.is_held(key)
    }

    /// Keys currently held, in alphabet order.
    pub fn held_keys(&self) -> Vec<LogicalKey> {
        self.keys.held().collect()
    }

    pub fn active_kit(&self) -> Option<&str> {
        self.registry.active_kit()
    }

    pub fn active_voices(&self) -> usize {
        self.pool.len()
    }

    pub fn registry(&self) -> &SampleRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    pub fn chokes(&self) -> &ChokeResolver {
        &self.chokes
    }
}
