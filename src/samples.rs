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

//! Keyboard-triggered sample playback.
//!
//! This module provides:
//! - Sample loading and caching (in-memory for zero-latency playback)
//! - The key to sample registry for the active kit
//! - Voice management with a polyphony limit
//! - Choke groups and held-key tracking
//! - The engine that applies input events to all of the above

mod choke;
mod engine;
mod error;
mod loader;
mod registry;
mod tracker;
mod voice;

pub use choke::ChokeResolver;
pub use engine::{FeedbackHook, NoFeedback, PadEngine, TriggerOutcome};
pub use error::{DecodeError, ResourceLoadError};
pub use loader::{LoadedSample, PreloadHandle, PreloadStatus, SampleLoader};
pub use registry::{KitDefinition, SampleLocator, SampleRegistry, SampleResource};
pub use tracker::KeyStateTracker;
pub use voice::{SpawnError, Spawned, Voice, VoiceId, VoicePool};
