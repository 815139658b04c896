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
// Core audio mixing logic shared by the cpal and mock devices.
use crate::audio::source::VoiceSource;
use crate::audio::CompletionSender;
use crate::playsync::CancelHandle;
use crate::samples::VoiceId;

/// Represents an active voice in the mixer.
pub struct ActiveSource {
    /// The voice this source plays.
    pub id: VoiceId,
    /// The playback instance.
    pub source: VoiceSource,
    /// Cancel handle shared with the voice pool.
    pub cancel_handle: CancelHandle,
}

/// Sums active voices into interleaved output and reports voices that reach
/// their end.
pub struct AudioMixer {
    /// Voices currently playing.
    sources: Vec<ActiveSource>,
    /// Number of output channels.
    num_channels: u16,
    /// Sample rate.
    sample_rate: u32,
    /// Where natural completions are reported.
    completions: CompletionSender,
}

impl AudioMixer {
    /// Creates a new audio mixer.
    pub fn new(num_channels: u16, sample_rate: u32, completions: CompletionSender) -> Self {
        Self {
            sources: Vec::new(),
            num_channels: num_channels.max(1),
            sample_rate,
            completions,
        }
    }

    /// Adds a new voice to the mixer.
    pub fn add_source(&mut self, source: ActiveSource) {
        self.sources.push(source);
    }

    /// Fills the interleaved output buffer. Cancelled voices are dropped
    /// silently; voices that run out of frames are reported exactly once.
    pub fn process_into(&mut self, output: &mut [f32]) {
        output.fill(0.0);

        let num_channels = self.num_channels;
        let completions = &self.completions;
        self.sources.retain_mut(|active| {
            if active.cancel_handle.is_cancelled() {
                return false;
            }

            active.source.mix_into(output, num_channels);
            if active.source.is_finished() {
                // The receiver is gone only when the pad is shutting down.
                let _ = completions.send(active.id);
                return false;
            }
            true
        });
    }

    /// Returns the number of voices in the mixer.
    pub fn active_count(&self) -> usize {
        self.sources.len()
    }

    /// Gets the number of output channels.
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Gets the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
