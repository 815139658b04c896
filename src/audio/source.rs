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
use std::sync::Arc;

/// One playback instance of a loaded sample. The decoded data is shared
/// between every voice of a key; position and volume belong to this source.
pub struct VoiceSource {
    /// Interleaved sample data.
    data: Arc<Vec<f32>>,
    /// Number of channels in the data.
    channel_count: u16,
    /// Current position in frames.
    position: usize,
    /// Volume snapshot taken when the voice was spawned.
    volume: f32,
}

impl VoiceSource {
    /// Creates a source positioned at the start of the data.
    pub fn new(data: Arc<Vec<f32>>, channel_count: u16, volume: f32) -> Self {
        Self {
            data,
            channel_count: channel_count.max(1),
            position: 0,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    /// Returns the volume this source plays at.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Returns the current position in frames.
    pub fn position(&self) -> usize {
        self.position
    }

    fn total_frames(&self) -> usize {
        self.data.len() / self.channel_count as usize
    }

    /// Returns true once every frame has been played.
    pub fn is_finished(&self) -> bool {
        self.position >= self.total_frames()
    }

    /// Adds this source into an interleaved output buffer with the given
    /// number of channels. Mono sources feed every output channel, wider
    /// sources feed matching channels only. Returns the number of frames mixed.
    pub fn mix_into(&mut self, output: &mut [f32], output_channels: u16) -> usize {
        let out_channels = output_channels.max(1) as usize;
        let src_channels = self.channel_count as usize;
        let remaining = self.total_frames().saturating_sub(self.position);
        let frames = (output.len() / out_channels).min(remaining);

        for frame in 0..frames {
            let src_base = (self.position + frame) * src_channels;
            let out_base = frame * out_channels;
            for out_ch in 0..out_channels {
                let src_ch = if src_channels == 1 {
                    0
                } else if out_ch < src_channels {
                    out_ch
                } else {
                    continue;
                };
                output[out_base + out_ch] += self.data[src_base + src_ch] * self.volume;
            }
        }

        self.position += frames;
        frames
    }
}
