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
use std::{error::Error, fmt};

use parking_lot::Mutex;
use tracing::debug;

use crate::audio::mixer::{ActiveSource, AudioMixer};
use crate::audio::CompletionSender;
use crate::playsync::CancelHandle;
use crate::samples::VoiceId;

/// The mock device mixes in mono.
const MOCK_CHANNELS: u16 = 1;

/// A record of a voice handed to the mock device.
#[derive(Clone, Debug)]
pub struct PlayedVoice {
    /// The voice id.
    pub id: VoiceId,
    /// The volume the voice was started at.
    pub volume: f32,
    /// The voice's cancel handle.
    pub cancel_handle: CancelHandle,
}

/// A mock device. Doesn't output anything, but mixes on demand so tests can
/// drive playback and completions deterministically.
pub struct Device {
    name: String,
    sample_rate: u32,
    mixer: Mutex<AudioMixer>,
    played: Mutex<Vec<PlayedVoice>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str, sample_rate: u32, completions: CompletionSender) -> Device {
        Device {
            name: name.to_string(),
            sample_rate,
            mixer: Mutex::new(AudioMixer::new(MOCK_CHANNELS, sample_rate, completions)),
            played: Mutex::new(Vec::new()),
        }
    }

    /// Mixes the given number of frames. Voices that run out are reported as
    /// completed.
    pub fn render(&self, frames: usize) -> Vec<f32> {
        let mut output = vec![0.0; frames * MOCK_CHANNELS as usize];
        self.mixer.lock().process_into(&mut output);
        output
    }

    /// The number of voices started on the device.
    pub fn play_count(&self) -> usize {
        self.played.lock().len()
    }

    /// Returns the record for the given voice.
    pub fn voice(&self, id: VoiceId) -> Option<PlayedVoice> {
        self.played.lock().iter().find(|v| v.id == id).cloned()
    }

    /// Returns true if the given voice has been cancelled.
    pub fn is_stopped(&self, id: VoiceId) -> bool {
        self.voice(id)
            .map(|voice| voice.cancel_handle.is_cancelled())
            .unwrap_or(false)
    }

    /// The number of voices still in the mixer.
    pub fn active_count(&self) -> usize {
        self.mixer.lock().active_count()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (mock)", self.name)
    }
}

impl crate::audio::Device for Device {
    fn play(&self, source: ActiveSource) -> Result<(), Box<dyn Error>> {
        debug!(
            device = self.name,
            voice = %source.id,
            volume = source.source.volume(),
            "Playing voice (mock)."
        );

        self.played.lock().push(PlayedVoice {
            id: source.id,
            volume: source.source.volume(),
            cancel_handle: source.cancel_handle.clone(),
        });
        self.mixer.lock().add_source(source);
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::audio::{completion_channel, source::VoiceSource, Device as _};

    #[test]
    fn test_render_reports_completion() {
        let (tx, mut rx) = completion_channel();
        let device = Device::get("mock", 44100, tx);
        let id = VoiceId::next();
        device
            .play(ActiveSource {
                id,
                source: VoiceSource::new(Arc::new(vec![0.5; 4]), 1, 0.5),
                cancel_handle: CancelHandle::new(),
            })
            .unwrap();

        assert_eq!(device.play_count(), 1);
        assert_eq!(device.voice(id).unwrap().volume, 0.5);

        let output = device.render(8);
        assert_eq!(&output[..4], &[0.25; 4]);
        assert_eq!(&output[4..], &[0.0; 4]);
        assert_eq!(rx.try_recv().unwrap(), id);
        assert_eq!(device.active_count(), 0);
    }
}
