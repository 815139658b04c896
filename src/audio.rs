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
use std::{error::Error, fmt, sync::Arc};

use tokio::sync::mpsc;

use crate::config;
use crate::samples::VoiceId;

pub mod cpal;
pub mod mixer;
pub mod mock;
pub mod source;

pub use mixer::ActiveSource;

/// Sends the ids of voices that played to their natural end.
pub type CompletionSender = mpsc::UnboundedSender<VoiceId>;

/// Receives the ids of voices that played to their natural end.
pub type CompletionReceiver = mpsc::UnboundedReceiver<VoiceId>;

/// Creates the channel a device uses to report natural voice completions.
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    mpsc::unbounded_channel()
}

pub trait Device: fmt::Display + std::marker::Send + std::marker::Sync {
    /// Starts playing a voice. Returns once the voice has been handed to the
    /// output; playback itself is asynchronous.
    fn play(&self, source: ActiveSource) -> Result<(), Box<dyn Error>>;

    /// The rate the device mixes at. Samples are transcoded to this rate.
    fn sample_rate(&self) -> u32;
}

/// Lists devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets a device with the given configuration. Natural completions are
/// reported on the given sender.
pub fn get_device(
    config: &config::Audio,
    completions: CompletionSender,
) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(
            device,
            config.sample_rate(),
            completions,
        )));
    };

    Ok(Arc::new(cpal::Device::get(config, completions)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mock_device() {
        let (tx, _rx) = completion_channel();
        let config = config::Audio::new("mock-device");
        let device = get_device(&config, tx).unwrap();

        assert_eq!(device.to_string(), "mock-device (mock)");
        assert_eq!(device.sample_rate(), 44100);
    }
}
