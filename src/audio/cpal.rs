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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info, span, Level};

use crate::audio::mixer::{ActiveSource, AudioMixer};
use crate::audio::{CompletionSender, Device as AudioDevice};
use crate::config;

/// The name that selects the host's default output device.
const DEFAULT_DEVICE: &str = "default";

/// A small wrapper around a cpal::Device. Owns the output stream once the
/// device has been opened for playback.
pub struct Device {
    /// The name of the device.
    name: String,
    /// The maximum number of output channels.
    max_channels: u16,
    /// The host ID of the device.
    host_id: cpal::HostId,
    /// The underlying cpal device.
    device: cpal::Device,
    /// The rate the output stream runs at.
    sample_rate: u32,
    /// The running output. Listed devices have none.
    output_manager: Option<OutputManager>,
}

/// Owns the thread that keeps the output stream alive. New voices are sent to
/// the mixer inside the stream callback.
struct OutputManager {
    /// Channel for handing new voices to the stream callback.
    source_tx: crossbeam_channel::Sender<ActiveSource>,
    /// Set when the stream should be torn down.
    shutdown: Arc<AtomicBool>,
    /// Handle to the output thread (keeps it alive).
    output_thread: Option<thread::JoinHandle<()>>,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name,
            self.max_channels,
            self.host_id.name()
        )
    }
}

impl Drop for OutputManager {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.output_thread.take() {
            thread.thread().unpark();
            let _ = thread.join();
        }
    }
}

impl OutputManager {
    /// Starts the output thread that creates and owns the cpal stream. Returns
    /// once the stream is playing or has failed to start.
    fn start(
        device: cpal::Device,
        stream_config: cpal::StreamConfig,
        sample_format: cpal::SampleFormat,
        completions: CompletionSender,
    ) -> Result<OutputManager, Box<dyn Error>> {
        let (source_tx, source_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mixer = AudioMixer::new(
            stream_config.channels,
            stream_config.sample_rate.0,
            completions,
        );

        let output_thread = {
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                let span = span!(Level::INFO, "output stream");
                let _enter = span.enter();

                let stream =
                    match build_stream(&device, &stream_config, sample_format, mixer, source_rx) {
                        Ok(stream) => stream,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }

                info!(
                    channels = stream_config.channels,
                    sample_rate = stream_config.sample_rate.0,
                    "Output stream started."
                );
                let _ = ready_tx.send(Ok(()));

                // Keep the stream alive until the device is dropped.
                while !shutdown.load(Ordering::Acquire) {
                    thread::park_timeout(Duration::from_millis(100));
                }
                debug!("Output stream stopped.");
            })
        };

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(OutputManager {
                source_tx,
                shutdown,
                output_thread: Some(output_thread),
            }),
            Ok(Err(e)) => {
                let _ = output_thread.join();
                Err(format!("unable to start output stream: {}", e).into())
            }
            Err(_) => Err("output thread exited before the stream started".into()),
        }
    }

    /// Hands a new voice to the stream callback.
    fn add_source(&self, source: ActiveSource) -> Result<(), Box<dyn Error>> {
        self.source_tx.send(source)?;
        Ok(())
    }
}

/// Builds an output stream for the device's native sample format.
fn build_stream(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    mixer: AudioMixer,
    source_rx: crossbeam_channel::Receiver<ActiveSource>,
) -> Result<cpal::Stream, Box<dyn Error>> {
    let stream = match sample_format {
        cpal::SampleFormat::F32 => {
            build_typed_stream::<f32>(device, stream_config, mixer, source_rx)?
        }
        cpal::SampleFormat::I16 => {
            build_typed_stream::<i16>(device, stream_config, mixer, source_rx)?
        }
        cpal::SampleFormat::I32 => {
            build_typed_stream::<i32>(device, stream_config, mixer, source_rx)?
        }
        cpal::SampleFormat::U16 => {
            build_typed_stream::<u16>(device, stream_config, mixer, source_rx)?
        }
        other => return Err(format!("unsupported sample format {:?}", other).into()),
    };
    Ok(stream)
}

/// Mixes in f32 and converts into the output type.
fn build_typed_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    mut mixer: AudioMixer,
    source_rx: crossbeam_channel::Receiver<ActiveSource>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut scratch: Vec<f32> = Vec::new();
    device.build_output_stream(
        stream_config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            while let Ok(source) = source_rx.try_recv() {
                mixer.add_source(source);
            }

            scratch.resize(data.len(), 0.0);
            mixer.process_into(&mut scratch);
            for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                *dst = T::from_sample(src);
            }
        },
        |err| error!(err = err.to_string(), "Output stream error."),
        None,
    )
}

impl Device {
    /// Lists cpal devices and produces the Device trait.
    pub fn list() -> Result<Vec<Box<dyn AudioDevice>>, Box<dyn Error>> {
        Ok(Device::list_cpal_devices()?
            .into_iter()
            .map(|device| {
                let device: Box<dyn AudioDevice> = Box::new(device);
                device
            })
            .collect())
    }

    /// Lists cpal output devices.
    fn list_cpal_devices() -> Result<Vec<Device>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<Device> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                if let Some(device) = Device::from_cpal(host_id, device) {
                    devices.push(device);
                }
            }
        }

        devices.sort_by_key(|device| device.name.to_string());
        Ok(devices)
    }

    /// Wraps a cpal device that has at least one output channel.
    fn from_cpal(host_id: cpal::HostId, device: cpal::Device) -> Option<Device> {
        let max_channels = device
            .supported_output_configs()
            .ok()?
            .map(|config| config.channels())
            .max()
            .unwrap_or(0);
        if max_channels == 0 {
            return None;
        }

        Some(Device {
            name: device.name().ok()?,
            max_channels,
            host_id,
            device,
            sample_rate: 0,
            output_manager: None,
        })
    }

    /// Gets the given cpal device and starts its output stream at the
    /// device's own rate.
    pub fn get(
        config: &config::Audio,
        completions: CompletionSender,
    ) -> Result<Device, Box<dyn Error>> {
        let name = config.device();
        let device = if name == DEFAULT_DEVICE {
            let host = cpal::default_host();
            host.default_output_device()
                .and_then(|device| Device::from_cpal(host.id(), device))
        } else {
            Device::list_cpal_devices()?
                .into_iter()
                .find(|device| device.name.trim() == name)
        };

        let mut device = match device {
            Some(device) => device,
            None => return Err(format!("no device found with name {}", name).into()),
        };

        let default_config = device.device.default_output_config()?;
        let stream_config = stream_config(&default_config);
        let sample_rate = stream_config.sample_rate.0;

        device.output_manager = Some(OutputManager::start(
            device.device.clone(),
            stream_config,
            default_config.sample_format(),
            completions,
        )?);
        device.sample_rate = sample_rate;

        info!(device = device.name, sample_rate = device.sample_rate, "Opened audio device.");
        Ok(device)
    }
}

impl AudioDevice for Device {
    fn play(&self, source: ActiveSource) -> Result<(), Box<dyn Error>> {
        match &self.output_manager {
            Some(output_manager) => output_manager.add_source(source),
            None => Err(format!("device {} has no running output", self.name).into()),
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// The stream settings for a device: its preferred channel count and rate.
fn stream_config(default_config: &cpal::SupportedStreamConfig) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels: default_config.channels(),
        sample_rate: default_config.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    }
}
