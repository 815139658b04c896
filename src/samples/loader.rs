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

//! Sample loading and caching for pad samples.
//!
//! Samples are decoded entirely into memory so a hit never waits on disk.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::RwLock;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use super::error::{DecodeError, ResourceLoadError};
use crate::audio::source::VoiceSource;
use crate::config::PreloadMode;

/// A loaded sample that can be played back.
/// The sample data is stored in an Arc so every voice shares one decoded copy.
#[derive(Clone, Debug)]
pub struct LoadedSample {
    /// The sample data as f32 samples (interleaved if multi-channel).
    data: Arc<Vec<f32>>,
    /// Number of channels in the sample.
    channel_count: u16,
    /// Sample rate of the audio data.
    sample_rate: u32,
}

impl LoadedSample {
    /// Wraps already decoded interleaved samples.
    pub fn new(data: Vec<f32>, channel_count: u16, sample_rate: u32) -> Self {
        Self {
            data: Arc::new(data),
            channel_count: channel_count.max(1),
            sample_rate,
        }
    }

    /// Creates an independent playback source at the given volume. The
    /// decoded data is shared, the playback position is not.
    pub fn create_source(&self, volume: f32) -> VoiceSource {
        VoiceSource::new(self.data.clone(), self.channel_count, volume)
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// Returns the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of frames.
    pub fn frames(&self) -> usize {
        self.data.len() / self.channel_count as usize
    }

    /// Returns the playback length.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate.max(1) as f64)
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Returns true if both samples share the same decoded data.
    pub fn shares_data_with(&self, other: &LoadedSample) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

/// The state of a sample that may still be decoding.
pub enum PreloadStatus<'a> {
    /// The sample is still being decoded.
    Pending,
    /// The sample can be played.
    Ready(&'a LoadedSample),
    /// The sample could not be loaded.
    Failed(&'a ResourceLoadError),
}

/// A handle to a sample that is decoded in the background. The result is set
/// exactly once.
#[derive(Clone, Default)]
pub struct PreloadHandle {
    state: Arc<OnceLock<Result<LoadedSample, ResourceLoadError>>>,
}

impl PreloadHandle {
    /// A handle whose sample is already available.
    pub fn ready(sample: LoadedSample) -> Self {
        let handle = PreloadHandle::default();
        handle.settle(Ok(sample));
        handle
    }

    /// A handle that failed to load.
    pub fn failed(error: ResourceLoadError) -> Self {
        let handle = PreloadHandle::default();
        handle.settle(Err(error));
        handle
    }

    /// Records the outcome of loading. Later outcomes are ignored.
    fn settle(&self, result: Result<LoadedSample, ResourceLoadError>) {
        if self.state.set(result).is_err() {
            debug!("Preload handle already settled");
        }
    }

    /// Returns the current status.
    pub fn status(&self) -> PreloadStatus<'_> {
        match self.state.get() {
            None => PreloadStatus::Pending,
            Some(Ok(sample)) => PreloadStatus::Ready(sample),
            Some(Err(e)) => PreloadStatus::Failed(e),
        }
    }

    /// Returns the sample if it has finished loading.
    pub fn sample(&self) -> Option<&LoadedSample> {
        match self.status() {
            PreloadStatus::Ready(sample) => Some(sample),
            _ => None,
        }
    }

    /// Returns true once loading has either succeeded or failed.
    pub fn is_settled(&self) -> bool {
        self.state.get().is_some()
    }
}

impl std::fmt::Debug for PreloadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self.status() {
            PreloadStatus::Pending => "pending",
            PreloadStatus::Ready(_) => "ready",
            PreloadStatus::Failed(_) => "failed",
        };
        f.debug_struct("PreloadHandle").field("status", &status).finish()
    }
}

/// Manages loading and caching of sample data. Shared between the registry and
/// the background decode pool.
pub struct SampleLoader {
    /// Cache of loaded samples by file path.
    cache: RwLock<HashMap<PathBuf, LoadedSample>>,
    /// Target sample rate for transcoding (matches audio output).
    target_sample_rate: u32,
}

impl SampleLoader {
    /// Creates a new sample loader.
    pub fn new(target_sample_rate: u32) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            target_sample_rate,
        }
    }

    /// Returns the sample rate samples are converted to.
    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Starts loading a sample. Inline mode decodes before returning,
    /// background mode hands the work to the rayon pool.
    pub fn preload(self: &Arc<Self>, path: &Path, mode: PreloadMode) -> PreloadHandle {
        if let Some(sample) = self.cached(path) {
            return PreloadHandle::ready(sample);
        }

        match mode {
            PreloadMode::Inline => match self.load(path) {
                Ok(sample) => PreloadHandle::ready(sample),
                Err(e) => {
                    warn!(path = ?path, error = %e, "Failed to load sample");
                    PreloadHandle::failed(e.into())
                }
            },
            PreloadMode::Background => {
                let handle = PreloadHandle::default();
                let loader = Arc::clone(self);
                let path = path.to_path_buf();
                let settled = handle.clone();
                rayon::spawn(move || {
                    let result = loader.load(&path).map_err(|e| {
                        warn!(path = ?path, error = %e, "Failed to load sample");
                        ResourceLoadError::from(e)
                    });
                    settled.settle(result);
                });
                handle
            }
        }
    }

    /// Returns the cached sample for a path, if any.
    fn cached(&self, path: &Path) -> Option<LoadedSample> {
        self.cache.read().get(path).cloned()
    }

    /// Loads a sample from a file into memory.
    /// Returns a cached version if already loaded. Failures are not cached so
    /// the next kit load retries them.
    pub fn load(&self, path: &Path) -> Result<LoadedSample, DecodeError> {
        if let Some(sample) = self.cached(path) {
            debug!(path = ?path, "Using cached sample");
            return Ok(sample);
        }

        info!(path = ?path, "Loading sample into memory");

        let (samples, channel_count, source_sample_rate) = decode_file(path)?;

        // Transcode if sample rate doesn't match
        let (final_samples, final_sample_rate) = if source_sample_rate != self.target_sample_rate
        {
            info!(
                source_rate = source_sample_rate,
                target_rate = self.target_sample_rate,
                "Transcoding sample"
            );
            let transcoded = transcode_samples(
                &samples,
                channel_count,
                source_sample_rate,
                self.target_sample_rate,
            );
            (transcoded, self.target_sample_rate)
        } else {
            (samples, source_sample_rate)
        };

        let loaded = LoadedSample::new(final_samples, channel_count, final_sample_rate);

        info!(
            path = ?path,
            channels = channel_count,
            sample_rate = final_sample_rate,
            duration_ms = loaded.duration().as_millis(),
            memory_kb = loaded.memory_size() / 1024,
            "Sample loaded"
        );

        // Two loads of the same file can race on the pool; keep whichever
        // landed first so every handle shares one copy.
        let mut cache = self.cache.write();
        let loaded = cache.entry(path.to_path_buf()).or_insert(loaded).clone();

        Ok(loaded)
    }

    /// Returns the total memory used by cached samples.
    pub fn total_memory_usage(&self) -> usize {
        self.cache.read().values().map(|s| s.memory_size()).sum()
    }
}

impl std::fmt::Debug for SampleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleLoader")
            .field("cached_samples", &self.cache.read().len())
            .field("target_sample_rate", &self.target_sample_rate)
            .field("total_memory_kb", &(self.total_memory_usage() / 1024))
            .finish()
    }
}

/// Decodes a whole file into interleaved f32 samples.
/// Returns the samples, the channel count and the sample rate.
fn decode_file(path: &Path) -> Result<(Vec<f32>, u16, u32), DecodeError> {
    let audio_error = |source| DecodeError::Audio {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create a hint to help the format registry guess the format
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(audio_error)?;
    let mut format_reader = probed.format;

    let (track_id, params) = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| DecodeError::NoTrack(path.to_path_buf()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(audio_error)?;

    let mut sample_rate = params.sample_rate;
    let mut channel_count = params.channels.map(|c| c.count() as u16);
    let mut samples = Vec::new();

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(audio_error(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                // A corrupt packet drops a few milliseconds, not the sample.
                warn!(path = ?path, error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(audio_error(e)),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channel_count.get_or_insert(spec.channels.count() as u16);

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    match (channel_count, sample_rate) {
        (Some(channels), Some(rate)) if channels > 0 && rate > 0 => Ok((samples, channels, rate)),
        _ => Err(DecodeError::UnknownFormat(path.to_path_buf())),
    }
}

/// Transcodes samples from one sample rate to another using linear interpolation.
/// Linear interpolation is sufficient for drum hits and one-shots.
fn transcode_samples(
    samples: &[f32],
    channel_count: u16,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let ratio = target_rate as f64 / source_rate as f64;
    let channels = channel_count.max(1) as usize;
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);

    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let idx0 = source_frame * channels + channel;
            let idx1 = (source_frame + 1) * channels + channel;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);

            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}
