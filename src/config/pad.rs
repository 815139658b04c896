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
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use duration_string::DurationString;
use serde::{Deserialize, Serialize};

use super::audio::Audio;
use super::choke::{default_choke_groups, ChokeGroup};
use super::error::ConfigError;
use super::kit::{default_key_sounds, default_kits, Kit};
use crate::keys::LogicalKey;

/// Default maximum number of concurrent voices.
pub const DEFAULT_MAX_VOICES: usize = 64;

/// Default base volume for every key.
pub const DEFAULT_VOLUME: f32 = 0.6;

const DEFAULT_SOUNDS: &str = "sounds";
const DEFAULT_KIT: &str = "classic";
const DEFAULT_HIGHLIGHT: &str = "100ms";

/// Behavior when a held key is released.
#[derive(Deserialize, Clone, Copy, Serialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseBehavior {
    /// Immediately stop every voice the key is still playing.
    #[default]
    Stop,
    /// Let the key's voices play to completion.
    PlayToCompletion,
}

/// How kit samples are decoded when a kit is loaded.
#[derive(Deserialize, Clone, Copy, Serialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PreloadMode {
    /// Decode on a worker pool. Keys whose sample isn't ready yet are silent.
    #[default]
    Background,
    /// Decode before the kit load returns.
    Inline,
}

/// The configuration for the drum pad.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Pad {
    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,

    /// The directory holding one subdirectory per kit. Relative paths are
    /// resolved against the config file's directory.
    #[serde(default = "default_sounds")]
    sounds: PathBuf,

    /// The kit that is active at startup.
    #[serde(default = "default_kit")]
    default_kit: String,

    /// The registered kits, in selection order.
    #[serde(default = "default_kits")]
    kits: Vec<Kit>,

    /// The sample file each key plays.
    #[serde(default = "default_key_sounds")]
    keys: BTreeMap<LogicalKey, String>,

    /// Groups of keys that silence each other.
    #[serde(default = "default_choke_groups")]
    choke_groups: Vec<ChokeGroup>,

    /// Maximum number of voices playing at once.
    #[serde(default = "default_max_voices")]
    max_voices: usize,

    /// The base volume of every key at startup (0.0 to 1.0).
    #[serde(default = "default_volume")]
    default_volume: f32,

    /// Behavior when a key is released.
    #[serde(default)]
    release: ReleaseBehavior,

    /// How long a pad stays highlighted after being hit.
    #[serde(default = "default_highlight")]
    highlight: String,

    /// How kit samples are decoded.
    #[serde(default)]
    preload: PreloadMode,

    /// The directory the config was loaded from.
    #[serde(skip)]
    base_path: PathBuf,
}

fn default_sounds() -> PathBuf {
    PathBuf::from(DEFAULT_SOUNDS)
}

fn default_kit() -> String {
    DEFAULT_KIT.to_string()
}

fn default_max_voices() -> usize {
    DEFAULT_MAX_VOICES
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_highlight() -> String {
    DEFAULT_HIGHLIGHT.to_string()
}

impl Default for Pad {
    fn default() -> Self {
        Pad {
            audio: Audio::default(),
            sounds: default_sounds(),
            default_kit: default_kit(),
            kits: default_kits(),
            keys: default_key_sounds(),
            choke_groups: default_choke_groups(),
            max_voices: DEFAULT_MAX_VOICES,
            default_volume: DEFAULT_VOLUME,
            release: ReleaseBehavior::default(),
            highlight: default_highlight(),
            preload: PreloadMode::default(),
            base_path: PathBuf::new(),
        }
    }
}

impl Pad {
    /// Gets the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Gets the resolved sounds directory.
    pub fn sounds_dir(&self) -> PathBuf {
        self.base_path.join(&self.sounds)
    }

    /// Gets the name of the kit that is active at startup.
    pub fn default_kit(&self) -> &str {
        &self.default_kit
    }

    /// Gets the registered kits.
    pub fn kits(&self) -> &[Kit] {
        &self.kits
    }

    /// Gets the default key to file map.
    pub fn keys(&self) -> &BTreeMap<LogicalKey, String> {
        &self.keys
    }

    /// Gets the choke groups.
    pub fn choke_groups(&self) -> &[ChokeGroup] {
        &self.choke_groups
    }

    /// Gets the maximum number of concurrent voices.
    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Gets the starting base volume of each key.
    pub fn default_volume(&self) -> f32 {
        self.default_volume
    }

    /// Gets the release behavior.
    pub fn release(&self) -> ReleaseBehavior {
        self.release
    }

    /// Gets the preload mode.
    pub fn preload(&self) -> PreloadMode {
        self.preload
    }

    /// Returns how long a pad stays highlighted after being hit.
    pub fn highlight(&self) -> Result<Duration, ConfigError> {
        let duration = DurationString::from_string(self.highlight.clone())
            .map_err(|e| ConfigError::Duration(format!("{}: {}", self.highlight, e)))?;
        Ok(duration.into())
    }

    /// Overrides the audio device.
    pub fn set_device(&mut self, device: &str) {
        self.audio = self.audio.with_device(device);
    }

    /// Overrides the startup kit. The kit must be registered.
    pub fn set_default_kit(&mut self, kit: &str) -> Result<(), ConfigError> {
        if !self.kits.iter().any(|k| k.name() == kit) {
            return Err(ConfigError::Invalid(format!("no kit named {}", kit)));
        }
        self.default_kit = kit.to_string();
        Ok(())
    }

    /// Overrides the preload mode.
    pub fn set_preload(&mut self, preload: PreloadMode) {
        self.preload = preload;
    }

    /// Sets the directory relative paths are resolved against.
    pub(super) fn set_base_path(&mut self, base_path: &Path) {
        self.base_path = base_path.to_path_buf();
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_voices == 0 {
            return Err(ConfigError::Invalid(
                "max_voices must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(ConfigError::Invalid(format!(
                "default_volume must be between 0.0 and 1.0, got {}",
                self.default_volume
            )));
        }

        if self.kits.is_empty() {
            return Err(ConfigError::Invalid("no kits configured".to_string()));
        }

        let mut names = HashSet::new();
        for kit in &self.kits {
            if !names.insert(kit.name()) {
                return Err(ConfigError::Invalid(format!(
                    "kit {} is defined more than once",
                    kit.name()
                )));
            }

            let files = kit.files(&self.keys);
            let missing: Vec<String> = LogicalKey::all()
                .filter(|key| !files.contains_key(key))
                .map(|key| key.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "kit {} has no sample for keys {}",
                    kit.name(),
                    missing.join(", ")
                )));
            }
        }

        if !names.contains(self.default_kit.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "default kit {} is not defined",
                self.default_kit
            )));
        }

        self.highlight()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pad_is_valid() {
        let pad = Pad::default();
        assert!(pad.validate().is_ok());
        assert_eq!(pad.max_voices(), 64);
        assert_eq!(pad.default_volume(), 0.6);
        assert_eq!(pad.default_kit(), "classic");
        assert_eq!(pad.release(), ReleaseBehavior::Stop);
        assert_eq!(pad.highlight().unwrap(), Duration::from_millis(100));
        assert_eq!(
            pad.kits().iter().map(|k| k.name()).collect::<Vec<_>>(),
            vec!["classic", "jazz", "electronic"]
        );
    }

    #[test]
    fn test_empty_yaml_matches_default() {
        let pad: Pad = serde_yml::from_str("{}").unwrap();
        assert!(pad.validate().is_ok());
        assert_eq!(pad.keys().len(), 27);
        assert_eq!(pad.choke_groups(), Pad::default().choke_groups());
    }

    #[test]
    fn test_parse_pad() {
        let pad: Pad = serde_yml::from_str(
            r#"
sounds: /opt/drums
default_kit: jazz
max_voices: 16
default_volume: 0.8
release: play_to_completion
highlight: 250ms
preload: inline
kits:
  - name: jazz
    directory: jazz
choke_groups:
  - name: hats
    triggers: [r]
    choked: [t]
"#,
        )
        .unwrap();

        assert!(pad.validate().is_ok());
        assert_eq!(pad.sounds_dir(), PathBuf::from("/opt/drums"));
        assert_eq!(pad.default_kit(), "jazz");
        assert_eq!(pad.max_voices(), 16);
        assert_eq!(pad.release(), ReleaseBehavior::PlayToCompletion);
        assert_eq!(pad.preload(), PreloadMode::Inline);
        assert_eq!(pad.highlight().unwrap(), Duration::from_millis(250));
        assert_eq!(pad.choke_groups().len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let pad: Pad = serde_yml::from_str("max_voices: 0").unwrap();
        assert!(pad.validate().is_err());

        let pad: Pad = serde_yml::from_str("default_volume: 1.5").unwrap();
        assert!(pad.validate().is_err());

        let pad: Pad = serde_yml::from_str("default_kit: rock").unwrap();
        assert!(pad.validate().is_err());

        let pad: Pad = serde_yml::from_str("highlight: soon").unwrap();
        assert!(pad.validate().is_err());

        let pad: Pad = serde_yml::from_str(
            "kits:\n  - name: a\n    directory: a\n  - name: a\n    directory: b\ndefault_kit: a\n",
        )
        .unwrap();
        assert!(pad.validate().is_err());
    }

    #[test]
    fn test_validate_requires_every_key() {
        let pad: Pad = serde_yml::from_str("keys:\n  q: chime.wav\n").unwrap();
        match pad.validate() {
            Err(ConfigError::Invalid(message)) => assert!(message.contains("space")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_set_default_kit() {
        let mut pad = Pad::default();
        assert!(pad.set_default_kit("jazz").is_ok());
        assert_eq!(pad.default_kit(), "jazz");
        assert!(pad.set_default_kit("polka").is_err());
        assert_eq!(pad.default_kit(), "jazz");
    }
}
