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
use std::path::Path;

use config::{Config, File};
use tracing::info;

mod audio;
mod choke;
mod error;
mod kit;
mod pad;

pub use audio::Audio;
pub use choke::ChokeGroup;
pub use error::ConfigError;
pub use kit::{default_key_sounds, Kit};
pub use pad::{Pad, PreloadMode, ReleaseBehavior, DEFAULT_MAX_VOICES, DEFAULT_VOLUME};

/// Parses and validates a pad configuration from a YAML file. Relative paths
/// inside the file are resolved against the file's directory.
pub fn load_pad(path: &Path) -> Result<Pad, ConfigError> {
    let mut pad = Config::builder()
        .add_source(File::from(path))
        .build()?
        .try_deserialize::<Pad>()?;

    if let Some(parent) = path.parent() {
        pad.set_base_path(parent);
    }
    pad.validate()?;

    info!(
        path = ?path,
        kits = pad.kits().len(),
        default_kit = pad.default_kit(),
        "Loaded pad configuration"
    );
    Ok(pad)
}

/// Parses a pad configuration without validating it.
pub fn parse_pad(contents: &str) -> Result<Pad, serde_yml::Error> {
    // An empty file means "all defaults".
    if contents.trim().is_empty() {
        return Ok(Pad::default());
    }
    serde_yml::from_str(contents)
}

/// Renders a pad configuration as YAML.
pub fn render_pad(pad: &Pad) -> Result<String, serde_yml::Error> {
    serde_yml::to_string(pad)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::keys::LogicalKey;

    #[test]
    fn test_load_pad_resolves_sounds_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drumpad.yaml");
        fs::write(&path, "sounds: samples\ndefault_kit: jazz\n").unwrap();

        let pad = load_pad(&path).unwrap();
        assert_eq!(pad.sounds_dir(), dir.path().join("samples"));
        assert_eq!(pad.default_kit(), "jazz");
    }

    #[test]
    fn test_load_pad_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(load_pad(&missing), Err(ConfigError::Load(_))));

        let broken = dir.path().join("broken.yaml");
        fs::write(&broken, "max_voices: [1, 2").unwrap();
        assert!(matches!(load_pad(&broken), Err(ConfigError::Load(_))));

        let mistyped = dir.path().join("mistyped.yaml");
        fs::write(&mistyped, "release: sometimes\n").unwrap();
        assert!(matches!(load_pad(&mistyped), Err(ConfigError::Load(_))));

        let invalid = dir.path().join("invalid.yaml");
        fs::write(&invalid, "max_voices: 0\n").unwrap();
        assert!(matches!(load_pad(&invalid), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_pad_kit_keys_and_choke_groups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drumpad.yaml");
        fs::write(
            &path,
            "default_kit: rock\n\
             kits:\n  - name: rock\n    directory: rock\n    keys:\
             \n      q: chime.wav\n      space: kick.wav\n\
             choke_groups:\n  - name: cymbals\n    triggers: [k]\n    choked: [s, d]\n\
             release: play_to_completion\n",
        )
        .unwrap();

        let pad = load_pad(&path).unwrap();
        let files = pad.kits()[0].files(pad.keys());
        let q = LogicalKey::from_char('q').unwrap();
        assert_eq!(files.get(&q).map(String::as_str), Some("chime.wav"));
        assert_eq!(
            files.get(&LogicalKey::BASS_DRUM).map(String::as_str),
            Some("kick.wav")
        );
        assert_eq!(pad.choke_groups().len(), 1);
        assert_eq!(pad.release(), ReleaseBehavior::PlayToCompletion);
    }

    #[test]
    fn test_empty_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        fs::write(&path, "").unwrap();

        let pad = load_pad(&path).unwrap();
        assert_eq!(pad.sounds_dir(), dir.path().join(PathBuf::from("sounds")));
        assert_eq!(pad.max_voices(), DEFAULT_MAX_VOICES);
    }

    #[test]
    fn test_render_then_parse() {
        let rendered = render_pad(&Pad::default()).unwrap();
        let parsed = parse_pad(&rendered).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.keys(), Pad::default().keys());
        assert_eq!(parsed.kits().len(), 3);
    }
}
