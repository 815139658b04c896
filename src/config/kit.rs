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
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::keys::LogicalKey;

/// The sample file each key plays unless a kit overrides it.
const DEFAULT_KEY_SOUNDS: [(char, &str); 27] = [
    (' ', "bass_drum.wav"),
    ('Q', "chimeup.wav"),
    ('W', "chimedwn.wav"),
    ('E', "crash.wav"),
    ('R', "closed_hihat.wav"),
    ('T', "open_hihat.wav"),
    ('Y', "open_hihat.wav"),
    ('U', "closed_hihat.wav"),
    ('I', "ride_crash.wav"),
    ('O', "jinglebell.wav"),
    ('P', "cowbell.wav"),
    ('A', "agogo.wav"),
    ('S', "cymbal_hard.wav"),
    ('D', "cymbal_soft.wav"),
    ('F', "snare_rim.wav"),
    ('G', "snare_drum.wav"),
    ('H', "snare_drum.wav"),
    ('J', "snare_rim.wav"),
    ('K', "cymbal_soft.wav"),
    ('L', "cymbal_hard.wav"),
    ('Z', "sticks.wav"),
    ('X', "sticks.wav"),
    ('C', "tom1.wav"),
    ('V', "tom2.wav"),
    ('B', "tom3.wav"),
    ('N', "tom2.wav"),
    ('M', "tom1.wav"),
];

/// The key to sample file map used when the config doesn't provide one.
pub fn default_key_sounds() -> BTreeMap<LogicalKey, String> {
    DEFAULT_KEY_SOUNDS
        .iter()
        .filter_map(|(c, file)| {
            LogicalKey::from_char(*c)
                .ok()
                .map(|key| (key, file.to_string()))
        })
        .collect()
}

/// The kits available when the config doesn't list any.
pub fn default_kits() -> Vec<Kit> {
    vec![
        Kit::new("classic", "maple"),
        Kit::new("jazz", "jazz"),
        Kit::new("electronic", "electronic"),
    ]
}

/// A YAML representation of a kit: a named directory of samples.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Kit {
    /// The name shown when selecting the kit.
    name: String,

    /// The directory holding the kit's samples, relative to the sounds root.
    directory: String,

    /// Per-key sample files that replace the default key map for this kit.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    keys: BTreeMap<LogicalKey, String>,
}

impl Kit {
    /// Creates a kit that uses the default key map.
    pub fn new(name: &str, directory: &str) -> Kit {
        Kit {
            name: name.to_string(),
            directory: directory.to_string(),
            keys: BTreeMap::new(),
        }
    }

    /// Gets the kit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the kit directory.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Resolves the sample file for every key, with this kit's overrides
    /// taking precedence over the given defaults.
    pub fn files(&self, defaults: &BTreeMap<LogicalKey, String>) -> BTreeMap<LogicalKey, String> {
        let mut files = defaults.clone();
        for (key, file) in &self.keys {
            files.insert(*key, file.clone());
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_sounds_cover_alphabet() {
        let sounds = default_key_sounds();
        assert_eq!(sounds.len(), 27);
        for key in LogicalKey::all() {
            assert!(sounds.contains_key(&key), "missing {}", key);
        }
        assert_eq!(sounds[&LogicalKey::BASS_DRUM], "bass_drum.wav");
    }

    #[test]
    fn test_kit_overrides() {
        let snare = LogicalKey::from_char('G').unwrap();
        let kit: Kit = serde_yml::from_str(
            "name: electronic\ndirectory: electronic\nkeys:\n  g: clap.wav\n",
        )
        .unwrap();

        let files = kit.files(&default_key_sounds());
        assert_eq!(files.len(), 27);
        assert_eq!(files[&snare], "clap.wav");
        assert_eq!(files[&LogicalKey::from_char('H').unwrap()], "snare_drum.wav");
    }
}
