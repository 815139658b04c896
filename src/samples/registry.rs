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

//! The mapping from logical key to sample resource for the active kit.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::error::ResourceLoadError;
use super::loader::{PreloadHandle, PreloadStatus, SampleLoader};
use crate::config::{Pad, PreloadMode};
use crate::keys::{LogicalKey, UnknownKeyError};

/// A registered kit with its sample file resolved for every key.
#[derive(Clone, Debug)]
pub struct KitDefinition {
    name: String,
    directory: PathBuf,
    files: BTreeMap<LogicalKey, String>,
}

impl KitDefinition {
    /// Creates a kit definition.
    pub fn new(name: &str, directory: PathBuf, files: BTreeMap<LogicalKey, String>) -> Self {
        Self {
            name: name.to_string(),
            directory,
            files,
        }
    }

    /// Builds the definitions for every kit in a pad configuration.
    pub fn from_pad(pad: &Pad) -> Vec<KitDefinition> {
        let sounds_dir = pad.sounds_dir();
        pad.kits()
            .iter()
            .map(|kit| {
                KitDefinition::new(
                    kit.name(),
                    sounds_dir.join(kit.directory()),
                    kit.files(pad.keys()),
                )
            })
            .collect()
    }

    /// Gets the kit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the sample file for a key, if the kit has one.
    pub fn file(&self, key: LogicalKey) -> Option<&str> {
        self.files.get(&key).map(String::as_str)
    }

    /// Gets the full path of the sample for a key.
    pub fn path(&self, key: LogicalKey) -> Option<PathBuf> {
        self.file(key).map(|file| self.directory.join(file))
    }
}

/// Where a sample resource came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleLocator {
    pub kit: String,
    pub file: String,
}

impl fmt::Display for SampleLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kit, self.file)
    }
}

/// The entry for one key: its sample, how far loading has come, and the
/// volume new voices of the key start at.
#[derive(Clone, Debug)]
pub struct SampleResource {
    locator: SampleLocator,
    preload: PreloadHandle,
    volume: f32,
}

impl SampleResource {
    /// Gets the locator.
    pub fn locator(&self) -> &SampleLocator {
        &self.locator
    }

    /// Gets the preload handle.
    pub fn preload(&self) -> &PreloadHandle {
        &self.preload
    }

    /// Gets the base volume (0.0 to 1.0).
    pub fn volume(&self) -> f32 {
        self.volume
    }
}

/// Owns the sample resources of the active kit. Reloaded on kit switch.
pub struct SampleRegistry {
    loader: Arc<SampleLoader>,
    kits: Vec<KitDefinition>,
    preload_mode: PreloadMode,
    default_volume: f32,
    active: Option<usize>,
    resources: BTreeMap<LogicalKey, SampleResource>,
}

impl SampleRegistry {
    /// Creates an empty registry. No kit is active until `load` is called.
    pub fn new(
        kits: Vec<KitDefinition>,
        loader: Arc<SampleLoader>,
        preload_mode: PreloadMode,
        default_volume: f32,
    ) -> Self {
        Self {
            loader,
            kits,
            preload_mode,
            default_volume: default_volume.clamp(0.0, 1.0),
            active: None,
            resources: BTreeMap::new(),
        }
    }

    /// Makes the named kit active and starts preloading every sample in it.
    ///
    /// An unknown kit leaves the registry untouched. Otherwise every key's
    /// resource is replaced; keys whose file is missing get a failed handle
    /// and are listed in the returned `MissingSamples` error. Base volumes
    /// carry over from the previous kit.
    pub fn load(&mut self, kit: &str) -> Result<(), ResourceLoadError> {
        let index = self
            .kits
            .iter()
            .position(|definition| definition.name == kit)
            .ok_or_else(|| ResourceLoadError::UnknownKit(kit.to_string()))?;
        let definition = &self.kits[index];

        let mut missing = Vec::new();
        let mut resources = BTreeMap::new();
        for key in LogicalKey::all() {
            let volume = self
                .resources
                .get(&key)
                .map(|resource| resource.volume)
                .unwrap_or(self.default_volume);
            let file = definition.file(key).unwrap_or_default().to_string();

            let preload = match definition.path(key) {
                Some(path) if path.is_file() => self.loader.preload(&path, self.preload_mode),
                Some(path) => {
                    missing.push(key);
                    PreloadHandle::failed(ResourceLoadError::MissingFile(path))
                }
                None => {
                    missing.push(key);
                    PreloadHandle::failed(ResourceLoadError::MissingFile(
                        definition.directory.clone(),
                    ))
                }
            };

            resources.insert(
                key,
                SampleResource {
                    locator: SampleLocator {
                        kit: definition.name.clone(),
                        file,
                    },
                    preload,
                    volume,
                },
            );
        }

        self.resources = resources;
        self.active = Some(index);
        info!(kit, missing = missing.len(), "Kit loaded");

        if missing.is_empty() {
            Ok(())
        } else {
            warn!(kit, keys = ?missing, "Kit is missing samples");
            Err(ResourceLoadError::MissingSamples {
                kit: kit.to_string(),
                keys: missing,
            })
        }
    }

    /// Gets the resource for a key. Returns None only before a kit has been
    /// loaded.
    pub fn get(&self, key: LogicalKey) -> Option<&SampleResource> {
        self.resources.get(&key)
    }

    /// Normalizes a raw input and gets its resource.
    pub fn lookup(&self, input: &str) -> Result<Option<&SampleResource>, UnknownKeyError> {
        let key = LogicalKey::from_input(input)?;
        Ok(self.get(key))
    }

    /// Sets a key's base volume. Values outside 0.0 to 1.0 are clamped.
    pub fn set_volume(&mut self, key: LogicalKey, volume: f32) {
        let volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        if let Some(resource) = self.resources.get_mut(&key) {
            resource.volume = volume;
        }
    }

    /// Sets a key's base volume from a 0 to 100 percentage.
    pub fn set_volume_percent(&mut self, key: LogicalKey, percent: u8) {
        self.set_volume(key, f32::from(percent) / 100.0);
    }

    /// Sets every key's base volume from a 0 to 100 percentage.
    pub fn set_all_volumes_percent(&mut self, percent: u8) {
        let volume = (f32::from(percent) / 100.0).clamp(0.0, 1.0);
        self.default_volume = volume;
        for resource in self.resources.values_mut() {
            resource.volume = volume;
        }
    }

    /// The names of every registered kit, in configuration order.
    pub fn kits(&self) -> impl Iterator<Item = &str> {
        self.kits.iter().map(|kit| kit.name.as_str())
    }

    /// The number of registered kits.
    pub fn kit_count(&self) -> usize {
        self.kits.len()
    }

    /// The name of the kit at the given position.
    pub fn kit_name(&self, index: usize) -> Option<&str> {
        self.kits.get(index).map(|kit| kit.name.as_str())
    }

    /// The name of the active kit.
    pub fn active_kit(&self) -> Option<&str> {
        self.active.map(|index| self.kits[index].name.as_str())
    }

    /// The position of the active kit.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Returns true once every resource has finished loading or failed.
    pub fn is_fully_loaded(&self) -> bool {
        !self.resources.is_empty()
            && self
                .resources
                .values()
                .all(|resource| resource.preload.is_settled())
    }

    /// The keys whose samples failed to load.
    pub fn failed_keys(&self) -> Vec<LogicalKey> {
        self.resources
            .iter()
            .filter(|(_, resource)| matches!(resource.preload.status(), PreloadStatus::Failed(_)))
            .map(|(key, _)| *key)
            .collect()
    }

    /// Gets the loader shared by every kit.
    pub fn loader(&self) -> &Arc<SampleLoader> {
        &self.loader
    }

    /// Swaps the preload handle of a key, keeping its locator and volume.
    #[cfg(test)]
    pub(crate) fn replace_preload(&mut self, key: LogicalKey, preload: PreloadHandle) {
        if let Some(resource) = self.resources.get_mut(&key) {
            resource.preload = preload;
        }
    }
}
