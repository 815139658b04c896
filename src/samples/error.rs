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
use std::path::PathBuf;

use crate::keys::LogicalKey;

/// Errors raised while decoding a sample file.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unable to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to decode {path}: {source}")]
    Audio {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("no audio track found in {0}")]
    NoTrack(PathBuf),

    #[error("unable to determine the format of {0}")]
    UnknownFormat(PathBuf),
}

/// Errors raised while loading a kit's samples.
#[derive(Debug, thiserror::Error)]
pub enum ResourceLoadError {
    #[error("unknown kit {0}")]
    UnknownKit(String),

    #[error("kit {kit} is missing samples for keys {}", join_keys(.keys))]
    MissingSamples { kit: String, keys: Vec<LogicalKey> },

    #[error("sample {0} does not exist")]
    MissingFile(PathBuf),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

fn join_keys(keys: &[LogicalKey]) -> String {
    keys.iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
