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
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::keys::LogicalKey;

/// The choke groups used when the config doesn't list any: the closed hi-hat
/// keys silence the open hi-hat.
pub fn default_choke_groups() -> Vec<ChokeGroup> {
    vec![ChokeGroup::new("hihat", &['R', 'U'], &['T', 'Y'])]
}

/// A YAML representation of a choke group.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ChokeGroup {
    /// A name for logging.
    name: String,

    /// Keys that silence the group when triggered.
    triggers: BTreeSet<LogicalKey>,

    /// Keys whose most recent voice is silenced.
    choked: BTreeSet<LogicalKey>,
}

impl ChokeGroup {
    /// Creates a choke group from key characters. Characters outside the pad
    /// alphabet are skipped.
    pub fn new(name: &str, triggers: &[char], choked: &[char]) -> ChokeGroup {
        let keys = |chars: &[char]| {
            chars
                .iter()
                .filter_map(|c| LogicalKey::from_char(*c).ok())
                .collect()
        };
        ChokeGroup {
            name: name.to_string(),
            triggers: keys(triggers),
            choked: keys(choked),
        }
    }

    /// Gets the group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the keys that choke this group.
    pub fn triggers(&self) -> &BTreeSet<LogicalKey> {
        &self.triggers
    }

    /// Gets the keys that get choked.
    pub fn choked(&self) -> &BTreeSet<LogicalKey> {
        &self.choked
    }
}
