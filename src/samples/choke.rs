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

//! Choke groups: hitting one of a group's trigger keys silences the most
//! recent voice of the group's choked keys.

use std::collections::BTreeSet;

use tracing::debug;

use super::voice::VoiceId;
use crate::config::ChokeGroup;
use crate::keys::LogicalKey;

/// Resolves choke rules and holds the one tracked voice per group.
#[derive(Debug)]
pub struct ChokeResolver {
    groups: Vec<ChokeGroup>,
    /// The most recent voice of each group's choked keys, by group index.
    tracked: Vec<Option<VoiceId>>,
}

impl ChokeResolver {
    pub fn new(groups: Vec<ChokeGroup>) -> Self {
        let tracked = vec![None; groups.len()];
        Self { groups, tracked }
    }

    /// The keys silenced when the given key is triggered.
    pub fn choked_keys(&self, key: LogicalKey) -> BTreeSet<LogicalKey> {
        self.groups
            .iter()
            .filter(|group| group.triggers().contains(&key))
            .flat_map(|group| group.choked().iter().copied())
            .collect()
    }

    /// Takes the tracked voices that triggering the key silences. The caller
    /// stops them.
    pub fn choke(&mut self, key: LogicalKey) -> Vec<VoiceId> {
        let mut choked = Vec::new();
        for (group, tracked) in self.groups.iter().zip(self.tracked.iter_mut()) {
            if !group.triggers().contains(&key) {
                continue;
            }
            if let Some(id) = tracked.take() {
                debug!(group = group.name(), key = %key, voice = %id, "Choking voice");
                choked.push(id);
            }
        }

        // A voice tracked by more than one group is gone from all of them.
        for id in &choked {
            self.forget(*id);
        }
        choked
    }

    /// Records a new voice for every group that chokes its key. The latest
    /// voice replaces any earlier one, which keeps playing.
    pub fn track(&mut self, key: LogicalKey, id: VoiceId) {
        for (group, tracked) in self.groups.iter().zip(self.tracked.iter_mut()) {
            if group.choked().contains(&key) {
                *tracked = Some(id);
            }
        }
    }

    /// Clears every reference to a voice that is no longer playing. Returns
    /// true if any group was tracking it.
    pub fn forget(&mut self, id: VoiceId) -> bool {
        let mut found = false;
        for tracked in self.tracked.iter_mut() {
            if *tracked == Some(id) {
                *tracked = None;
                found = true;
            }
        }
        found
    }

    /// The voice currently tracked by the named group.
    pub fn tracked(&self, group: &str) -> Option<VoiceId> {
        self.groups
            .iter()
            .position(|g| g.name() == group)
            .and_then(|index| self.tracked[index])
    }
}
