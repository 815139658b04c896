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

//! Held-key tracking. A key is held between its down and up events, which
//! suppresses retriggering while it stays down.

use std::collections::BTreeSet;

use crate::keys::LogicalKey;

/// The set of keys currently held down.
#[derive(Debug, Default)]
pub struct KeyStateTracker {
    held: BTreeSet<LogicalKey>,
}

impl KeyStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a key from Idle to Held. Returns false if it was already held,
    /// in which case the event must be ignored.
    pub fn press(&mut self, key: LogicalKey) -> bool {
        self.held.insert(key)
    }

    /// Moves a key from Held to Idle. Returns false if it was not held.
    pub fn release(&mut self, key: LogicalKey) -> bool {
        self.held.remove(&key)
    }

    pub fn is_held(&self, key: LogicalKey) -> bool {
        self.held.contains(&key)
    }

    /// Keys currently held, in alphabet order.
    pub fn held(&self) -> impl Iterator<Item = LogicalKey> + '_ {
        self.held.iter().copied()
    }

    /// Returns every key to Idle.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release_cycle() {
        let mut tracker = KeyStateTracker::new();
        let q = LogicalKey::from_char('q').unwrap();

        assert!(tracker.press(q));
        assert!(tracker.is_held(q));
        assert!(!tracker.press(q));

        assert!(tracker.release(q));
        assert!(!tracker.is_held(q));
        assert!(!tracker.release(q));
        assert!(tracker.press(q));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = KeyStateTracker::new();
        let q = LogicalKey::from_char('q').unwrap();

        assert!(tracker.press(q));
        assert!(tracker.press(LogicalKey::BASS_DRUM));
        assert!(tracker.release(LogicalKey::BASS_DRUM));
        assert!(tracker.is_held(q));
        assert_eq!(tracker.held().collect::<Vec<_>>(), vec![q]);

        tracker.clear();
        assert_eq!(tracker.held().count(), 0);
    }
}
