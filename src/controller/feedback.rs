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
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::keys::LogicalKey;
use crate::samples::FeedbackHook;

/// Briefly lights a pad after it is hit. Shared between the engine, which
/// lights keys, and the driver, which draws them.
#[derive(Clone, Debug)]
pub struct Highlights {
    duration: Duration,
    until: Arc<Mutex<HashMap<LogicalKey, Instant>>>,
}

impl Highlights {
    pub fn new(duration: Duration) -> Highlights {
        Highlights {
            duration,
            until: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Lights a key as of the given instant. A key hit again while lit stays
    /// lit for the full duration from the new hit.
    pub fn light(&self, key: LogicalKey, now: Instant) {
        self.until.lock().insert(key, now + self.duration);
    }

    pub fn is_lit(&self, key: LogicalKey, now: Instant) -> bool {
        self.until
            .lock()
            .get(&key)
            .map(|until| now < *until)
            .unwrap_or(false)
    }

    /// The keys lit at the given instant. Expired keys are dropped.
    pub fn lit(&self, now: Instant) -> HashSet<LogicalKey> {
        let mut until = self.until.lock();
        until.retain(|_, until| now < *until);
        until.keys().copied().collect()
    }
}

impl FeedbackHook for Highlights {
    fn key_triggered(&self, key: LogicalKey) {
        self.light(key, Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_expires() {
        let highlights = Highlights::new(Duration::from_millis(100));
        let q = LogicalKey::from_char('q').unwrap();
        let start = Instant::now();

        highlights.light(q, start);
        assert!(highlights.is_lit(q, start));
        assert!(highlights.is_lit(q, start + Duration::from_millis(99)));
        assert!(!highlights.is_lit(q, start + Duration::from_millis(100)));
        assert!(!highlights.is_lit(LogicalKey::BASS_DRUM, start));

        assert_eq!(highlights.lit(start), HashSet::from([q]));
        assert!(highlights.lit(start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_hit_again_extends() {
        let highlights = Highlights::new(Duration::from_millis(100));
        let q = LogicalKey::from_char('q').unwrap();
        let start = Instant::now();

        highlights.light(q, start);
        highlights.light(q, start + Duration::from_millis(80));
        assert!(highlights.is_lit(q, start + Duration::from_millis(150)));
    }

    #[test]
    fn test_hook_lights_key() {
        let highlights = Highlights::new(Duration::from_secs(60));
        let hook: Box<dyn FeedbackHook> = Box::new(highlights.clone());
        hook.key_triggered(LogicalKey::BASS_DRUM);

        assert!(highlights.is_lit(LogicalKey::BASS_DRUM, Instant::now()));
    }
}
