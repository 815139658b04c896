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

//! Logical pad keys.
//!
//! Every pad is addressed by one of 27 logical keys: the three letter rows of a
//! QWERTY keyboard plus the space bar, which plays the bass drum.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The keyboard rows that make up the pad, top to bottom.
pub const ROWS: [&str; 4] = ["QWERTYUIOP", "ASDFGHJKL", "ZXCVBNM", " "];

/// The character used for the bass drum pad.
const BASS_DRUM: char = ' ';

/// Returned when an input does not name one of the pad keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key {0:?}")]
pub struct UnknownKeyError(pub String);

/// A key on the pad. Can only hold a member of the fixed alphabet.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalKey(char);

impl LogicalKey {
    /// The bass drum key (space bar).
    pub const BASS_DRUM: LogicalKey = LogicalKey(BASS_DRUM);

    /// Normalizes a single character into a logical key. Letters are
    /// case-insensitive.
    pub fn from_char(c: char) -> Result<LogicalKey, UnknownKeyError> {
        let upper = c.to_ascii_uppercase();
        if ROWS.iter().any(|row| row.contains(upper)) {
            Ok(LogicalKey(upper))
        } else {
            Err(UnknownKeyError(c.to_string()))
        }
    }

    /// Normalizes a textual input such as `"q"`, `"Q"`, `" "` or `"space"`.
    pub fn from_input(input: &str) -> Result<LogicalKey, UnknownKeyError> {
        if input.eq_ignore_ascii_case("space") {
            return Ok(LogicalKey::BASS_DRUM);
        }

        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => LogicalKey::from_char(c),
            _ => Err(UnknownKeyError(input.to_string())),
        }
    }

    /// Iterates over the whole alphabet in keyboard row order.
    pub fn all() -> impl Iterator<Item = LogicalKey> {
        ROWS.iter().flat_map(|row| row.chars()).map(LogicalKey)
    }

    /// The underlying character.
    pub fn as_char(&self) -> char {
        self.0
    }

    /// Returns true for the bass drum key.
    pub fn is_bass_drum(&self) -> bool {
        self.0 == BASS_DRUM
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bass_drum() {
            f.write_str("space")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Debug for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogicalKey({})", self)
    }
}

impl TryFrom<String> for LogicalKey {
    type Error = UnknownKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LogicalKey::from_input(&value)
    }
}

impl From<LogicalKey> for String {
    fn from(key: LogicalKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_size() {
        assert_eq!(LogicalKey::all().count(), 27);
    }

    #[test]
    fn test_from_char_normalizes_case() {
        assert_eq!(LogicalKey::from_char('q'), LogicalKey::from_char('Q'));
        assert_eq!(LogicalKey::from_char('q').unwrap().as_char(), 'Q');
        assert_eq!(LogicalKey::from_char(' ').unwrap(), LogicalKey::BASS_DRUM);
    }

    #[test]
    fn test_unknown_keys() {
        assert!(LogicalKey::from_char('1').is_err());
        assert!(LogicalKey::from_char('!').is_err());
        assert!(LogicalKey::from_input("QW").is_err());
        assert!(LogicalKey::from_input("").is_err());
        assert_eq!(
            LogicalKey::from_input("Enter"),
            Err(UnknownKeyError("Enter".to_string()))
        );
    }

    #[test]
    fn test_from_input_space() {
        assert_eq!(LogicalKey::from_input("space").unwrap(), LogicalKey::BASS_DRUM);
        assert_eq!(LogicalKey::from_input("SPACE").unwrap(), LogicalKey::BASS_DRUM);
        assert_eq!(LogicalKey::from_input(" ").unwrap(), LogicalKey::BASS_DRUM);
    }

    #[test]
    fn test_display() {
        assert_eq!(LogicalKey::from_char('m').unwrap().to_string(), "M");
        assert_eq!(LogicalKey::BASS_DRUM.to_string(), "space");
        assert_eq!(LogicalKey::from_char('t').unwrap().to_string(), "T");
    }

    #[test]
    fn test_serde_round_trip_through_yaml() {
        let keys: Vec<LogicalKey> = serde_yml::from_str("[q, space, \"M\"]").unwrap();
        assert_eq!(
            keys,
            vec![
                LogicalKey::from_char('Q').unwrap(),
                LogicalKey::BASS_DRUM,
                LogicalKey::from_char('M').unwrap(),
            ]
        );
        assert!(serde_yml::from_str::<Vec<LogicalKey>>("[\"1\"]").is_err());
    }
}
