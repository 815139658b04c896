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


//! Where each pad sits on the terminal, and drawing it there.

use std::collections::HashSet;

use ratatui::{
    layout::{Alignment, Position, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::PadStatus;
use crate::keys::{LogicalKey, ROWS};

/// Width of a letter pad in cells, borders included.
pub const PAD_WIDTH: u16 = 6;
/// Height of every pad in cells, borders included. Leaves room for the key
/// and its volume.
pub const PAD_HEIGHT: u16 = 4;
/// Space between pads.
const GAP: u16 = 1;
/// Horizontal indent of each keyboard row.
const ROW_INDENT: [u16; 4] = [0, 2, 4, 4 + PAD_WIDTH + GAP];
/// The bass drum spans five letter pads.
const BASS_DRUM_WIDTH: u16 = 5 * (PAD_WIDTH + GAP) - GAP;
/// Lines above the pads used for the header.
const HEADER_LINES: u16 = 3;

const HELP: &str =
    "Tab next kit | 1-9 select kit | +/- volume | drag a pad to set its volume | Esc quit";

/// The cells covered by one pad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PadArea {
    key: LogicalKey,
    area: Rect,
}

/// The pad grid: the keyboard rows, staggered like a keyboard, with the
/// bass drum along the bottom.
#[derive(Clone, Debug)]
pub struct PadLayout {
    origin: Position,
    pads: Vec<PadArea>,
}

impl Default for PadLayout {
    fn default() -> Self {
        PadLayout::new(2, HEADER_LINES)
    }
}

impl PadLayout {
    /// Lays out the pads with the top left corner of the grid at the given cell.
    pub fn new(origin_x: u16, origin_y: u16) -> PadLayout {
        let mut pads = Vec::with_capacity(27);
        for (row_index, row) in ROWS.iter().enumerate() {
            let y = origin_y + row_index as u16 * (PAD_HEIGHT + GAP);
            let indent = origin_x + ROW_INDENT[row_index];
            for (col_index, c) in row.chars().enumerate() {
                let Ok(key) = LogicalKey::from_char(c) else {
                    continue;
                };
                let width = if key.is_bass_drum() {
                    BASS_DRUM_WIDTH
                } else {
                    PAD_WIDTH
                };
                let x = indent + col_index as u16 * (PAD_WIDTH + GAP);
                pads.push(PadArea {
                    key,
                    area: Rect::new(x, y, width, PAD_HEIGHT),
                });
            }
        }

        PadLayout {
            origin: Position::new(origin_x, origin_y),
            pads,
        }
    }

    pub fn rect(&self, key: LogicalKey) -> Option<Rect> {
        self.pads
            .iter()
            .find(|pad| pad.key == key)
            .map(|pad| pad.area)
    }

    /// The pad under a terminal cell.
    pub fn hit(&self, col: u16, row: u16) -> Option<LogicalKey> {
        let position = Position::new(col, row);
        self.pads
            .iter()
            .find(|pad| pad.area.contains(position))
            .map(|pad| pad.key)
    }

    /// The volume for a pointer at the given row while dragging on a pad:
    /// 0 at the pad's top edge, 100 at its bottom edge. Rows outside the pad
    /// clamp to the nearest edge.
    pub fn volume_at(&self, key: LogicalKey, row: u16) -> Option<u8> {
        let area = self.rect(key)?;
        let span = area.height.saturating_sub(1).max(1);
        let offset = row.clamp(area.y, area.y + span) - area.y;
        Some((u32::from(offset) * 100 / u32::from(span)) as u8)
    }

    /// The first row below the grid.
    pub fn bottom(&self) -> u16 {
        self.origin.y + ROWS.len() as u16 * (PAD_HEIGHT + GAP)
    }

    /// Draws the header, every pad and the footer. Held pads are drawn
    /// inverted, lit pads in colour. Anything past the edge of the frame is
    /// clipped.
    pub fn render(&self, frame: &mut Frame, status: &PadStatus, lit: &HashSet<LogicalKey>) {
        let screen = frame.area();

        let kit = status.kit.as_deref().unwrap_or("none");
        let position = status
            .kit_index()
            .map(|index| format!(" ({}/{})", index + 1, status.kits.len()))
            .unwrap_or_default();
        let header = Paragraph::new(vec![
            Line::from(format!("drumpad | kit: {}{}", kit, position)),
            Line::from(HELP).style(Style::default().fg(Color::DarkGray)),
        ]);
        let header_area = Rect::new(self.origin.x, 0, screen.width, self.origin.y);
        frame.render_widget(header, header_area.intersection(screen));

        for pad in &self.pads {
            let area = pad.area.intersection(screen);
            if area.is_empty() {
                continue;
            }

            let mut style = Style::default();
            if status.held.contains(&pad.key) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if lit.contains(&pad.key) {
                style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
            }

            let volume = status
                .volumes
                .get(&pad.key)
                .map(|v| format!("{}%", v))
                .unwrap_or_default();
            let body = Paragraph::new(vec![Line::from(pad.key.to_string()), Line::from(volume)])
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL))
                .style(style);
            frame.render_widget(body, area);
        }

        let footer = Paragraph::new(format!("voices: {}", status.active_voices));
        let footer_area = Rect::new(self.origin.x, self.bottom(), screen.width, 1);
        frame.render_widget(footer, footer_area.intersection(screen));
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;

    fn key(c: char) -> LogicalKey {
        LogicalKey::from_char(c).unwrap()
    }

    fn status() -> PadStatus {
        PadStatus {
            kit: Some("jazz".to_string()),
            kits: vec!["classic".to_string(), "jazz".to_string()],
            held: vec![key('Q')],
            volumes: LogicalKey::all().map(|k| (k, 60)).collect(),
            active_voices: 3,
        }
    }

    fn draw(layout: &PadLayout, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| layout.render(frame, &status(), &HashSet::from([key('W')])))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_every_key_has_a_pad() {
        let layout = PadLayout::default();
        assert_eq!(layout.pads.len(), 27);
        for k in LogicalKey::all() {
            assert!(layout.rect(k).is_some(), "no pad for {}", k);
        }
    }

    #[test]
    fn test_pads_do_not_overlap() {
        let layout = PadLayout::default();
        for pad in &layout.pads {
            for col in pad.area.left()..pad.area.right() {
                for row in pad.area.top()..pad.area.bottom() {
                    assert_eq!(layout.hit(col, row), Some(pad.key));
                }
            }
        }
    }

    #[test]
    fn test_hit() {
        let layout = PadLayout::new(0, 0);
        assert_eq!(layout.hit(0, 0), Some(key('Q')));
        assert_eq!(layout.hit(PAD_WIDTH - 1, PAD_HEIGHT - 1), Some(key('Q')));
        assert_eq!(layout.hit(PAD_WIDTH, 0), None);
        assert_eq!(layout.hit(PAD_WIDTH + GAP, 1), Some(key('W')));
        assert_eq!(layout.hit(2, PAD_HEIGHT + GAP), Some(key('A')));
        assert_eq!(layout.hit(0, PAD_HEIGHT + GAP), None);

        let space = layout.rect(LogicalKey::BASS_DRUM).unwrap();
        assert_eq!(space.width, BASS_DRUM_WIDTH);
        assert_eq!(
            layout.hit(space.right() - 1, space.y),
            Some(LogicalKey::BASS_DRUM)
        );
        assert_eq!(layout.hit(200, 200), None);
    }

    #[test]
    fn test_volume_at() {
        let layout = PadLayout::new(0, 0);
        let a = layout.rect(key('A')).unwrap().y;

        assert_eq!(layout.volume_at(key('A'), a), Some(0));
        assert_eq!(layout.volume_at(key('A'), a + 1), Some(33));
        assert_eq!(layout.volume_at(key('A'), a + 2), Some(66));
        assert_eq!(layout.volume_at(key('A'), a + 3), Some(100));
        assert_eq!(layout.volume_at(key('A'), a + 10), Some(100));
        assert_eq!(layout.volume_at(key('A'), 0), Some(0));
    }

    #[test]
    fn test_render() {
        let output = draw(&PadLayout::default(), 80, 25);

        assert!(output.contains("kit: jazz (2/2)"));
        assert!(output.contains("space"));
        assert!(output.contains("60%"));
        assert!(output.contains("voices: 3"));
    }

    #[test]
    fn test_render_clips_to_a_small_terminal() {
        let output = draw(&PadLayout::default(), 24, 6);

        assert!(output.contains("kit: jazz"));
        assert!(!output.contains("voices"));
    }
}
