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
use std::collections::HashSet;
use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as TermEvent, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent,
        MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, terminal,
};
use ratatui::DefaultTerminal;
use tokio::{
    sync::{mpsc::Sender, watch},
    task::JoinHandle,
};
use tracing::{info, span, Level};

use super::feedback::Highlights;
use super::layout::PadLayout;
use super::{Event, PadStatus};
use crate::keys::LogicalKey;

/// How much +/- change the overall volume.
const VOLUME_STEP: u8 = 10;

/// How long to wait for input before redrawing.
const POLL_INTERVAL: Duration = Duration::from_millis(15);

/// Turns terminal input into pad events.
pub struct InputTranslator {
    layout: PadLayout,
    /// Whether the terminal reports keys going up.
    reports_release: bool,
    /// The overall volume the +/- keys step from.
    overall: u8,
    /// The pad the mouse went down on.
    pointer: Option<LogicalKey>,
}

impl InputTranslator {
    pub fn new(layout: PadLayout, reports_release: bool, overall: u8) -> InputTranslator {
        InputTranslator {
            layout,
            reports_release,
            overall: overall.min(100),
            pointer: None,
        }
    }

    /// Translates one terminal event. Most terminal events mean nothing to
    /// the pad.
    pub fn translate(&mut self, event: &TermEvent) -> Vec<Event> {
        match event {
            TermEvent::Key(key) => self.key(key).into_iter().collect(),
            TermEvent::Mouse(mouse) => self.mouse(mouse),
            _ => Vec::new(),
        }
    }

    fn key(&mut self, key: &KeyEvent) -> Option<Event> {
        let pressed = key.kind == KeyEventKind::Press;
        match key.code {
            KeyCode::Esc if pressed => Some(Event::Quit),
            KeyCode::Char('c') if pressed && key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Event::Quit)
            }
            KeyCode::Tab if pressed => Some(Event::NextKit),
            KeyCode::Char(c @ '1'..='9') if pressed => {
                c.to_digit(10).map(|digit| Event::SelectKit(digit as usize - 1))
            }
            KeyCode::Char('+') | KeyCode::Char('=') if pressed => {
                self.overall = self.overall.saturating_add(VOLUME_STEP).min(100);
                Some(Event::SetOverallVolume(self.overall))
            }
            KeyCode::Char('-') if pressed => {
                self.overall = self.overall.saturating_sub(VOLUME_STEP);
                Some(Event::SetOverallVolume(self.overall))
            }
            KeyCode::Char(c) => {
                let pad = LogicalKey::from_char(c).ok()?;
                match (key.kind, self.reports_release) {
                    (KeyEventKind::Press, true) => Some(Event::Trigger(pad)),
                    (KeyEventKind::Press, false) => Some(Event::Tap(pad)),
                    (KeyEventKind::Release, true) => Some(Event::Release(pad)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn mouse(&mut self, mouse: &MouseEvent) -> Vec<Event> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(pad) = self.layout.hit(mouse.column, mouse.row) else {
                    return Vec::new();
                };
                // The button may have gone up outside the terminal.
                let mut events: Vec<Event> =
                    self.pointer.take().map(Event::Release).into_iter().collect();
                self.pointer = Some(pad);
                events.push(Event::Trigger(pad));
                events
            }
            MouseEventKind::Drag(MouseButton::Left) => self
                .pointer
                .and_then(|pad| {
                    self.layout
                        .volume_at(pad, mouse.row)
                        .map(|volume| Event::SetVolume(pad, volume))
                })
                .into_iter()
                .collect(),
            MouseEventKind::Up(MouseButton::Left) => {
                self.pointer.take().map(Event::Release).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Puts the terminal into the pad's mode and restores it when dropped.
struct Terminal {
    terminal: DefaultTerminal,
    reports_release: bool,
}

impl Terminal {
    fn enter() -> io::Result<Terminal> {
        let mut guard = Terminal {
            terminal: ratatui::try_init()?,
            reports_release: false,
        };

        let mut stdout = io::stdout();
        execute!(stdout, EnableMouseCapture)?;
        if matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            )?;
            guard.reports_release = true;
        }
        Ok(guard)
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.reports_release {
            let _ = execute!(stdout, PopKeyboardEnhancementFlags);
        }
        let _ = execute!(stdout, DisableMouseCapture);
        ratatui::restore();
    }
}

/// A controller that plays the pad from the terminal keyboard and mouse.
pub struct Driver {
    layout: PadLayout,
    highlights: Highlights,
    initial_volume: u8,
}

impl Driver {
    pub fn new(layout: PadLayout, highlights: Highlights, initial_volume: u8) -> Driver {
        Driver {
            layout,
            highlights,
            initial_volume,
        }
    }

    fn monitor_terminal(
        terminal: &mut DefaultTerminal,
        events_tx: &Sender<Event>,
        status: &watch::Receiver<PadStatus>,
        layout: &PadLayout,
        highlights: &Highlights,
        translator: &mut InputTranslator,
    ) -> Result<(), io::Error> {
        let mut drawn: Option<(PadStatus, HashSet<LogicalKey>)> = None;

        loop {
            let current = (status.borrow().clone(), highlights.lit(Instant::now()));
            if drawn.as_ref() != Some(&current) {
                terminal.draw(|frame| layout.render(frame, &current.0, &current.1))?;
                drawn = Some(current);
            }

            if !event::poll(POLL_INTERVAL)? {
                continue;
            }
            let input = event::read()?;
            if let TermEvent::Resize(..) = input {
                drawn = None;
                continue;
            }

            for event in translator.translate(&input) {
                let quit = event == Event::Quit;
                if events_tx.blocking_send(event).is_err() || quit {
                    return Ok(());
                }
            }
        }
    }
}

impl super::Driver for Driver {
    fn monitor_events(
        &self,
        events_tx: Sender<Event>,
        status: watch::Receiver<PadStatus>,
    ) -> JoinHandle<Result<(), io::Error>> {
        let layout = self.layout.clone();
        let highlights = self.highlights.clone();
        let initial_volume = self.initial_volume;

        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            let mut terminal = Terminal::enter()?;
            info!(
                reports_release = terminal.reports_release,
                "Keyboard driver started."
            );

            let mut translator =
                InputTranslator::new(layout.clone(), terminal.reports_release, initial_volume);
            Self::monitor_terminal(
                &mut terminal.terminal,
                &events_tx,
                &status,
                &layout,
                &highlights,
                &mut translator,
            )
        })
    }
}
