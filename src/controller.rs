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
use std::io;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error, info, span, warn, Instrument, Level};

use crate::audio::CompletionReceiver;
use crate::keys::LogicalKey;
use crate::samples::PadEngine;

pub mod feedback;
pub mod keyboard;
pub mod layout;

/// How many input events may queue up before a driver waits.
const EVENT_BUFFER: usize = 64;

/// Controller events that drive the pad engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key went down.
    Trigger(LogicalKey),

    /// A key went up.
    Release(LogicalKey),

    /// A key was hit by an input that never reports it going up.
    Tap(LogicalKey),

    /// Switches to the kit at the given position.
    SelectKit(usize),

    /// Switches to the next kit, wrapping around.
    NextKit,

    /// Sets one key's volume, 0 to 100.
    SetVolume(LogicalKey, u8),

    /// Sets every key's volume, 0 to 100.
    SetOverallVolume(u8),

    /// Stops the pad.
    Quit,
}

/// What drivers get to see of the engine after every event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PadStatus {
    pub kit: Option<String>,
    pub kits: Vec<String>,
    pub held: Vec<LogicalKey>,
    pub volumes: BTreeMap<LogicalKey, u8>,
    pub active_voices: usize,
}

impl PadStatus {
    /// Takes a snapshot of the engine.
    pub fn from_engine(engine: &PadEngine) -> PadStatus {
        let registry = engine.registry();
        PadStatus {
            kit: engine.active_kit().map(str::to_string),
            kits: registry.kits().map(str::to_string).collect(),
            held: engine.held_keys(),
            volumes: LogicalKey::all()
                .filter_map(|key| {
                    registry
                        .get(key)
                        .map(|resource| (key, (resource.volume() * 100.0).round() as u8))
                })
                .collect(),
            active_voices: engine.active_voices(),
        }
    }

    /// The position of the active kit.
    pub fn kit_index(&self) -> Option<usize> {
        let kit = self.kit.as_ref()?;
        self.kits.iter().position(|k| k == kit)
    }
}

pub trait Driver: Send + Sync + 'static {
    /// Starts producing events. The driver may watch the pad status to
    /// render it.
    fn monitor_events(
        &self,
        events_tx: Sender<Event>,
        status: watch::Receiver<PadStatus>,
    ) -> JoinHandle<Result<(), io::Error>>;
}

/// Runs the pad: the one task that owns the engine.
pub struct Controller {
    handle: JoinHandle<PadEngine>,
    status: watch::Receiver<PadStatus>,
}

impl Controller {
    /// Creates a new controller with the given driver. Natural voice
    /// completions from the audio device arrive on `completions`.
    pub fn new(
        engine: PadEngine,
        completions: CompletionReceiver,
        driver: Arc<dyn Driver>,
    ) -> Controller {
        let (status_tx, status) = watch::channel(PadStatus::from_engine(&engine));
        let span = span!(Level::INFO, "controller");
        let handle = tokio::spawn(
            Controller::run_events(engine, completions, driver, status_tx).instrument(span),
        );

        Controller { handle, status }
    }

    /// Watches the pad status.
    pub fn status(&self) -> watch::Receiver<PadStatus> {
        self.status.clone()
    }

    /// Join will block until the controller finishes. Returns the engine with
    /// every voice stopped.
    pub async fn join(&mut self) -> Result<PadEngine, JoinError> {
        (&mut self.handle).await
    }

    /// Applies driver events and voice completions one at a time.
    async fn run_events(
        mut engine: PadEngine,
        mut completions: CompletionReceiver,
        driver: Arc<dyn Driver>,
        status_tx: watch::Sender<PadStatus>,
    ) -> PadEngine {
        let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
        let join_handle = driver.monitor_events(events_tx, status_tx.subscribe());

        info!(kit = engine.active_kit(), "Controller started.");

        loop {
            tokio::select! {
                event = events_rx.recv() => match event {
                    Some(Event::Quit) | None => break,
                    Some(event) => {
                        debug!(event = ?event, "Received event.");
                        Controller::apply(&mut engine, event);
                    }
                },
                Some(voice) = completions.recv() => {
                    engine.on_voice_ended(voice);
                }
            }
            status_tx.send_replace(PadStatus::from_engine(&engine));
        }

        info!("Controller closing.");
        let stopped = engine.stop_all();
        debug!(voices = stopped.len(), "Stopped remaining voices.");
        status_tx.send_replace(PadStatus::from_engine(&engine));

        drop(events_rx);
        match join_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(err = %e, "Event monitor failed."),
            Err(e) => error!(err = %e, "Error waiting for event monitor to stop."),
        }
        engine
    }

    fn apply(engine: &mut PadEngine, event: Event) {
        match event {
            Event::Trigger(key) => {
                engine.trigger(key);
            }
            Event::Release(key) => {
                engine.release(key);
            }
            Event::Tap(key) => {
                engine.tap(key);
            }
            Event::SelectKit(index) => {
                if let Err(e) = engine.select_kit(index) {
                    warn!(err = %e, "Unable to select kit.");
                }
            }
            Event::NextKit => {
                if let Err(e) = engine.next_kit() {
                    warn!(err = %e, "Unable to switch kit.");
                }
            }
            Event::SetVolume(key, percent) => engine.set_volume(key, percent),
            Event::SetOverallVolume(percent) => engine.set_overall_volume(percent),
            Event::Quit => {}
        }
    }
}
