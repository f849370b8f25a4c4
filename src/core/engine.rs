use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::info;

use crate::core::input::{InputSource, KeyOutcome, KeyboardInput};
use crate::core::network::{Transport, TransportEvent};
use crate::core::renderer;
use crate::core::session::Session;

/// Drives one peer: a single task that interleaves link events with render frames,
/// so a message handler and a frame step never observe each other half-done.
pub struct Engine<T: Transport> {
    session: Session,
    transport: T,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    input: KeyboardInput,
    frame_interval: Duration,
    local_id: String,
}

impl<T: Transport> Engine<T> {
    pub fn new(
        session: Session,
        transport: T,
        events: mpsc::UnboundedReceiver<TransportEvent>,
        fps: u32,
        local_id: String,
    ) -> Self {
        Self {
            session,
            transport,
            events,
            input: KeyboardInput::new(),
            frame_interval: Duration::from_secs(1) / fps.max(1),
            local_id,
        }
    }

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last_frame = Instant::now();
        let mut events_open = true;

        info!(role = %self.session.role(), "frame loop started");
        loop {
            tokio::select! {
                event = self.events.recv(), if events_open => match event {
                    Some(event) => self.session.on_transport(event),
                    None => events_open = false,
                },

                _ = frames.tick() => {
                    if self.drain_keys()? {
                        break;
                    }
                    let dt = last_frame.elapsed().as_secs_f32();
                    last_frame = Instant::now();

                    let input = self.input.take();
                    self.session.frame(&self.transport, dt, input);
                    terminal.draw(|f| renderer::render(f, &self.session, &self.local_id))?;
                }
            }
        }

        info!("frame loop stopped");
        Ok(())
    }

    /// Feeds pending key events to the input source. Returns true on quit.
    fn drain_keys(&mut self) -> Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if self.input.handle_key(key) == KeyOutcome::Quit {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
