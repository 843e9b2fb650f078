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
use std::time::Duration;

use tokio::{
    select,
    sync::{mpsc, watch},
    task::{JoinError, JoinHandle},
    time::{interval, MissedTickBehavior},
};
use tracing::{error, info, span, Instrument, Level};

use crate::{
    config::ShowConfig,
    dmx::{FrameBuffer, FrameScheduler, Gamma, TestPattern},
    lighting::ShowEngine,
    playsync::CancelHandle,
    serial::{LinkEvent, Transport},
};

/// How often frame and queue statistics are gathered.
const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// What fills the frame buffer.
pub enum Source {
    /// The show engine, driven by the show configuration.
    Show(ShowEngine),
    /// The bring-up test pattern. Configuration changes are ignored.
    TestPattern(TestPattern),
}

impl Source {
    fn tick(&mut self, buffer: &mut FrameBuffer) {
        match self {
            Source::Show(engine) => engine.tick(buffer),
            Source::TestPattern(pattern) => pattern.tick(buffer),
        }
    }

    fn load(&mut self, config: &ShowConfig) {
        if let Source::Show(engine) = self {
            engine.load(&config.rig());
            info!(zones = engine.zones().len(), "Show configuration loaded.");
        }
    }
}

/// Timing and output options of the controller.
#[derive(Clone)]
pub struct ControllerOptions {
    /// How often the source fills the frame buffer.
    pub source_interval: Duration,
    /// How often the frame buffer is sent to the output controllers.
    pub dmx_interval: Duration,
    pub gamma: Gamma,
    pub debug_fps: bool,
}

/// Runs the source, the frame scheduler and the transport on a single task.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Starts the controller. It runs until cancelled or until the link tasks
    /// stop.
    pub fn start(
        source: Source,
        options: ControllerOptions,
        transport: Transport,
        events: mpsc::UnboundedReceiver<LinkEvent>,
        config_rx: watch::Receiver<ShowConfig>,
        network_rx: watch::Receiver<bool>,
        cancel_handle: CancelHandle,
    ) -> Controller {
        let runtime = Runtime {
            source,
            buffer: FrameBuffer::new(),
            scheduler: FrameScheduler::new(options.gamma.clone()),
            transport,
            network_status: false,
        };

        let span = span!(Level::INFO, "controller");
        let run = runtime.run(options, events, config_rx, network_rx, cancel_handle);
        Controller {
            handle: tokio::spawn(run.instrument(span)),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }
}

/// The state owned by the controller task.
struct Runtime {
    source: Source,
    buffer: FrameBuffer,
    scheduler: FrameScheduler,
    transport: Transport,
    network_status: bool,
}

impl Runtime {
    async fn run(
        mut self,
        options: ControllerOptions,
        mut events: mpsc::UnboundedReceiver<LinkEvent>,
        mut config_rx: watch::Receiver<ShowConfig>,
        mut network_rx: watch::Receiver<bool>,
        cancel_handle: CancelHandle,
    ) {
        let initial = config_rx.borrow_and_update().clone();
        self.source.load(&initial);
        self.network_status = *network_rx.borrow_and_update();

        let mut source_timer = interval(options.source_interval);
        let mut dmx_timer = interval(options.dmx_interval);
        let mut stats_timer = interval(STATS_INTERVAL);
        for timer in [&mut source_timer, &mut dmx_timer, &mut stats_timer] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        let mut config_open = true;
        let mut network_open = true;

        info!("Controller started.");
        loop {
            select! {
                _ = cancel_handle.cancelled() => {
                    info!("Controller stopped.");
                    return;
                }
                _ = source_timer.tick() => self.source.tick(&mut self.buffer),
                _ = dmx_timer.tick() => {
                    self.scheduler
                        .emit(&self.buffer, self.network_status, &mut self.transport);
                }
                _ = stats_timer.tick() => self.report(options.debug_fps),
                event = events.recv() => match event {
                    Some(event) => self.transport.handle_event(event),
                    None => {
                        error!("Link tasks stopped, controller closing.");
                        return;
                    }
                },
                changed = config_rx.changed(), if config_open => match changed {
                    Ok(()) => {
                        let config = config_rx.borrow_and_update().clone();
                        self.source.load(&config);
                    }
                    Err(_) => config_open = false,
                },
                changed = network_rx.changed(), if network_open => match changed {
                    Ok(()) => {
                        self.network_status = *network_rx.borrow_and_update();
                        info!(network_status = self.network_status, "Network status changed.");
                    }
                    Err(_) => network_open = false,
                },
            }
        }
    }

    /// Resets the frame counter and logs it along with the queue depths.
    fn report(&mut self, debug_fps: bool) {
        let fps = self.transport.take_writes();
        if debug_fps {
            let [q0, q1] = self.transport.queue_depths();
            info!(fps, q0, q1, "DMX status");
        }
    }
}
