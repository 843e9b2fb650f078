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

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info, trace, warn};

use crate::playsync::CancelHandle;

use super::{
    identity::IdentityMap,
    link::{run_link, LinkCommand, LinkEvent, LinkEventKind, Opener},
    port::{LineOutcome, PortState, SendOutcome},
    PORT_COUNT,
};

/// Manages the two physical ports: their handshakes, flow control and the
/// identity of the devices plugged into them. All I/O is delegated to the link
/// tasks through their command channels.
pub struct Transport {
    ports: [PortState; PORT_COUNT],
    links: [mpsc::UnboundedSender<LinkCommand>; PORT_COUNT],
    identity: IdentityMap,
    writes: u32,
}

impl Transport {
    pub fn new(links: [mpsc::UnboundedSender<LinkCommand>; PORT_COUNT]) -> Transport {
        Transport {
            ports: [PortState::new(), PortState::new()],
            links,
            identity: IdentityMap::new(),
            writes: 0,
        }
    }

    /// Spawns a link task for each port and returns the transport driving them,
    /// the receiver of their events and the task handles.
    pub fn spawn<O: Opener>(
        openers: [O; PORT_COUNT],
        reconnect_interval: Duration,
        cancel_handle: &CancelHandle,
    ) -> (
        Transport,
        mpsc::UnboundedReceiver<LinkEvent>,
        Vec<JoinHandle<()>>,
    ) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut handles = Vec::with_capacity(PORT_COUNT);
        let mut spawn = |port: usize, opener: O| {
            let (commands_tx, commands_rx) = mpsc::unbounded_channel();
            handles.push(tokio::spawn(run_link(
                port,
                opener,
                reconnect_interval,
                commands_rx,
                events_tx.clone(),
                cancel_handle.clone(),
            )));
            commands_tx
        };

        let [first, second] = openers;
        let links = [spawn(0, first), spawn(1, second)];
        let mut transport = Transport::new(links);
        transport.begin_open();
        (transport, events_rx, handles)
    }

    pub fn identity(&self) -> &IdentityMap {
        &self.identity
    }

    pub fn port(&self, port: usize) -> Option<&PortState> {
        self.ports.get(port)
    }

    /// The current queue length of each port.
    pub fn queue_depths(&self) -> [usize; PORT_COUNT] {
        [self.ports[0].queue_len(), self.ports[1].queue_len()]
    }

    /// Returns the number of frames written since the last call.
    pub fn take_writes(&mut self) -> u32 {
        std::mem::take(&mut self.writes)
    }

    /// Sends a frame to the given port, writing it now if the device is ready
    /// and queuing it otherwise.
    pub fn send(&mut self, port: usize, frame: String) {
        let Some(state) = self.ports.get_mut(port) else {
            warn!(port, "Frame for unknown port dropped.");
            return;
        };

        match state.send(frame) {
            SendOutcome::Write(frame) => self.write(port, frame),
            SendOutcome::Queued => {}
            SendOutcome::RequestClose => {
                warn!(
                    port = port + 1,
                    queue = state.queue_len(),
                    "Queue backing up, closing port."
                );
                self.command(port, LinkCommand::Close);
            }
            SendOutcome::Overflow => error!(port = port + 1, "Queue overflow error!"),
        }
    }

    /// Applies an event from a link task.
    pub fn handle_event(&mut self, event: LinkEvent) {
        let port = event.port;
        let Some(state) = self.ports.get_mut(port) else {
            warn!(port, "Event for unknown port ignored.");
            return;
        };

        match event.kind {
            LinkEventKind::Opened => {
                if state.opened() {
                    info!(port = port + 1, "Port reconnected.");
                } else {
                    info!(port = port + 1, "Port opened.");
                }
            }
            LinkEventKind::OpenFailed | LinkEventKind::Closed => {
                if state.closed() {
                    info!(port = port + 1, "Port disconnected!");
                }
            }
            LinkEventKind::Line(line) => match state.handle_line(&line) {
                LineOutcome::Initialized => info!(port = port + 1, "Port initialized!"),
                LineOutcome::Acknowledged { role, next } => {
                    self.identity.acknowledge(port, role);
                    if let Some(frame) = next {
                        self.write(port, frame);
                    }
                }
                LineOutcome::Ignored => trace!(port = port + 1, line, "Ignored line."),
            },
        }
    }

    /// Marks the ports as opening. Called once the link tasks are started.
    pub fn begin_open(&mut self) {
        self.ports.iter_mut().for_each(PortState::begin_open);
    }

    fn write(&mut self, port: usize, frame: String) {
        self.writes += 1;
        self.command(port, LinkCommand::Write(frame));
    }

    fn command(&self, port: usize, command: LinkCommand) {
        if self.links[port].send(command).is_err() {
            error!(port = port + 1, "Link task is gone.");
        }
    }
}
