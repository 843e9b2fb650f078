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
use std::{collections::VecDeque, fmt};

/// The line a device sends once it is ready to receive frames.
pub const INIT_MARKER: &str = "initAttitudeDMX";

/// Queue length past which an initialized link is considered stalled.
pub const LOW_WATERMARK: usize = 25;

/// Queue length past which the queue is dropped.
pub const HARD_CAP: usize = 100;

/// The acknowledgement code a device sends when it plays the first role.
const ROLE_0_CODE: char = 'k';

/// The acknowledgement code a device sends when it plays the second role.
const ROLE_1_CODE: char = 'l';

/// The lifecycle of a physical port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Closed,
    Opening,
    Uninitialized,
    Initialized,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            LinkState::Closed => "closed",
            LinkState::Opening => "opening",
            LinkState::Uninitialized => "uninitialized",
            LinkState::Initialized => "initialized",
        };
        write!(f, "{}", state)
    }
}

/// What the caller has to do after handing a frame to a port.
#[derive(Debug, PartialEq, Eq)]
pub enum SendOutcome {
    /// Write the frame to the device now.
    Write(String),
    /// The frame was queued.
    Queued,
    /// The frame was queued but the backlog indicates a stalled link. The link
    /// should be closed so it reconnects.
    RequestClose,
    /// The queue passed its hard cap and was dropped.
    Overflow,
}

/// The result of a line received from the device.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// The device completed its handshake.
    Initialized,
    /// The device acknowledged the previous write and declared its role. The
    /// next queued frame, if any, must be written.
    Acknowledged { role: usize, next: Option<String> },
    /// The line carried nothing the port acts on.
    Ignored,
}

/// Handshake and flow control state for one physical port. This performs no
/// I/O; the transport carries out the returned outcomes.
#[derive(Debug)]
pub struct PortState {
    state: LinkState,
    can_send: bool,
    queue: VecDeque<String>,
    reconnecting: bool,
    closing: bool,
}

impl PortState {
    pub fn new() -> PortState {
        PortState {
            state: LinkState::Closed,
            can_send: true,
            queue: VecDeque::new(),
            reconnecting: false,
            closing: false,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LinkState::Initialized
    }

    pub fn can_send(&self) -> bool {
        self.can_send
    }

    pub fn is_reconnecting(&self) -> bool {
        self.reconnecting
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The queued frames, oldest first.
    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    /// Marks the port as being opened.
    pub fn begin_open(&mut self) {
        if self.state == LinkState::Closed {
            self.state = LinkState::Opening;
        }
    }

    /// Marks the port as open and waiting for the device handshake. Returns
    /// true if this ended a reconnect.
    pub fn opened(&mut self) -> bool {
        self.state = LinkState::Uninitialized;
        self.closing = false;
        std::mem::replace(&mut self.reconnecting, false)
    }

    /// Marks the port as closed. Returns false if the port was already
    /// reconnecting, in which case nothing changes.
    pub fn closed(&mut self) -> bool {
        if self.reconnecting {
            return false;
        }
        self.state = LinkState::Closed;
        self.reconnecting = true;
        self.closing = false;
        true
    }

    /// Handles a line received from the device.
    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        if line.contains(INIT_MARKER) {
            // A device that restarts while the port stays open sends the
            // marker again.
            self.state = LinkState::Initialized;
            self.can_send = true;
            self.queue.clear();
            return LineOutcome::Initialized;
        }

        if !self.is_initialized() {
            return LineOutcome::Ignored;
        }

        let role = if line.contains(ROLE_1_CODE) {
            1
        } else if line.contains(ROLE_0_CODE) {
            0
        } else {
            return LineOutcome::Ignored;
        };

        let next = self.queue.pop_front();
        if next.is_none() {
            self.can_send = true;
        }
        LineOutcome::Acknowledged { role, next }
    }

    /// Hands a frame to the port. The frame is written immediately if the
    /// device is ready for it and queued otherwise.
    pub fn send(&mut self, frame: String) -> SendOutcome {
        if self.can_send && self.is_initialized() {
            self.can_send = false;
            return SendOutcome::Write(frame);
        }

        self.queue.push_back(frame);
        if self.queue.len() > HARD_CAP {
            self.queue.clear();
            return SendOutcome::Overflow;
        }
        if self.queue.len() > LOW_WATERMARK && self.is_initialized() && !self.closing {
            self.closing = true;
            return SendOutcome::RequestClose;
        }
        SendOutcome::Queued
    }
}

impl Default for PortState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn initialized_port() -> PortState {
        let mut port = PortState::new();
        port.begin_open();
        port.opened();
        assert_eq!(LineOutcome::Initialized, port.handle_line(INIT_MARKER));
        port
    }

    #[test]
    fn test_handshake() {
        let mut port = PortState::new();
        assert_eq!(LinkState::Closed, port.state());

        port.begin_open();
        assert_eq!(LinkState::Opening, port.state());
        assert!(!port.opened());
        assert_eq!(LinkState::Uninitialized, port.state());

        // Acknowledgements before the handshake are ignored.
        assert_eq!(LineOutcome::Ignored, port.handle_line("k"));
        assert_eq!(SendOutcome::Queued, port.send("a".into()));

        assert_eq!(
            LineOutcome::Initialized,
            port.handle_line("booted initAttitudeDMX\r")
        );
        assert!(port.is_initialized());
        assert!(port.can_send());
        assert_eq!(0, port.queue_len());
    }

    #[test]
    fn test_queue_fifo_and_drain_on_ack() {
        let mut port = initialized_port();
        assert_eq!(SendOutcome::Write("0".into()), port.send("0".into()));
        assert!(!port.can_send());

        for i in 1..=5 {
            assert_eq!(SendOutcome::Queued, port.send(i.to_string()));
        }
        assert_eq!(
            vec!["1", "2", "3", "4", "5"],
            port.queued().collect::<Vec<_>>()
        );

        // Unrelated lines do not drain the queue.
        assert_eq!(LineOutcome::Ignored, port.handle_line("noise"));
        assert_eq!(5, port.queue_len());

        for i in 1..=5 {
            assert_eq!(
                LineOutcome::Acknowledged {
                    role: 0,
                    next: Some(i.to_string())
                },
                port.handle_line("k")
            );
            assert!(!port.can_send());
        }

        assert_eq!(
            LineOutcome::Acknowledged { role: 1, next: None },
            port.handle_line("l")
        );
        assert!(port.can_send());
    }

    #[test]
    fn test_low_watermark_requests_close_once() {
        let mut port = initialized_port();
        assert!(matches!(port.send("x".into()), SendOutcome::Write(_)));

        for _ in 0..LOW_WATERMARK {
            assert_eq!(SendOutcome::Queued, port.send("x".into()));
        }
        assert_eq!(SendOutcome::RequestClose, port.send("x".into()));
        assert_eq!(SendOutcome::Queued, port.send("x".into()));
        assert_eq!(LOW_WATERMARK + 2, port.queue_len());
    }

    #[test]
    fn test_uninitialized_backlog_does_not_request_close() {
        let mut port = PortState::new();
        for _ in 0..HARD_CAP {
            assert_eq!(SendOutcome::Queued, port.send("x".into()));
        }
        assert_eq!(HARD_CAP, port.queue_len());
    }

    #[test]
    fn test_overflow_only_clears_queue() {
        let mut port = initialized_port();
        assert!(matches!(port.send("x".into()), SendOutcome::Write(_)));

        let mut close_requests = 0;
        for _ in 0..HARD_CAP {
            if port.send("x".into()) == SendOutcome::RequestClose {
                close_requests += 1;
            }
        }
        assert_eq!(1, close_requests);
        assert_eq!(HARD_CAP, port.queue_len());

        assert_eq!(SendOutcome::Overflow, port.send("x".into()));
        assert_eq!(0, port.queue_len());
        assert!(port.is_initialized());
        assert!(!port.can_send());
    }

    #[test]
    fn test_reconnect_discards_queue() {
        let mut port = initialized_port();
        assert!(matches!(port.send("x".into()), SendOutcome::Write(_)));
        for _ in 0..5 {
            port.send("x".into());
        }

        assert!(port.closed());
        assert!(!port.closed());
        assert_eq!(LinkState::Closed, port.state());
        assert!(port.is_reconnecting());
        assert_eq!(5, port.queue_len());

        assert!(port.opened());
        assert_eq!(LineOutcome::Initialized, port.handle_line(INIT_MARKER));
        assert!(port.is_initialized());
        assert!(port.can_send());
        assert_eq!(0, port.queue_len());
    }
}
