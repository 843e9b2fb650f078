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
//! Serial transport to the two output controllers.
//!
//! Each physical port is driven by a link task that owns the I/O stream and
//! reports what happens on it as [link::LinkEvent]s. The [transport::Transport]
//! consumes those events and runs the per-port handshake and flow control.

pub mod identity;
pub mod link;
pub mod port;
pub mod transport;

pub use identity::IdentityMap;
pub use link::{LinkCommand, LinkEvent, LinkEventKind};
pub use transport::Transport;

/// The number of physical output controllers.
pub const PORT_COUNT: usize = 2;
