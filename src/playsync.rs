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
use std::sync::Arc;

use tokio::sync::watch;

/// A cancel handle is shared by the long-running tasks of the controller. It's
/// each task's responsibility to stop once the handle is cancelled.
#[derive(Clone)]
pub struct CancelHandle {
    /// Holds true once the handle has been cancelled.
    cancelled: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Creates a new cancel handle.
    pub fn new() -> CancelHandle {
        let (cancelled, _) = watch::channel(false);
        CancelHandle {
            cancelled: Arc::new(cancelled),
        }
    }

    /// Returns true if the handle has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Waits until the handle is cancelled. Returns immediately if it already is.
    pub async fn cancelled(&self) {
        let mut receiver = self.cancelled.subscribe();
        // The sender lives as long as self, so this can't fail.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Cancels every task holding this handle.
    pub fn cancel(&self) {
        self.cancelled.send_if_modified(|cancelled| {
            if *cancelled {
                return false;
            }
            *cancelled = true;
            true
        });
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}
