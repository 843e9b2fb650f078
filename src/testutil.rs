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
use std::{future::Future, time::Duration};

use tokio::{sync::mpsc, time::Instant};

/// How long a test waits for something to happen before failing.
const TIMEOUT: Duration = Duration::from_secs(3);

/// Wait for the given async predicate to return true or fail.
pub async fn eventually_async<F, Fut>(mut predicate: F, error_msg: &str)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + TIMEOUT;
    while !predicate().await {
        if Instant::now() > deadline {
            panic!("{}", error_msg);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Receives the next message from a channel, failing the test if none arrives.
pub async fn next_event<T>(receiver: &mut mpsc::UnboundedReceiver<T>) -> T {
    match tokio::time::timeout(TIMEOUT, receiver.recv()).await {
        Ok(Some(event)) => event,
        Ok(None) => panic!("Channel closed while waiting for an event"),
        Err(_) => panic!("Timed out waiting for an event"),
    }
}
