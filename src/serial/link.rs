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
use std::{future::Future, io, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    select,
    sync::mpsc,
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{error, info, span, trace, Instrument, Level};

use crate::playsync::CancelHandle;

/// Commands the transport sends to a link task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
    /// Writes a frame followed by a newline.
    Write(String),
    /// Closes the port. The link reconnects afterwards.
    Close,
}

/// Something that happened on a physical port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    pub port: usize,
    pub kind: LinkEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEventKind {
    /// The port was opened.
    Opened,
    /// Opening the port failed. Another attempt follows after the reconnect
    /// interval.
    OpenFailed,
    /// A line was received from the device.
    Line(String),
    /// The port closed after an I/O error, end of stream or a close command.
    Closed,
}

/// Opens the I/O stream of a physical port.
pub trait Opener: Send + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + 'static;

    fn open(&mut self) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Opens a serial device.
pub struct SerialOpener {
    path: String,
    baud_rate: u32,
}

impl SerialOpener {
    pub fn new(path: &str, baud_rate: u32) -> SerialOpener {
        SerialOpener {
            path: path.to_string(),
            baud_rate,
        }
    }
}

impl Opener for SerialOpener {
    type Stream = SerialStream;

    async fn open(&mut self) -> io::Result<SerialStream> {
        Ok(tokio_serial::new(&self.path, self.baud_rate).open_native_async()?)
    }
}

/// How a session with an open port ended.
enum SessionEnd {
    Closed,
    Stopped,
}

/// Runs a link until cancelled or until the transport goes away. The port is
/// reopened every `reconnect_interval` whenever it is closed.
pub async fn run_link<O: Opener>(
    port: usize,
    opener: O,
    reconnect_interval: Duration,
    commands: mpsc::UnboundedReceiver<LinkCommand>,
    events: mpsc::UnboundedSender<LinkEvent>,
    cancel_handle: CancelHandle,
) {
    let span = span!(Level::INFO, "serial link", port = port + 1);
    link_loop(port, opener, reconnect_interval, commands, events, cancel_handle)
        .instrument(span)
        .await
}

async fn link_loop<O: Opener>(
    port: usize,
    mut opener: O,
    reconnect_interval: Duration,
    mut commands: mpsc::UnboundedReceiver<LinkCommand>,
    events: mpsc::UnboundedSender<LinkEvent>,
    cancel_handle: CancelHandle,
) {
    let publish = |kind: LinkEventKind| events.send(LinkEvent { port, kind }).is_ok();

    loop {
        let opened = select! {
            _ = cancel_handle.cancelled() => return,
            opened = opener.open() => opened,
        };

        match opened {
            Ok(stream) => {
                // Anything sent while the port was down belongs to the old session.
                while commands.try_recv().is_ok() {}

                if !publish(LinkEventKind::Opened) {
                    return;
                }
                match session(stream, &mut commands, &publish, &cancel_handle).await {
                    SessionEnd::Closed => {
                        if !publish(LinkEventKind::Closed) {
                            return;
                        }
                    }
                    SessionEnd::Stopped => return,
                }
            }
            Err(e) => {
                error!(err = e.to_string(), "Error opening port.");
                if !publish(LinkEventKind::OpenFailed) {
                    return;
                }
            }
        }

        select! {
            _ = cancel_handle.cancelled() => return,
            _ = tokio::time::sleep(reconnect_interval) => {},
        }
    }
}

/// Reads lines from and writes frames to an open port until it closes.
async fn session<S, F>(
    stream: S,
    commands: &mut mpsc::UnboundedReceiver<LinkCommand>,
    publish: &F,
    cancel_handle: &CancelHandle,
) -> SessionEnd
where
    S: AsyncRead + AsyncWrite,
    F: Fn(LinkEventKind) -> bool,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    // Holds a partial line across iterations. Bytes read before another branch
    // wins stay here.
    let mut buf = Vec::new();

    loop {
        select! {
            _ = cancel_handle.cancelled() => return SessionEnd::Stopped,
            read = reader.read_until(b'\n', &mut buf) => match read {
                Ok(0) if buf.is_empty() => {
                    info!("Port reached end of stream.");
                    return SessionEnd::Closed;
                }
                Ok(_) => {
                    let line = decode_line(&buf);
                    buf.clear();
                    trace!(line, "Received line.");
                    if !publish(LinkEventKind::Line(line)) {
                        return SessionEnd::Stopped;
                    }
                }
                Err(e) => {
                    error!(err = e.to_string(), "Error reading from port.");
                    return SessionEnd::Closed;
                }
            },
            command = commands.recv() => match command {
                Some(LinkCommand::Write(frame)) => {
                    if let Err(e) = write_frame(&mut writer, &frame).await {
                        error!(err = e.to_string(), "Error on write.");
                        return SessionEnd::Closed;
                    }
                }
                Some(LinkCommand::Close) => {
                    info!("Closing port.");
                    return SessionEnd::Closed;
                }
                None => return SessionEnd::Stopped,
            },
        }
    }
}

/// Decodes a received line. Invalid UTF-8 from a noisy device is replaced
/// rather than treated as an error.
fn decode_line(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &str) -> io::Result<()> {
    trace!(frame, "Writing frame.");
    writer.write_all(frame.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
