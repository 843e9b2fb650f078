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
//! Polls the configuration server for show configuration changes.

use std::{path::PathBuf, time::Duration};

use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::{select, sync::watch, time::MissedTickBehavior};
use tracing::{debug, error, info, span, warn, Instrument, Level};

use crate::{
    config::{save_config, ShowConfig},
    playsync::CancelHandle,
};

/// How long a single request may take.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(StatusCode),

    #[error("Response is not a JSON object")]
    NotAnObject,
}

/// Polls the server, merges what it sends into the show configuration, saves
/// the result and publishes it. The network status is published after every
/// request.
pub struct Poller {
    client: reqwest::Client,
    base_url: String,
    device_id: i64,
    interval: Duration,
    config_path: PathBuf,
    config: ShowConfig,
    config_tx: watch::Sender<ShowConfig>,
    network_tx: watch::Sender<bool>,
}

impl Poller {
    pub fn new(
        base_url: &str,
        device_id: i64,
        interval: Duration,
        config_path: PathBuf,
        config: ShowConfig,
    ) -> Result<(Poller, watch::Receiver<ShowConfig>, watch::Receiver<bool>), RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()?;
        let (config_tx, config_rx) = watch::channel(config.clone());
        let (network_tx, network_rx) = watch::channel(false);

        Ok((
            Poller {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                device_id,
                interval,
                config_path,
                config,
                config_tx,
                network_tx,
            },
            config_rx,
            network_rx,
        ))
    }

    /// Polls until cancelled. The full configuration is requested until the
    /// first successful response, and only changes after that.
    pub async fn run(self, cancel_handle: CancelHandle) {
        let span = span!(Level::INFO, "remote config", device_id = self.device_id);
        self.poll(cancel_handle).instrument(span).await
    }

    async fn poll(mut self, cancel_handle: CancelHandle) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut full = true;

        loop {
            select! {
                _ = cancel_handle.cancelled() => {
                    info!("Remote config poller stopped.");
                    return;
                }
                _ = interval.tick() => {}
            }

            let fetched = select! {
                _ = cancel_handle.cancelled() => {
                    info!("Remote config poller stopped.");
                    return;
                }
                fetched = self.fetch(full) => fetched,
            };

            match fetched {
                Ok(update) => {
                    if full {
                        info!("Connected to configuration server!");
                    }
                    full = false;
                    self.network_tx.send_replace(true);
                    self.apply(&update);
                }
                Err(e) => {
                    error!(err = e.to_string(), "Error polling configuration server.");
                    self.network_tx.send_replace(false);
                }
            }
        }
    }

    /// The URL of the full configuration or of the changes since the last poll.
    fn url(&self, full: bool) -> String {
        let endpoint = if full { "data" } else { "newdata" };
        format!("{}/{}/{}", self.base_url, self.device_id, endpoint)
    }

    async fn fetch(&self, full: bool) -> Result<Map<String, Value>, RemoteError> {
        let response = self.client.get(self.url(full)).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }

        match response.json::<Value>().await? {
            Value::Object(update) => Ok(update),
            _ => Err(RemoteError::NotAnObject),
        }
    }

    /// Merges an update, then saves and publishes the configuration if any
    /// section changed.
    fn apply(&mut self, update: &Map<String, Value>) {
        let merged = self.config.merge(update);
        if merged.is_empty() {
            debug!("No configuration changes.");
            return;
        }

        info!(sections = merged.join(","), "Configuration updated.");
        if let Err(e) = save_config(&self.config_path, &self.config) {
            warn!(err = e.to_string(), "Error saving config.");
        }
        self.config_tx.send_replace(self.config.clone());
    }
}

#[cfg(test)]
mod test {
    use std::{collections::HashMap, sync::Arc};

    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;
    use crate::{config::read_config, testutil::eventually_async};

    /// Serves canned JSON bodies keyed by request path.
    async fn serve(routes: HashMap<&'static str, String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let routes = Arc::new(routes);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let request = String::from_utf8_lossy(&request);
                    let path = request.split_whitespace().nth(1).unwrap_or("");
                    let response = match routes.get(path) {
                        Some(body) => format!(
                            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        ),
                        None => "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string(),
                    };
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        format!("http://{}/api/devices/", address)
    }

    #[tokio::test]
    async fn test_poll_merges_and_saves() {
        let full = json!({
            "devicemeta": {"port1": 1},
            "shows": [{"type": 1, "colorsList": [[1, 2, 3]]}],
        });
        let base_url = serve(HashMap::from([
            ("/api/devices/7/data", full.to_string()),
            ("/api/devices/7/newdata", "{}".to_string()),
        ]))
        .await;

        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let (poller, config_rx, network_rx) = Poller::new(
            &base_url,
            7,
            Duration::from_millis(20),
            config_path.clone(),
            ShowConfig::default(),
        )
        .unwrap();
        let cancel_handle = CancelHandle::new();
        let join = tokio::spawn(poller.run(cancel_handle.clone()));

        let expected: ShowConfig = serde_json::from_value(full).unwrap();
        eventually_async(
            || {
                let config_rx = config_rx.clone();
                let expected = expected.clone();
                async move { *config_rx.borrow() == expected }
            },
            "Config was never published",
        )
        .await;
        assert!(*network_rx.borrow());
        assert_eq!(expected, read_config(&config_path).unwrap());

        cancel_handle.cancel();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_poll_failure_clears_network_status() {
        let base_url = serve(HashMap::new()).await;
        let dir = tempfile::tempdir().unwrap();
        let (poller, config_rx, mut network_rx) = Poller::new(
            &base_url,
            7,
            Duration::from_millis(20),
            dir.path().join("config.json"),
            ShowConfig::default(),
        )
        .unwrap();
        let cancel_handle = CancelHandle::new();
        let join = tokio::spawn(poller.run(cancel_handle.clone()));

        // Every request fails with a 404, so the status is republished as false.
        tokio::time::timeout(Duration::from_secs(3), network_rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(!*network_rx.borrow());
        assert_eq!(ShowConfig::default(), *config_rx.borrow());
        assert!(!dir.path().join("config.json").exists());

        cancel_handle.cancel();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_repeated_sections_not_saved_again() {
        let full = json!({"devicemeta": {"port1": 1}}).to_string();
        let base_url = serve(HashMap::from([
            ("/api/devices/7/data", full.clone()),
            ("/api/devices/7/newdata", full),
        ]))
        .await;

        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let (poller, mut config_rx, _network_rx) = Poller::new(
            &base_url,
            7,
            Duration::from_millis(20),
            config_path.clone(),
            ShowConfig::default(),
        )
        .unwrap();
        let cancel_handle = CancelHandle::new();
        let join = tokio::spawn(poller.run(cancel_handle.clone()));

        tokio::time::timeout(Duration::from_secs(3), config_rx.changed())
            .await
            .unwrap()
            .unwrap();
        config_rx.borrow_and_update();
        std::fs::remove_file(&config_path).unwrap();

        // Several polls return the same section.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!config_path.exists());
        assert!(!config_rx.has_changed().unwrap());

        cancel_handle.cancel();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_during_request() {
        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let (poller, _, _) = Poller::new(
            &format!("http://{}/api/devices/", address),
            7,
            Duration::from_millis(20),
            dir.path().join("config.json"),
            ShowConfig::default(),
        )
        .unwrap();
        let cancel_handle = CancelHandle::new();
        let join = tokio::spawn(poller.run(cancel_handle.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel_handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), join)
            .await
            .expect("poller should stop while a request is pending")
            .unwrap();
    }

    #[tokio::test]
    async fn test_urls() {
        let (poller, _, _) = Poller::new(
            "https://attitude.lighting/api/devices/",
            42,
            Duration::from_secs(1),
            PathBuf::from("config.json"),
            ShowConfig::default(),
        )
        .unwrap();

        assert_eq!(
            "https://attitude.lighting/api/devices/42/data",
            poller.url(true)
        );
        assert_eq!(
            "https://attitude.lighting/api/devices/42/newdata",
            poller.url(false)
        );
    }
}
