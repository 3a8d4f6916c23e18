//! Transfer speed monitoring for the bound interface
//!
//! Samples the interface's sysfs byte counters on a fixed interval and
//! broadcasts KB/s figures to subscribers. Runs as a background task and
//! stops cooperatively between samples.

use crate::error::{Ps2NetError, Ps2NetResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Speed monitor events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpeedEvent {
    /// Measured speeds over the last interval, in KB/s
    Sample { upload_kbps: f64, download_kbps: f64 },
    /// The monitored interface disappeared; the monitor has stopped
    InterfaceLost { interface: String },
}

/// Background monitor for one interface's transfer speed
pub struct NetSpeedMonitor {
    interface: String,
    interval: Duration,
    event_tx: broadcast::Sender<SpeedEvent>,
    running: Arc<tokio::sync::RwLock<bool>>,
}

impl NetSpeedMonitor {
    pub fn new(interface: impl Into<String>, interval: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            interface: interface.into(),
            interval,
            event_tx,
            running: Arc::new(tokio::sync::RwLock::new(false)),
        }
    }

    /// Subscribe to speed events
    pub fn subscribe(&self) -> broadcast::Receiver<SpeedEvent> {
        self.event_tx.subscribe()
    }

    /// Start sampling in a background task
    pub async fn start(&self) -> Ps2NetResult<()> {
        let mut running = self.running.write().await;
        if *running {
            return Err(Ps2NetError::InvalidState(
                "Speed monitor already running".to_string()
            ));
        }
        *running = true;
        drop(running);

        info!("Starting speed monitor for {}", self.interface);

        let interface = self.interface.clone();
        let interval = self.interval;
        let event_tx = self.event_tx.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::monitor_loop(interface, interval, event_tx, running).await {
                error!("Speed monitor error: {}", e);
            }
        });

        Ok(())
    }

    /// Ask the background task to stop after its current sample
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        info!("Stopped speed monitor for {}", self.interface);
    }

    async fn monitor_loop(
        interface: String,
        interval: Duration,
        event_tx: broadcast::Sender<SpeedEvent>,
        running: Arc<tokio::sync::RwLock<bool>>,
    ) -> Ps2NetResult<()> {
        while *running.read().await {
            let before = match Self::read_counters(&interface).await {
                Some(counters) => counters,
                None => {
                    warn!("Interface {} not found, stopping speed monitor", interface);
                    *running.write().await = false;
                    let _ = event_tx.send(SpeedEvent::InterfaceLost { interface });
                    return Ok(());
                }
            };

            sleep(interval).await;

            let after = match Self::read_counters(&interface).await {
                Some(counters) => counters,
                None => {
                    warn!("Interface {} not found, stopping speed monitor", interface);
                    *running.write().await = false;
                    let _ = event_tx.send(SpeedEvent::InterfaceLost { interface });
                    return Ok(());
                }
            };

            let secs = interval.as_secs_f64();
            let upload_kbps = (after.0.saturating_sub(before.0)) as f64 / secs / 1024.0;
            let download_kbps = (after.1.saturating_sub(before.1)) as f64 / secs / 1024.0;

            let _ = event_tx.send(SpeedEvent::Sample { upload_kbps, download_kbps });
        }

        Ok(())
    }

    /// (tx_bytes, rx_bytes) for the interface, or None if it is gone
    async fn read_counters(interface: &str) -> Option<(u64, u64)> {
        let stats_dir = PathBuf::from("/sys/class/net").join(interface).join("statistics");

        let tx = Self::read_u64(stats_dir.join("tx_bytes")).await?;
        let rx = Self::read_u64(stats_dir.join("rx_bytes")).await?;
        Some((tx, rx))
    }

    async fn read_u64(path: PathBuf) -> Option<u64> {
        fs::read_to_string(path).await.ok()?.trim().parse().ok()
    }
}
