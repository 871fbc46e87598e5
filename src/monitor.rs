/// Upstream door poller
///
/// Reads the door sensor endpoint on a fixed interval and records every
/// status change in the [`DoorDb`]. Upstream failures are reported as
/// `Unknown` rather than aborting the loop.
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::door::DoorStatus;
use crate::store::{DoorDb, Transition};

/// Body returned by the sensor endpoint.
#[derive(Debug, Deserialize)]
struct UpstreamStatus {
    status: bool,
}

/// Map an upstream JSON body to a door status.
pub fn parse_upstream(body: &str) -> Result<DoorStatus> {
    let upstream: UpstreamStatus =
        serde_json::from_str(body).context("Failed to parse upstream door status")?;
    Ok(if upstream.status {
        DoorStatus::Open
    } else {
        DoorStatus::Closed
    })
}

/// Something that can report the door's current status.
pub trait StatusSource {
    fn fetch(&mut self) -> impl Future<Output = DoorStatus>;
}

/// HTTP client for the sensor endpoint.
pub struct HttpStatusSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpStatusSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, url })
    }

    async fn try_fetch(&self) -> Result<DoorStatus> {
        let body = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?
            .error_for_status()
            .with_context(|| format!("Upstream {} returned an error", self.url))?
            .text()
            .await
            .context("Failed to read upstream response body")?;
        parse_upstream(&body)
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch(&mut self) -> DoorStatus {
        match self.try_fetch().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Failed to fetch door status: {:#}", e);
                DoorStatus::Unknown
            }
        }
    }
}

/// Poll once and record the observed status if it changed.
pub async fn poll_once<S: StatusSource>(db: &DoorDb, source: &mut S) -> Result<Option<Transition>> {
    let observed = source.fetch().await;
    let now = Utc::now();
    let transition = db.record_if_changed(observed, now)?;

    match &transition {
        Some(t) => tracing::info!(
            from = %t.from,
            to = %t.to,
            "Door status changed at {}: {} -> {}",
            t.at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
            t.from,
            t.to
        ),
        None => tracing::trace!(status = %observed, "Door status unchanged"),
    }

    Ok(transition)
}

/// Poll every `interval` until `shutdown` resolves.
pub async fn run<S, F>(db: &DoorDb, source: &mut S, interval: Duration, shutdown: F) -> Result<()>
where
    S: StatusSource,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!(interval_ms = interval.as_millis() as u64, "Door monitor started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Door monitor stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                poll_once(db, source).await?;
            }
        }
    }
}
