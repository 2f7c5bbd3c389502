use anyhow::{Context, Result};
use async_nats::Client;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::session::SessionEvent;

/// Mirrors a session's event stream onto NATS so observers outside the
/// process can follow along. Purely additive: in-process delivery does not
/// depend on it, and a missing NATS URL disables it entirely.
pub struct NatsEventMirror {
    client: Client,
}

impl NatsEventMirror {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    pub fn subject_for(session_id: &str) -> String {
        format!("minutes.events.{}", session_id)
    }

    /// Forward every event from `events` to this session's subject until
    /// the channel closes. Lagging just skips; publish failures are logged
    /// and do not stop the mirror.
    pub fn spawn_mirror(
        &self,
        session_id: String,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> JoinHandle<()> {
        let client = self.client.clone();

        tokio::spawn(async move {
            let subject = Self::subject_for(&session_id);
            info!("Mirroring session events to {}", subject);

            loop {
                match events.recv().await {
                    Ok(event) => {
                        let payload = match serde_json::to_vec(&event) {
                            Ok(payload) => payload,
                            Err(e) => {
                                warn!("Failed to serialize event for {}: {}", subject, e);
                                continue;
                            }
                        };

                        if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                            warn!("Failed to publish event to {}: {}", subject, e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("NATS mirror for {} lagged, {} events dropped", subject, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            info!("Event mirror for {} stopped", subject);
        })
    }
}
