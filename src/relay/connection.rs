//! Broker connection handling
//!
//! The relay owns a single broker connection: it subscribes to the configured
//! topic once connected and forwards every decoded publish into the dispatch
//! queue. Reconnection is rumqttc's job - on a transport error the loop logs,
//! backs off briefly and polls again, which re-establishes the session.

use crate::config::RelayConfig;
use crate::dispatch::DispatchQueue;
use crate::event::{DecodeError, DeviceEvent};
use anyhow::Result;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Delay before re-polling after a transport error
const RECONNECT_POLL_DELAY: Duration = Duration::from_secs(1);

/// Handle for shutting the relay down from outside its run loop
#[derive(Clone)]
pub struct RelayHandle {
    client: AsyncClient,
    shutdown: Arc<AtomicBool>,
}

impl RelayHandle {
    /// Request a clean disconnect; the run loop exits once the transport closes
    pub async fn disconnect(&self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        self.client.disconnect().await?;
        Ok(())
    }
}

/// Subscribes to the event topic and feeds decoded events into dispatch
pub struct MqttRelay {
    topic: String,
    client: AsyncClient,
    eventloop: EventLoop,
    queue: DispatchQueue,
    shutdown: Arc<AtomicBool>,
}

impl MqttRelay {
    /// Build the relay from config. No network activity happens until
    /// [`MqttRelay::run`] starts polling.
    pub fn new(config: &RelayConfig, queue: DispatchQueue) -> Result<Self> {
        let (host, port) = config.broker_addr()?;

        let mut options = MqttOptions::new(&config.client_id, host, port);
        options.set_keep_alive(config.keep_alive);
        if let Some((user, pass)) = config.credentials() {
            options.set_credentials(user, pass);
        }

        let (client, eventloop) = AsyncClient::new(options, config.event_capacity);

        Ok(Self {
            topic: config.topic.clone(),
            client,
            eventloop,
            queue,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get a handle for requesting shutdown
    pub fn handle(&self) -> RelayHandle {
        RelayHandle {
            client: self.client.clone(),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Drive the connection until shutdown, then drain in-flight dispatches
    pub async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!(code = ?ack.code, "connected to MQTT broker");
                    // Subscribe on every (re)connect; a failed subscribe call
                    // leaves the connection up without an active subscription
                    if let Err(e) = self.client.subscribe(&self.topic, QoS::AtMostOnce).await {
                        error!(topic = %self.topic, error = %e, "subscribe request failed");
                    }
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    info!(topic = %self.topic, "subscription active");
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    Self::handle_publish(&self.queue, publish).await;
                }
                Ok(_) => {}
                Err(e) => {
                    if self.shutdown.load(Ordering::SeqCst) {
                        info!("relay disconnected");
                        break;
                    }
                    error!(error = %e, "MQTT connection error");
                    tokio::time::sleep(RECONNECT_POLL_DELAY).await;
                }
            }
        }

        self.queue.shutdown().await;
    }

    /// Decode one publish and queue it; every failure is terminal for the
    /// single message that caused it
    async fn handle_publish(queue: &DispatchQueue, publish: Publish) {
        match DeviceEvent::decode(&publish.payload) {
            Ok(event) => {
                debug!(
                    topic = %publish.topic,
                    cmd = event.cmd(),
                    employee_id = %event.employee_id(),
                    "event received"
                );
                queue.enqueue(event).await;
            }
            Err(e @ DecodeError::UnknownCmd(_)) => {
                warn!(topic = %publish.topic, error = %e, "unknown command, message dropped");
            }
            Err(e) => {
                warn!(topic = %publish.topic, error = %e, "undecodable message dropped");
            }
        }
    }
}
