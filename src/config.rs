//! Relay configuration, loaded from the environment with sensible defaults

use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;

/// Configuration for the MQTT relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Broker URL, e.g. "mqtt://127.0.0.1:1883"
    pub broker_url: String,
    /// Client ID presented to the broker
    pub client_id: String,
    /// Topic the relay subscribes to
    pub topic: String,
    /// MQTT keep-alive interval
    pub keep_alive: Duration,
    /// Broker username (applied only together with a password)
    pub username: Option<String>,
    /// Broker password (applied only together with a username)
    pub password: Option<String>,
    /// Number of dispatch lanes (same-employee events share a lane)
    pub lanes: usize,
    /// Per-lane channel capacity
    pub lane_capacity: usize,
    /// rumqttc request channel capacity
    pub event_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            broker_url: "mqtt://127.0.0.1:1883".into(),
            client_id: "attendance-relay".into(),
            topic: "attendance/device/events".into(),
            keep_alive: Duration::from_secs(60),
            username: None,
            password: None,
            lanes: 4,
            lane_capacity: 64,
            event_capacity: 100,
        }
    }
}

impl RelayConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparseable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            broker_url: env::var("MQTT_URL").unwrap_or(defaults.broker_url),
            client_id: env::var("MQTT_CLIENT_ID").unwrap_or(defaults.client_id),
            topic: env::var("MQTT_TOPIC").unwrap_or(defaults.topic),
            keep_alive: env::var("MQTT_KEEPALIVE")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.keep_alive),
            username: env::var("MQTT_USERNAME").ok(),
            password: env::var("MQTT_PASSWORD").ok(),
            lanes: env::var("RELAY_LANES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.lanes),
            lane_capacity: defaults.lane_capacity,
            event_capacity: defaults.event_capacity,
        }
    }

    /// Host and port to hand to the MQTT client
    pub fn broker_addr(&self) -> Result<(String, u16)> {
        parse_broker_url(&self.broker_url)
    }

    /// Credentials, present only when both username and password are set
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            _ => None,
        }
    }
}

/// Parse "mqtt://host:port" (scheme and port optional) into host and port
fn parse_broker_url(url: &str) -> Result<(String, u16)> {
    let rest = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url)
        .trim_end_matches('/');

    if rest.is_empty() {
        return Err(anyhow!("empty broker url"));
    }

    match rest.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                return Err(anyhow!("missing host in broker url: {}", url));
            }
            let port = port
                .parse()
                .map_err(|_| anyhow!("invalid port in broker url: {}", url))?;
            Ok((host.to_string(), port))
        }
        None => Ok((rest.to_string(), 1883)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_url_with_scheme_and_port() {
        let (host, port) = parse_broker_url("mqtt://broker.local:1884").unwrap();
        assert_eq!(host, "broker.local");
        assert_eq!(port, 1884);
    }

    #[test]
    fn parse_url_defaults_port() {
        let (host, port) = parse_broker_url("tcp://10.0.0.5").unwrap();
        assert_eq!(host, "10.0.0.5");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_bare_host() {
        let (host, port) = parse_broker_url("localhost:1883").unwrap();
        assert_eq!(host, "localhost");
        assert_eq!(port, 1883);
    }

    #[test]
    fn parse_rejects_bad_port() {
        assert!(parse_broker_url("mqtt://broker:abc").is_err());
        assert!(parse_broker_url("").is_err());
    }

    #[test]
    fn credentials_require_both_parts() {
        let mut config = RelayConfig {
            username: Some("terminal".into()),
            ..Default::default()
        };
        assert!(config.credentials().is_none());

        config.password = Some("secret".into());
        assert_eq!(config.credentials(), Some(("terminal", "secret")));
    }

    #[test]
    fn defaults_are_sane() {
        let config = RelayConfig::default();
        assert_eq!(config.keep_alive, Duration::from_secs(60));
        assert!(config.lanes >= 1);
        assert!(config.broker_addr().is_ok());
    }
}
