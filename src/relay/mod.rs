//! MQTT relay - connection and subscription lifecycle

mod connection;

pub use connection::{MqttRelay, RelayHandle};
