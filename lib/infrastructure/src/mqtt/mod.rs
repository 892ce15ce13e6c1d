mod client;
mod receiver;

pub use client::Mqtt;
pub use receiver::{MqttInMessage, MqttSubscription};

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct MqttConfig {
    host: String,
    port: u16,
    client_id: String,
    username: Option<String>,
    password: Option<String>,
    #[serde(default = "default_keep_alive_secs")]
    keep_alive_secs: u64,
}

fn default_keep_alive_secs() -> u64 {
    5
}

impl MqttConfig {
    pub fn new_client(&self) -> Mqtt {
        let credentials = match (&self.username, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            (Some(user), None) => Some((user.as_str(), "")),
            _ => None,
        };

        Mqtt::connect(&self.host, self.port, &self.client_id, credentials, self.keep_alive_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttOutMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl MqttOutMessage {
    pub fn transient(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: false,
        }
    }
}
