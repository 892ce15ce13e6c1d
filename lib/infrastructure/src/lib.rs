mod monitoring;
mod mqtt;

pub use monitoring::MonitoringConfig;

pub use mqtt::{Mqtt, MqttConfig, MqttInMessage, MqttOutMessage, MqttSubscription};

pub mod meter {
    pub use super::monitoring::meter::{increment, set};
}
