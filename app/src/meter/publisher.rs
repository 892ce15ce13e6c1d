use std::time::Duration;

use infrastructure::MqttOutMessage;
use serde::Serialize;
use tokio::sync::mpsc;

use super::{
    MeterTopics,
    domain::{Acknowledgement, Bill, Reading},
};

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

//Best effort: delivery is left to the MQTT client, failures are only logged
#[derive(Clone)]
pub struct MeterPublisher {
    tx: mpsc::Sender<MqttOutMessage>,
    topics: MeterTopics,
}

impl MeterPublisher {
    pub fn new(tx: mpsc::Sender<MqttOutMessage>, topics: MeterTopics) -> Self {
        Self { tx, topics }
    }

    pub async fn publish_reading(&self, reading: &Reading) {
        self.publish(&self.topics.data, reading).await
    }

    pub async fn publish_bill(&self, bill: &Bill) {
        self.publish(&self.topics.bill, bill).await
    }

    pub async fn acknowledge(&self, ack: &Acknowledgement) {
        self.publish(&self.topics.commands, ack).await
    }

    async fn publish<T: Serialize>(&self, topic: &str, payload: &T) {
        let payload = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Error serializing payload for {}: {}", topic, e);
                return;
            }
        };

        if let Err(e) = self
            .tx
            .send_timeout(MqttOutMessage::transient(topic, payload), PUBLISH_TIMEOUT)
            .await
        {
            tracing::error!("Error queueing MQTT message for {}: {}", topic, e);
        }
    }
}
