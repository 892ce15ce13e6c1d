use std::sync::Arc;

use infrastructure::{MqttInMessage, meter};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::core::math::round_to;

use super::{
    MeterTopics,
    domain::{Acknowledgement, Bill, CommandMessage, MeterCommand, MeterState, Tariff, ThresholdInput},
    publisher::MeterPublisher,
};

enum Route {
    Threshold,
    Command,
    Ignored,
}

struct CommandOutcome {
    ack: String,
    bill: Option<Bill>,
}

impl CommandOutcome {
    fn ack(text: impl Into<String>) -> Self {
        Self {
            ack: text.into(),
            bill: None,
        }
    }
}

pub struct CommandProcessor {
    state: Arc<Mutex<MeterState>>,
    identity: String,
    device_id: String,
    tariff: Tariff,
    topics: MeterTopics,
    publisher: MeterPublisher,
}

impl CommandProcessor {
    pub fn new(
        state: Arc<Mutex<MeterState>>,
        identity: &str,
        device_id: &str,
        tariff: Tariff,
        topics: MeterTopics,
        publisher: MeterPublisher,
    ) -> Self {
        Self {
            state,
            identity: identity.to_string(),
            device_id: device_id.to_string(),
            tariff,
            topics,
            publisher,
        }
    }

    #[tracing::instrument(skip_all, fields(topic = %msg.topic))]
    pub async fn handle(&self, msg: &MqttInMessage) {
        match self.route(&msg.topic) {
            Route::Threshold => {
                if let Some(input) = self.parse_foreign::<ThresholdInput>(msg, |input| &input.sender) {
                    tracing::debug!(
                        "Threshold input {:?} from {} (sent {:?})",
                        input.value,
                        input.sender,
                        input.timestamp.as_ref().map(ToString::to_string)
                    );
                    self.handle_threshold(input).await;
                }
            }
            Route::Command => {
                if let Some(cmd_msg) = self.parse_foreign::<CommandMessage>(msg, |cmd| &cmd.sender) {
                    tracing::debug!(
                        "Command '{}' from {} (sent {:?})",
                        cmd_msg.command,
                        cmd_msg.sender,
                        cmd_msg.timestamp.as_ref().map(ToString::to_string)
                    );
                    self.handle_command(cmd_msg.command()).await;
                }
            }
            Route::Ignored => {
                tracing::trace!("Ignoring message on {}", msg.topic);
            }
        }
    }

    fn route(&self, topic: &str) -> Route {
        if topic.eq_ignore_ascii_case(&self.topics.threshold) {
            Route::Threshold
        } else if topic.eq_ignore_ascii_case(&self.topics.commands) {
            Route::Command
        } else {
            Route::Ignored
        }
    }

    //Returns None for payloads that are malformed or were sent by this device
    fn parse_foreign<T: DeserializeOwned>(&self, msg: &MqttInMessage, sender: impl Fn(&T) -> &String) -> Option<T> {
        let parsed: T = match serde_json::from_str(&msg.payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Discarding malformed message on {}: {} ({:?})", msg.topic, e, msg.payload);
                return None;
            }
        };

        if sender(&parsed) == &self.identity {
            tracing::trace!("Ignoring own message on {}", msg.topic);
            return None;
        }

        Some(parsed)
    }

    async fn handle_threshold(&self, input: ThresholdInput) {
        let ack = {
            let mut state = self.state.lock().await;

            match input.threshold() {
                Ok(threshold) => {
                    state.set_threshold(threshold);
                    tracing::info!(
                        "Threshold set to {} by {}, warning at {}",
                        threshold,
                        input.sender,
                        state.warn_limit()
                    );
                    format!(
                        "Threshold set to {} kWh (warning at {} kWh)",
                        threshold.0,
                        round_to(state.warn_limit().0, 3)
                    )
                }
                Err(e) => {
                    tracing::warn!("Rejected threshold from {}: {}", input.sender, e);
                    e.to_string()
                }
            }
        };

        self.acknowledge(ack).await;
    }

    async fn handle_command(&self, command: MeterCommand) {
        meter::increment("smart_meter_commands_total", &[("command", command.metric_label())]);

        let outcome = self.execute(&command).await;

        if let Some(bill) = &outcome.bill {
            self.publisher.publish_bill(bill).await;
        }

        self.acknowledge(outcome.ack).await;
    }

    async fn execute(&self, command: &MeterCommand) -> CommandOutcome {
        let mut state = self.state.lock().await;
        let before = state.mode();

        let outcome = match command {
            MeterCommand::On => {
                state.turn_on();
                CommandOutcome::ack("Smart Meter turned ON")
            }
            MeterCommand::Off => {
                state.turn_off();
                CommandOutcome::ack("Smart Meter turned OFF")
            }
            MeterCommand::ViewReadings => match state.start_publishing() {
                Ok(()) => CommandOutcome::ack("Started viewing meter readings"),
                Err(e) => CommandOutcome::ack(e.to_string()),
            },
            MeterCommand::GenerateBill => match state.ensure_on("generate bill") {
                Ok(()) => {
                    let bill = Bill::calculate(&self.device_id, state.accumulated_energy(), self.tariff.rate);
                    tracing::info!("Bill generated for {}: {}", bill.total_energy, bill.amount);

                    CommandOutcome {
                        ack: format!("Bill generated: {}", bill.formatted_amount(&self.tariff)),
                        bill: Some(bill),
                    }
                }
                Err(e) => CommandOutcome::ack(e.to_string()),
            },
            MeterCommand::Unrecognized(text) => CommandOutcome::ack(format!("Unknown command: {}", text)),
        };

        if before != state.mode() {
            tracing::info!("Meter {} -> {} on command '{}'", before, state.mode(), command);
        }

        outcome
    }

    async fn acknowledge(&self, text: String) {
        let ack = Acknowledgement::new(&self.identity, text);
        tracing::debug!("Acknowledging: {}", ack.message);
        self.publisher.acknowledge(&ack).await;
    }
}
