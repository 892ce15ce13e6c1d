pub mod domain;
mod publisher;
mod service;
mod telemetry;

use std::{sync::Arc, time::Duration};

use infrastructure::{MqttOutMessage, MqttSubscription};
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::notification::Notifier;

use domain::{MeterState, Tariff};
use publisher::MeterPublisher;
use service::CommandProcessor;
use telemetry::{RandomSampler, Sampler, TelemetryGenerator};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeterSettings {
    pub device_id: String,
    pub identity: String,
    pub tariff_rate: f64,
    pub currency_symbol: String,
    pub publish_interval_secs: u64,
    pub notify_timeout_secs: u64,
    pub topics: MeterTopics,
}

impl MeterSettings {
    pub fn tariff(&self) -> Tariff {
        Tariff {
            rate: self.tariff_rate,
            currency_symbol: self.currency_symbol.clone(),
        }
    }
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            device_id: "SM-001".to_string(),
            identity: "SmartMeter".to_string(),
            tariff_rate: Tariff::default().rate,
            currency_symbol: Tariff::default().currency_symbol,
            publish_interval_secs: 4,
            notify_timeout_secs: 30,
            topics: MeterTopics::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MeterTopics {
    pub commands: String,
    pub threshold: String,
    pub data: String,
    pub bill: String,
    pub subscription: String,
}

impl Default for MeterTopics {
    fn default() -> Self {
        Self {
            commands: "smartmeter/commands".to_string(),
            threshold: "smartmeter/userinput".to_string(),
            data: "smartmeter/data".to_string(),
            bill: "smartmeter/bill".to_string(),
            subscription: "smartmeter/#".to_string(),
        }
    }
}

pub struct MeterRunner<S: Sampler, N: Notifier> {
    processor: CommandProcessor,
    generator: TelemetryGenerator<S, N>,
    subscription: MqttSubscription,
    publish_interval: Duration,
    shutdown: CancellationToken,
}

impl<N: Notifier> MeterRunner<RandomSampler, N> {
    pub fn new(
        settings: &MeterSettings,
        subscription: MqttSubscription,
        mqtt_sender: mpsc::Sender<MqttOutMessage>,
        notifier: N,
        shutdown: CancellationToken,
    ) -> Self {
        Self::with_sampler(settings, subscription, mqtt_sender, notifier, RandomSampler::new(), shutdown)
    }
}

impl<S: Sampler, N: Notifier> MeterRunner<S, N> {
    pub fn with_sampler(
        settings: &MeterSettings,
        subscription: MqttSubscription,
        mqtt_sender: mpsc::Sender<MqttOutMessage>,
        notifier: N,
        sampler: S,
        shutdown: CancellationToken,
    ) -> Self {
        let state = Arc::new(Mutex::new(MeterState::default()));
        let publisher = MeterPublisher::new(mqtt_sender, settings.topics.clone());

        let processor = CommandProcessor::new(
            state.clone(),
            &settings.identity,
            &settings.device_id,
            settings.tariff(),
            settings.topics.clone(),
            publisher.clone(),
        );

        let generator = TelemetryGenerator::new(
            state,
            sampler,
            Arc::new(notifier),
            &settings.device_id,
            publisher,
            Duration::from_secs(settings.notify_timeout_secs),
        );

        Self {
            processor,
            generator,
            subscription,
            publish_interval: Duration::from_secs(settings.publish_interval_secs.max(1)),
            shutdown,
        }
    }

    pub async fn run(self) {
        let Self {
            processor,
            mut generator,
            mut subscription,
            publish_interval,
            shutdown,
        } = self;

        let process_commands = async {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    msg = subscription.recv() => match msg {
                        Some(msg) => processor.handle(&msg).await,
                        None => {
                            tracing::error!("MQTT subscription closed, no more commands will be processed");
                            break;
                        }
                    },
                }
            }
        };

        let publish_readings = async {
            let mut timer = tokio::time::interval(publish_interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = timer.tick() => {
                        generator.tick().await;
                    },
                }
            }
        };

        tokio::join!(process_commands, publish_readings);
        tracing::info!("Smart meter stopped");
    }
}
