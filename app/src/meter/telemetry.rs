use std::{sync::Arc, time::Duration};

use infrastructure::meter;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    core::{
        math::round_to,
        time::DateTime,
        unit::{Ampere, KiloWattHours, Volt, Watt},
    },
    notification::{Notifier, NotifyError},
};

use super::{
    domain::{MeterState, Reading, ThresholdCrossing},
    publisher::MeterPublisher,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub voltage: Volt,
    pub current: Ampere,
}

impl Sample {
    pub fn power(&self) -> Watt {
        Watt(round_to((self.voltage * self.current).0, 2))
    }

    pub fn energy(&self) -> KiloWattHours {
        KiloWattHours(round_to(self.power().as_kwh().0, 3))
    }
}

pub trait Sampler: Send {
    fn sample(&mut self) -> Sample;
}

//Mains around 220 V +-10 V, load between 5 A and 10 A
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn sample(&mut self) -> Sample {
        Sample {
            voltage: Volt(round_to(220.0 + self.rng.gen_range(-10.0..10.0), 2)),
            current: Ampere(round_to(5.0 + self.rng.gen_range(0.0..5.0), 2)),
        }
    }
}

pub struct TickReport {
    pub reading: Reading,
    pub alert: Option<JoinHandle<()>>,
}

pub struct TelemetryGenerator<S: Sampler, N: Notifier> {
    state: Arc<Mutex<MeterState>>,
    sampler: S,
    notifier: Arc<N>,
    device_id: String,
    publisher: MeterPublisher,
    notify_timeout: Duration,
}

impl<S: Sampler, N: Notifier> TelemetryGenerator<S, N> {
    pub fn new(
        state: Arc<Mutex<MeterState>>,
        sampler: S,
        notifier: Arc<N>,
        device_id: &str,
        publisher: MeterPublisher,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            state,
            sampler,
            notifier,
            device_id: device_id.to_string(),
            publisher,
            notify_timeout,
        }
    }

    //No-op unless the meter is on and publishing
    pub async fn tick(&mut self) -> Option<TickReport> {
        let (reading, crossing) = {
            let mut state = self.state.lock().await;

            if !(state.is_on() && state.is_publishing()) {
                return None;
            }

            let sample = self.sampler.sample();
            let crossing = state.record_consumption(sample.energy());

            let reading = Reading {
                device_id: self.device_id.clone(),
                voltage: sample.voltage,
                current: sample.current,
                power: sample.power(),
                accumulated_energy: state.accumulated_energy(),
                timestamp: DateTime::now(),
            };

            (reading, crossing)
        };

        let alert = crossing.map(|crossing| self.spawn_alert(crossing));

        self.publisher.publish_reading(&reading).await;

        meter::increment("smart_meter_readings_total", &[("device", self.device_id.as_str())]);
        meter::set(
            "smart_meter_accumulated_energy_kwh",
            reading.accumulated_energy.0,
            &[("device", self.device_id.as_str())],
        );
        tracing::debug!("Reading -> {:.3} kWh", reading.accumulated_energy.0);

        Some(TickReport { reading, alert })
    }

    fn spawn_alert(&self, crossing: ThresholdCrossing) -> JoinHandle<()> {
        tracing::warn!(
            "Energy {} reached warning limit {} of threshold {}",
            crossing.energy,
            crossing.warn_limit,
            crossing.threshold
        );

        let notifier = self.notifier.clone();
        let timeout = self.notify_timeout;

        tokio::spawn(async move {
            let body = crossing.body();
            let result = match tokio::time::timeout(timeout, notifier.notify(crossing.subject(), &body)).await {
                Ok(result) => result,
                Err(_) => Err(NotifyError::Timeout { timeout }),
            };

            match result {
                Ok(()) => {
                    tracing::info!("Usage alert sent");
                    meter::increment("smart_meter_notifications_total", &[("outcome", "sent")]);
                }
                Err(e) => {
                    tracing::error!("Usage alert could not be delivered: {}", e);
                    meter::increment("smart_meter_notifications_total", &[("outcome", "failed")]);
                }
            }
        })
    }
}
