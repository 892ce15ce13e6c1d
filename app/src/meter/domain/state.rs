use derive_more::derive::{Display, Error};

use crate::core::unit::KiloWattHours;

pub const WARN_RATIO: f64 = 0.90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MeterMode {
    #[display("OFF")]
    Off,
    #[display("ON")]
    On,
    #[display("ON (publishing)")]
    Publishing,
}

#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum MeterError {
    #[display("Cannot {action} - meter is OFF")]
    MeterOff { action: &'static str },

    #[display("Invalid threshold input: {input}")]
    InvalidThreshold { input: String },
}

//Reported once per threshold cycle when consumption reaches the warning limit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdCrossing {
    pub energy: KiloWattHours,
    pub threshold: KiloWattHours,
    pub warn_limit: KiloWattHours,
}

impl ThresholdCrossing {
    pub fn subject(&self) -> &'static str {
        "Smart Meter Usage Alert"
    }

    pub fn body(&self) -> String {
        format!(
            "Your energy usage reached {:.0}% of the threshold.\n\n\
             Energy Used: {:.2} kWh\n\
             Threshold: {:.2} kWh\n\
             Limit ({:.0}%): {:.2} kWh\n\n\
             Please recharge soon.",
            WARN_RATIO * 100.0,
            self.energy.0,
            self.threshold.0,
            WARN_RATIO * 100.0,
            self.warn_limit.0,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterState {
    is_on: bool,
    is_publishing: bool,
    accumulated_energy: KiloWattHours,
    threshold: KiloWattHours,
    warn_limit: KiloWattHours,
    notification_sent: bool,
}

impl MeterState {
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn is_publishing(&self) -> bool {
        self.is_publishing
    }

    pub fn accumulated_energy(&self) -> KiloWattHours {
        self.accumulated_energy
    }

    pub fn threshold(&self) -> KiloWattHours {
        self.threshold
    }

    pub fn warn_limit(&self) -> KiloWattHours {
        self.warn_limit
    }

    pub fn notification_sent(&self) -> bool {
        self.notification_sent
    }

    pub fn mode(&self) -> MeterMode {
        match (self.is_on, self.is_publishing) {
            (false, _) => MeterMode::Off,
            (true, false) => MeterMode::On,
            (true, true) => MeterMode::Publishing,
        }
    }

    pub fn turn_on(&mut self) {
        self.is_on = true;
        self.is_publishing = false;
        self.start_new_cycle();
    }

    //energy and threshold survive a power cycle until the next `on`
    pub fn turn_off(&mut self) {
        self.is_on = false;
        self.is_publishing = false;
    }

    pub fn start_publishing(&mut self) -> Result<(), MeterError> {
        self.ensure_on("view readings")?;
        self.is_publishing = true;
        Ok(())
    }

    pub fn ensure_on(&self, action: &'static str) -> Result<(), MeterError> {
        if self.is_on {
            Ok(())
        } else {
            Err(MeterError::MeterOff { action })
        }
    }

    pub fn set_threshold(&mut self, threshold: KiloWattHours) {
        self.threshold = threshold;
        self.warn_limit = KiloWattHours(threshold.0 * WARN_RATIO);
        self.start_new_cycle();
    }

    pub fn record_consumption(&mut self, energy: KiloWattHours) -> Option<ThresholdCrossing> {
        self.accumulated_energy += energy;

        if self.warn_limit.0 > 0.0 && self.accumulated_energy >= self.warn_limit && !self.notification_sent {
            self.notification_sent = true;

            return Some(ThresholdCrossing {
                energy: self.accumulated_energy,
                threshold: self.threshold,
                warn_limit: self.warn_limit,
            });
        }

        None
    }

    fn start_new_cycle(&mut self) {
        self.accumulated_energy = KiloWattHours(0.0);
        self.notification_sent = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kwh(value: f64) -> KiloWattHours {
        KiloWattHours(value)
    }

    #[test]
    fn starts_off_with_everything_zeroed() {
        let state = MeterState::default();

        assert_eq!(state.mode(), MeterMode::Off);
        assert_eq!(state.accumulated_energy(), kwh(0.0));
        assert_eq!(state.threshold(), kwh(0.0));
        assert_eq!(state.warn_limit(), kwh(0.0));
        assert!(!state.notification_sent());
    }

    #[test]
    fn on_resets_energy_and_latch() {
        let mut state = MeterState::default();
        state.set_threshold(kwh(1.0));
        state.turn_on();
        state.start_publishing().unwrap();
        assert!(state.record_consumption(kwh(2.0)).is_some());

        state.turn_on();

        assert_eq!(state.mode(), MeterMode::On);
        assert_eq!(state.accumulated_energy(), kwh(0.0));
        assert!(!state.notification_sent());
        assert_eq!(state.threshold(), kwh(1.0));
    }

    #[test]
    fn off_keeps_energy_and_threshold() {
        let mut state = MeterState::default();
        state.set_threshold(kwh(10.0));
        state.turn_on();
        state.record_consumption(kwh(3.0));

        state.turn_off();

        assert_eq!(state.mode(), MeterMode::Off);
        assert_eq!(state.accumulated_energy(), kwh(3.0));
        assert_eq!(state.threshold(), kwh(10.0));
    }

    #[test]
    fn off_is_idempotent() {
        let mut once = MeterState::default();
        once.turn_on();
        once.turn_off();

        let mut twice = once.clone();
        twice.turn_off();

        assert_eq!(once, twice);
        assert!(!twice.is_on());
        assert!(!twice.is_publishing());
    }

    #[test]
    fn publishing_requires_meter_on() {
        let mut state = MeterState::default();

        let result = state.start_publishing();

        assert_eq!(
            result,
            Err(MeterError::MeterOff {
                action: "view readings"
            })
        );
        assert!(!state.is_publishing());
    }

    #[test]
    fn threshold_derives_warn_limit_and_starts_new_cycle() {
        let mut state = MeterState::default();
        state.turn_on();
        state.record_consumption(kwh(4.2));

        state.set_threshold(kwh(10.0));

        assert_eq!(state.warn_limit(), kwh(9.0));
        assert_eq!(state.accumulated_energy(), kwh(0.0));
        assert!(!state.notification_sent());
        assert!(state.is_on());
    }

    #[test]
    fn crossing_is_reported_once_per_cycle() {
        let mut state = MeterState::default();
        state.set_threshold(kwh(10.0));

        let crossings: Vec<_> = (0..8).filter_map(|_| state.record_consumption(kwh(1.5))).collect();

        assert_eq!(crossings.len(), 1);
        assert_eq!(crossings[0].energy, kwh(9.0));
        assert_eq!(crossings[0].warn_limit, kwh(9.0));
        assert!(state.notification_sent());
    }

    #[test]
    fn no_crossing_without_threshold() {
        let mut state = MeterState::default();

        assert!(state.record_consumption(kwh(1000.0)).is_none());
        assert!(!state.notification_sent());
    }

    #[test]
    fn alert_body_lists_energy_threshold_and_limit() {
        let crossing = ThresholdCrossing {
            energy: kwh(9.0),
            threshold: kwh(10.0),
            warn_limit: kwh(9.0),
        };

        let body = crossing.body();

        assert!(body.contains("reached 90% of the threshold"));
        assert!(body.contains("Energy Used: 9.00 kWh"));
        assert!(body.contains("Threshold: 10.00 kWh"));
        assert!(body.contains("Limit (90%): 9.00 kWh"));
    }
}
