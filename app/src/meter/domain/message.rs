use serde::{Deserialize, Serialize};

use crate::core::{
    time::DateTime,
    unit::{Ampere, KiloWattHours, Volt, Watt},
};

const ACK_STATUS: &str = "ack";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub device_id: String,
    pub voltage: Volt,
    pub current: Ampere,
    pub power: Watt,
    pub accumulated_energy: KiloWattHours,
    pub timestamp: DateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub sender: String,
    pub status: String,
    pub message: String,
    pub timestamp: DateTime,
}

impl Acknowledgement {
    pub fn new(sender: &str, message: impl Into<String>) -> Self {
        Self {
            sender: sender.to_string(),
            status: ACK_STATUS.to_string(),
            message: message.into(),
            timestamp: DateTime::now(),
        }
    }
}
