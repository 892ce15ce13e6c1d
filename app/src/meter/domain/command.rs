use derive_more::derive::Display;
use serde::Deserialize;

use crate::core::{time::DateTime, unit::KiloWattHours};

use super::MeterError;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum MeterCommand {
    #[display("on")]
    On,
    #[display("off")]
    Off,
    #[display("view-readings")]
    ViewReadings,
    #[display("generate-bill")]
    GenerateBill,
    #[display("{_0}")]
    Unrecognized(String),
}

impl MeterCommand {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();

        match normalized.as_str() {
            "on" => MeterCommand::On,
            "off" => MeterCommand::Off,
            "view-readings" | "view readings" | "view meter readings" => MeterCommand::ViewReadings,
            "generate-bill" | "generate bill" => MeterCommand::GenerateBill,
            _ => MeterCommand::Unrecognized(normalized),
        }
    }

    pub fn metric_label(&self) -> &'static str {
        match self {
            MeterCommand::On => "on",
            MeterCommand::Off => "off",
            MeterCommand::ViewReadings => "view-readings",
            MeterCommand::GenerateBill => "generate-bill",
            MeterCommand::Unrecognized(_) => "unrecognized",
        }
    }
}

//Acknowledgements echoed back on the command topic deserialize here as well
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(alias = "Username")]
    pub sender: String,
    #[serde(default, alias = "Command")]
    pub command: String,
    #[serde(default, alias = "TimeStamp")]
    pub timestamp: Option<DateTime>,
}

impl CommandMessage {
    pub fn command(&self) -> MeterCommand {
        MeterCommand::parse(&self.command)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThresholdInput {
    #[serde(alias = "Username")]
    pub sender: String,
    #[serde(default, alias = "Command")]
    pub value: Option<ThresholdValue>,
    #[serde(default, alias = "TimeStamp")]
    pub timestamp: Option<DateTime>,
}

impl ThresholdInput {
    pub fn threshold(&self) -> Result<KiloWattHours, MeterError> {
        let parsed = match &self.value {
            Some(ThresholdValue::Number(value)) => Some(*value),
            Some(ThresholdValue::Text(text)) => text.trim().parse::<f64>().ok(),
            Some(ThresholdValue::Other(_)) | None => None,
        };

        match parsed {
            Some(value) if value.is_finite() && value >= 0.0 => Ok(KiloWattHours(value)),
            _ => Err(MeterError::InvalidThreshold { input: self.raw_value() }),
        }
    }

    fn raw_value(&self) -> String {
        match &self.value {
            Some(ThresholdValue::Number(value)) => value.to_string(),
            Some(ThresholdValue::Text(text)) => text.clone(),
            Some(ThresholdValue::Other(value)) => value.to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_case_and_whitespace_insensitive() {
        assert_eq!(MeterCommand::parse("on"), MeterCommand::On);
        assert_eq!(MeterCommand::parse("  OFF \n"), MeterCommand::Off);
        assert_eq!(MeterCommand::parse("View-Readings"), MeterCommand::ViewReadings);
        assert_eq!(MeterCommand::parse("generate-bill"), MeterCommand::GenerateBill);
    }

    #[test]
    fn accepts_spaced_command_aliases() {
        assert_eq!(MeterCommand::parse("View Meter Readings"), MeterCommand::ViewReadings);
        assert_eq!(MeterCommand::parse("view readings"), MeterCommand::ViewReadings);
        assert_eq!(MeterCommand::parse("Generate Bill"), MeterCommand::GenerateBill);
    }

    #[test]
    fn unknown_command_keeps_normalized_text() {
        let cmd = MeterCommand::parse(" Reboot ");

        assert_eq!(cmd, MeterCommand::Unrecognized("reboot".to_string()));
        assert_eq!(cmd.to_string(), "reboot");
        assert_eq!(cmd.metric_label(), "unrecognized");
    }

    #[test]
    fn deserializes_command_message() {
        let msg: CommandMessage = serde_json::from_str(
            r#"{"sender": "admin", "command": "on", "timestamp": "2024-11-03T14:23:46Z"}"#,
        )
        .unwrap();

        assert_eq!(msg.sender, "admin");
        assert_eq!(msg.command(), MeterCommand::On);
        assert!(msg.timestamp.is_some());
    }

    #[test]
    fn deserializes_legacy_field_names() {
        let msg: CommandMessage = serde_json::from_str(
            r#"{"Username": "Admin", "Status": "Active", "Command": "generate bill", "TimeStamp": "2024-11-03T15:23:46.1234567+01:00"}"#,
        )
        .unwrap();

        assert_eq!(msg.sender, "Admin");
        assert_eq!(msg.command(), MeterCommand::GenerateBill);
    }

    #[test]
    fn command_message_requires_sender() {
        let result = serde_json::from_str::<CommandMessage>(r#"{"command": "on"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn threshold_accepts_text_and_number() {
        let text: ThresholdInput = serde_json::from_str(r#"{"sender": "admin", "value": " 12.5 "}"#).unwrap();
        let number: ThresholdInput = serde_json::from_str(r#"{"sender": "admin", "value": 12.5}"#).unwrap();

        assert_eq!(text.threshold(), Ok(KiloWattHours(12.5)));
        assert_eq!(number.threshold(), Ok(KiloWattHours(12.5)));
    }

    #[test]
    fn threshold_accepts_zero() {
        let input: ThresholdInput = serde_json::from_str(r#"{"sender": "admin", "value": "0"}"#).unwrap();
        assert_eq!(input.threshold(), Ok(KiloWattHours(0.0)));
    }

    #[test]
    fn threshold_rejects_non_numeric_negative_and_non_finite() {
        for raw in [r#""abc""#, r#""-5""#, r#""NaN""#, r#""inf""#, r#""""#, "true", "null"] {
            let input: ThresholdInput =
                serde_json::from_str(&format!(r#"{{"sender": "admin", "value": {raw}}}"#)).unwrap();

            assert!(
                matches!(input.threshold(), Err(MeterError::InvalidThreshold { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_threshold_error_names_input() {
        let input: ThresholdInput = serde_json::from_str(r#"{"sender": "admin", "Command": "lots"}"#).unwrap();

        assert_eq!(
            input.threshold().unwrap_err().to_string(),
            "Invalid threshold input: lots"
        );
    }
}
