use config::{Config, ConfigError, Environment, File};
use infrastructure::{MonitoringConfig, MqttConfig};
use serde::Deserialize;

use crate::{meter::MeterSettings, notification::NotificationSettings};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub mqtt: MqttConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub meter: MeterSettings,
    #[serde(default)]
    pub notification: NotificationSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(File::with_name("config.toml"), environment())
    }

    fn load(file: impl config::Source + Send + Sync + 'static, env: Environment) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(file).add_source(env);

        let s = builder.build()?;
        s.try_deserialize()
    }
}

//SMART_METER_METER__DEVICE_ID=SM-002 overrides meter.device_id
fn environment() -> Environment {
    Environment::with_prefix("SMART_METER")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("notification.email.to")
        .try_parsing(true)
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::notification::SmtpSecurity;
    use config::FileFormat;
    use std::path::PathBuf;

    #[test]
    fn bundled_config_is_valid() {
        let path = find_file_upwards("config.toml").expect("config.toml not found");

        let settings = Settings::load(File::from(path), env(&[])).unwrap();

        assert_eq!(settings.meter.topics.subscription, "smartmeter/#");
        assert_eq!(settings.meter.publish_interval_secs, 4);
        assert!(settings.notification.email.is_none());
    }

    #[test]
    fn meter_section_is_optional() {
        let toml = r#"
            [mqtt]
            host = "localhost"
            port = 1883
            client_id = "smart-meter-test"

            [monitoring]
            service_name = "smart-meter"
            app_name = "smart-meter"
            logs = { default_level = "info" }
        "#;

        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.meter.device_id, "SM-001");
        assert_eq!(settings.meter.tariff_rate, 5.25);
        assert!(settings.monitoring.otlp.is_none());
    }

    #[test]
    fn reads_flat_tariff_and_email_security() {
        let toml = format!(
            "{}{}",
            MINIMAL,
            r#"
            [meter]
            tariff_rate = 6.0
            currency_symbol = "$"

            [notification.email]
            smtp_server = "smtp.example.com"
            security = "starttls"
            from = "meter@example.com"
            to = ["owner@example.com"]
        "#
        );

        let settings = Settings::load(File::from_str(&toml, FileFormat::Toml), env(&[])).unwrap();

        assert_eq!(settings.meter.tariff().rate, 6.0);
        assert_eq!(settings.meter.tariff().currency_symbol, "$");
        assert_eq!(settings.meter.device_id, "SM-001");

        let email = settings.notification.email.expect("email section missing");
        assert_eq!(email.security, SmtpSecurity::StartTls);
        assert_eq!(email.to, vec!["owner@example.com".to_string()]);
    }

    #[test]
    fn environment_overrides_file_values() {
        let settings = Settings::load(
            File::from_str(MINIMAL, FileFormat::Toml),
            env(&[
                ("SMART_METER_METER__DEVICE_ID", "SM-002"),
                ("SMART_METER_METER__TARIFF_RATE", "7.5"),
                ("SMART_METER_MONITORING__APP_NAME", "meter-two"),
                ("SMART_METER_NOTIFICATION__EMAIL__SMTP_SERVER", "smtp.example.com"),
                ("SMART_METER_NOTIFICATION__EMAIL__FROM", "meter@example.com"),
                ("SMART_METER_NOTIFICATION__EMAIL__TO", "a@example.com,b@example.com"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.meter.device_id, "SM-002");
        assert_eq!(settings.meter.tariff_rate, 7.5);
        assert_eq!(settings.monitoring.app_name, "meter-two");

        let email = settings.notification.email.expect("email section missing");
        assert_eq!(email.to, vec!["a@example.com".to_string(), "b@example.com".to_string()]);
    }

    const MINIMAL: &str = r#"
        [mqtt]
        host = "localhost"
        port = 1883
        client_id = "smart-meter-test"

        [monitoring]
        service_name = "smart-meter"
        app_name = "smart-meter"
        logs = { default_level = "info" }
    "#;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<config::Map<String, String>>();

        environment().source(Some(vars))
    }

    fn find_file_upwards(file_name: &str) -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;

        for dir in current_dir.ancestors() {
            let file_path = dir.join(file_name);
            if file_path.exists() {
                return Some(file_path);
            }
        }

        None
    }
}
