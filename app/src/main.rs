use infrastructure::Mqtt;
use settings::Settings;
use tokio_util::sync::CancellationToken;

use crate::meter::MeterRunner;

mod core;
mod meter;
mod notification;
mod settings;

struct Infrastructure {
    mqtt_client: Mqtt,
}

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    let mut infrastructure = Infrastructure::init(&settings)
        .await
        .expect("Error initializing infrastructure");

    let notifier = settings
        .notification
        .new_notifier()
        .expect("Error initializing notification channel");

    let subscription = infrastructure
        .mqtt_client
        .subscribe(settings.meter.topics.subscription.clone())
        .await
        .expect("Error subscribing to meter topics");

    let shutdown = CancellationToken::new();

    let meter_runner = MeterRunner::new(
        &settings.meter,
        subscription,
        infrastructure.mqtt_client.new_publisher(),
        notifier,
        shutdown.clone(),
    );

    tracing::info!(
        "Smart meter {} connected as {}, waiting for commands on {}",
        settings.meter.device_id,
        settings.meter.identity,
        settings.meter.topics.commands
    );

    let process_infrastructure = infrastructure.process();

    tokio::select!(
        _ = process_infrastructure => {},
        _ = meter_runner.run() => {},
        _ = shutdown_signal(shutdown) => {},
    );
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Error listening for shutdown signal: {}", e);
        return std::future::pending().await;
    }

    tracing::info!("Shutdown requested");
    shutdown.cancel();

    //let the runner finish the message or tick in flight
    std::future::pending::<()>().await
}

impl Infrastructure {
    pub async fn init(settings: &Settings) -> anyhow::Result<Self> {
        settings
            .monitoring
            .init()
            .map_err(|e| anyhow::anyhow!("Error initializing monitoring: {}", e))?;

        let mqtt_client = settings.mqtt.new_client();

        Ok(Self { mqtt_client })
    }

    async fn process(self) {
        tokio::select!(
            _ = self.mqtt_client.process() => {},
        )
    }
}
