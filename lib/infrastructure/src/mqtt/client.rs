use std::time::Duration;

use rumqttc::v5::{
    AsyncClient, EventLoop, MqttOptions,
    mqttbytes::{
        QoS,
        v5::{ConnectProperties, Packet, SubscribeProperties},
    },
};

use rumqttc::v5::Event::Incoming;
use tokio::{
    sync::mpsc::{self, Receiver, Sender},
    task::JoinSet,
};

use super::*;

pub struct Mqtt {
    client: AsyncClient,
    event_loop: EventLoop,
    subscriptions: Vec<Sender<MqttInMessage>>,
    publisher_tx: Sender<MqttOutMessage>,
    publisher_rx: Receiver<MqttOutMessage>,
}

impl Mqtt {
    pub fn connect(
        host: &str,
        port: u16,
        client_id: &str,
        credentials: Option<(&str, &str)>,
        keep_alive_secs: u64,
    ) -> Self {
        let mut mqttoptions = MqttOptions::new(client_id, host, port);
        mqttoptions.set_keep_alive(Duration::from_secs(keep_alive_secs));
        mqttoptions.set_clean_start(true);

        if let Some((username, password)) = credentials {
            mqttoptions.set_credentials(username, password);
        }

        let mut connect_props = ConnectProperties::new();
        connect_props.max_packet_size = Some(1024 * 1024);
        mqttoptions.set_connect_properties(connect_props);

        let (client, event_loop) = AsyncClient::new(mqttoptions, 10);
        let (pub_tx, pub_rx) = mpsc::channel::<MqttOutMessage>(32);

        Mqtt {
            client,
            event_loop,
            subscriptions: vec![],
            publisher_rx: pub_rx,
            publisher_tx: pub_tx,
        }
    }

    pub async fn subscribe(&mut self, topic: impl Into<String>) -> anyhow::Result<MqttSubscription> {
        self.subscribe_all(&[topic.into()]).await
    }

    pub async fn subscribe_all(&mut self, topics: &[String]) -> anyhow::Result<MqttSubscription> {
        let (tx, rx) = mpsc::channel::<MqttInMessage>(32);

        for topic in topics {
            tracing::info!("Subscribing to topic: {:?}", &topic);

            self.subscriptions.push(tx.clone());

            self.client
                .subscribe_with_properties(
                    topic,
                    QoS::AtLeastOnce,
                    SubscribeProperties {
                        id: Some(self.subscriptions.len()), //must be > 0
                        user_properties: vec![],
                    },
                )
                .await?;
        }

        Ok(MqttSubscription::new(rx))
    }

    pub fn new_publisher(&self) -> Sender<MqttOutMessage> {
        self.publisher_tx.clone()
    }

    //Runs for the lifetime of the process; the event loop reconnects on its own
    pub async fn process(self) {
        let mut tasks = JoinSet::new();

        let client = self.client;
        let mut event_loop = self.event_loop;
        let subscriptions = self.subscriptions;
        let mut publisher_rx = self.publisher_rx;

        tasks.spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Incoming(Packet::Publish(msg))) => {
                        let mqtt_in_message: MqttInMessage = match (&msg).try_into() {
                            Ok(m) => m,
                            Err(e) => {
                                tracing::error!("Error parsing MQTT message: {}", e);
                                continue;
                            }
                        };

                        let subscription_ids = match msg.properties {
                            Some(p) => p.subscription_identifiers,
                            None => {
                                tracing::error!("No subscription identifiers in MQTT message");
                                continue;
                            }
                        };

                        for id in subscription_ids {
                            match subscriptions.get(id.wrapping_sub(1)) {
                                Some(tx) => {
                                    if let Err(e) = tx
                                        .send_timeout(mqtt_in_message.clone(), Duration::from_secs(5))
                                        .await
                                    {
                                        tracing::error!("Failed to forward MQTT message to subscriber: {}", e);
                                    }
                                }
                                None => {
                                    tracing::error!("No subscription for id: {}", id);
                                }
                            }
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("MQTT error: {}", e);
                        //avoid a hot loop while the broker is unreachable
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        tasks.spawn(async move {
            while let Some(msg) = publisher_rx.recv().await {
                tracing::debug!("Publishing MQTT message to {}: {:?}", msg.topic, msg.payload);

                if let Err(e) = client
                    .publish(msg.topic.clone(), QoS::AtLeastOnce, msg.retain, msg.payload)
                    .await
                {
                    tracing::error!("Error publishing MQTT message to {}: {}", msg.topic, e);
                }
            }
        });

        while let Some(task) = tasks.join_next().await {
            if let Err(e) = task {
                tracing::error!("MQTT processing task failed: {}", e);
            }
        }
    }
}
