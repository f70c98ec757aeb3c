//! RabbitMQ plumbing shared by every worker: durable declares, persistent
//! publishes, and a prefetch-1 consume loop with reconnect.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Connection, ConnectionProperties};
use tracing::{error, info, warn};

use esglens_common::config::BrokerConfig;
use esglens_common::EsgError;

pub use lapin::Channel;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const PERSISTENT_DELIVERY: u8 = 2;

/// What to do with a consumed message after the handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    /// Nack without requeue; the broker's dead-letter policy takes it.
    DeadLetter,
}

pub struct Broker {
    connection: Connection,
}

impl Broker {
    pub async fn connect(config: &BrokerConfig) -> Result<Self, EsgError> {
        let connection = Connection::connect(&config.amqp_uri(), ConnectionProperties::default())
            .await
            .map_err(|e| EsgError::Broker(format!("connect failed: {e}")))?;
        Ok(Self { connection })
    }

    pub async fn channel(&self) -> Result<Channel, EsgError> {
        self.connection
            .create_channel()
            .await
            .map_err(|e| EsgError::Broker(format!("channel failed: {e}")))
    }
}

/// Declare a durable classic queue. Idempotent.
pub async fn declare_durable(channel: &Channel, queue: &str) -> Result<(), EsgError> {
    channel
        .queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| EsgError::Broker(format!("declare {queue} failed: {e}")))?;
    Ok(())
}

/// Publish with persistent delivery to the default exchange.
pub async fn publish_persistent(
    channel: &Channel,
    queue: &str,
    payload: &[u8],
) -> Result<(), EsgError> {
    channel
        .basic_publish(
            "",
            queue,
            BasicPublishOptions::default(),
            payload,
            BasicProperties::default().with_delivery_mode(PERSISTENT_DELIVERY),
        )
        .await
        .map_err(|e| EsgError::Broker(format!("publish to {queue} failed: {e}")))?
        .await
        .map_err(|e| EsgError::Broker(format!("publish confirm on {queue} failed: {e}")))?;
    Ok(())
}

/// Long-lived consumer loop: one channel, prefetch 1, reconnect on broker
/// loss. The handler decides the disposition of each message; the loop never
/// exits on handler outcomes, only on connection failure (then reconnects).
pub async fn consume<F, Fut>(config: &BrokerConfig, queue: &str, handler: F) -> anyhow::Result<()>
where
    F: Fn(Vec<u8>) -> Fut,
    Fut: Future<Output = Disposition>,
{
    loop {
        match consume_once(config, queue, &handler).await {
            Ok(()) => warn!(queue, "Consumer stream ended; reconnecting"),
            Err(e) => error!(queue, error = %e, "Broker connection lost; reconnecting"),
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

async fn consume_once<F, Fut>(
    config: &BrokerConfig,
    queue: &str,
    handler: &F,
) -> Result<(), EsgError>
where
    F: Fn(Vec<u8>) -> Fut,
    Fut: Future<Output = Disposition>,
{
    let broker = Broker::connect(config).await?;
    let channel = broker.channel().await?;

    channel
        .basic_qos(1, BasicQosOptions::default())
        .await
        .map_err(|e| EsgError::Broker(format!("qos failed: {e}")))?;

    declare_durable(&channel, queue).await?;

    let consumer_tag = format!("{}-{}", queue, std::process::id());
    let mut consumer = channel
        .basic_consume(
            queue,
            &consumer_tag,
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| EsgError::Broker(format!("consume on {queue} failed: {e}")))?;

    info!(queue, "Waiting for messages");

    while let Some(delivery) = consumer.next().await {
        let delivery = delivery.map_err(|e| EsgError::Broker(format!("delivery error: {e}")))?;
        let disposition = handler(delivery.data.clone()).await;
        match disposition {
            Disposition::Ack => delivery
                .ack(BasicAckOptions::default())
                .await
                .map_err(|e| EsgError::Broker(format!("ack failed: {e}")))?,
            Disposition::DeadLetter => delivery
                .nack(BasicNackOptions {
                    requeue: false,
                    ..Default::default()
                })
                .await
                .map_err(|e| EsgError::Broker(format!("nack failed: {e}")))?,
        }
    }

    Ok(())
}
