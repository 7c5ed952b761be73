//! Async consumer client.
//!
//! Runs a [`Consumer`] on a tokio task. Interests leave on a channel, Data
//! enters on a channel, and engine timers are driven by
//! [`tokio::time::sleep_until`].

use std::future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::consumer::{Consumer, ConsumerConfig, ConsumerStats};
use crate::core::{ConfigError, DelayEvent, DelaySink, Face, Timer};
use crate::event::EventQueue;
use crate::packet::{Data, Interest};

/// Errors that can occur in the consumer client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The consumer task has stopped.
    #[error("consumer task has stopped")]
    Closed,

    /// The consumer task panicked or was cancelled.
    #[error("consumer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Face writing Interests to a channel.
#[derive(Debug, Clone)]
pub struct ChannelFace {
    tx: mpsc::UnboundedSender<Interest>,
}

impl Face for ChannelFace {
    fn send_interest(&mut self, interest: Interest) {
        if self.tx.send(interest).is_err() {
            tracing::trace!("interest receiver dropped");
        }
    }
}

impl DelaySink for mpsc::UnboundedSender<DelayEvent> {
    fn record(&mut self, event: DelayEvent) {
        let _ = self.send(event);
    }
}

/// Receiving end of the Interests sent by the consumer.
pub struct InterestReceiver {
    rx: mpsc::UnboundedReceiver<Interest>,
}

impl InterestReceiver {
    /// Receive the next Interest.
    ///
    /// Returns `None` once the consumer task has stopped.
    pub async fn recv(&mut self) -> Option<Interest> {
        self.rx.recv().await
    }
}

/// Handle for delivering replies to the consumer.
#[derive(Debug, Clone)]
pub struct DataSender {
    tx: mpsc::UnboundedSender<Data>,
}

impl DataSender {
    /// Deliver a reply.
    pub fn send(&self, data: Data) -> Result<(), ClientError> {
        self.tx.send(data).map_err(|_| ClientError::Closed)
    }
}

enum Command {
    SetRetxTimer(Duration, oneshot::Sender<Result<(), ConfigError>>),
    Stats(oneshot::Sender<ConsumerStats>),
}

/// A consumer running on its own task.
///
/// # Example
///
/// ```ignore
/// let config = ConsumerBuilder::new().prefix("/video".parse()?).build()?;
/// let (client, mut interests) = ConsumerClient::spawn(config, TracingSink)?;
///
/// while let Some(interest) = interests.recv().await {
///     let data = fetch(interest).await;
///     client.deliver(data)?;
/// }
/// ```
pub struct ConsumerClient {
    data_tx: mpsc::UnboundedSender<Data>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<ConsumerStats>>,
}

impl ConsumerClient {
    /// Start a consumer on a new task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(
        config: ConsumerConfig,
        sink: S,
    ) -> Result<(Self, InterestReceiver), ClientError>
    where
        S: DelaySink + Send + 'static,
    {
        let (interest_tx, interest_rx) = mpsc::unbounded_channel();
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let consumer = Consumer::new(config, ChannelFace { tx: interest_tx }, sink)?;
        let task = tokio::spawn(run(consumer, data_rx, command_rx, shutdown_rx));

        let client = Self {
            data_tx,
            commands: command_tx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        };
        Ok((client, InterestReceiver { rx: interest_rx }))
    }

    /// Deliver a reply.
    pub fn deliver(&self, data: Data) -> Result<(), ClientError> {
        self.data_tx.send(data).map_err(|_| ClientError::Closed)
    }

    /// Get a cloneable handle for delivering replies.
    pub fn data_sender(&self) -> DataSender {
        DataSender {
            tx: self.data_tx.clone(),
        }
    }

    /// Change the retransmission sweep period.
    pub async fn set_retx_timer(&self, period: Duration) -> Result<(), ClientError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::SetRetxTimer(period, tx))
            .map_err(|_| ClientError::Closed)?;
        rx.await.map_err(|_| ClientError::Closed)??;
        Ok(())
    }

    /// Current counters.
    pub async fn stats(&self) -> Result<ConsumerStats, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Stats(tx))
            .map_err(|_| ClientError::Closed)?;
        rx.await.map_err(|_| ClientError::Closed)
    }

    /// Stop the consumer and wait for its task, returning the final counters.
    pub async fn shutdown(mut self) -> Result<ConsumerStats, ClientError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        match self.task.take() {
            Some(task) => Ok(task.await?),
            None => Err(ClientError::Closed),
        }
    }
}

impl Drop for ConsumerClient {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn run<S: DelaySink>(
    mut consumer: Consumer<ChannelFace, S>,
    mut data_rx: mpsc::UnboundedReceiver<Data>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> ConsumerStats {
    let mut queue: EventQueue<Timer> = EventQueue::new(Instant::now().into_std());
    consumer.start(&mut queue);

    loop {
        let wake = queue.next_deadline().map(Instant::from_std);

        tokio::select! {
            biased;

            _ = &mut shutdown_rx => break,

            Some(data) = data_rx.recv() => {
                queue.advance_to(Instant::now().into_std());
                consumer.on_data(&data, &mut queue);
            }

            command = commands.recv() => match command {
                Some(Command::SetRetxTimer(period, reply)) => {
                    queue.advance_to(Instant::now().into_std());
                    let _ = reply.send(consumer.set_retx_timer(period, &mut queue));
                }
                Some(Command::Stats(reply)) => {
                    let _ = reply.send(consumer.stats());
                }
                None => break,
            },

            _ = sleep_until(wake) => {
                let now = Instant::now().into_std();
                while let Some((handle, timer)) = queue.pop_due(now) {
                    consumer.on_timer(handle, timer, &mut queue);
                }
            }
        }
    }

    consumer.stop(&mut queue);
    tracing::debug!(stats = ?consumer.stats(), "consumer task finished");
    consumer.stats()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
