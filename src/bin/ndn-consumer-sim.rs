//! Simulated consumer run
//!
//! Drives a consumer against a lossy loopback link on a virtual clock and
//! prints the final counters and RTO state.
//!
//! Environment variables:
//! - NDN_CONSUMER_PREFIX: name prefix (default /)
//! - NDN_CONSUMER_MAX_SEQUENCE: exclusive bound on sequence numbers (default 100)
//! - NDN_CONSUMER_FREQUENCY: Interests per second (default 1)
//! - NDN_CONSUMER_RANDOMIZE: none|uniform|exponential
//! - NDN_CONSUMER_RETX_TIMER_MS: sweep period (default 50)
//! - NDN_CONSUMER_MAX_RETRANSMISSIONS: retries after the first send (default 2)
//! - NDN_CONSUMER_RTT_MS: link round trip time (default 50)
//! - NDN_CONSUMER_LOSS: link loss probability (default 0)
//! - NDN_CONSUMER_SEED: random seed (default 0)
//! - NDN_CONSUMER_DURATION_MS: simulated time limit (default 600000)
//! - NDN_CONSUMER_LOG_LEVEL: trace|debug|info|warn|error, when RUST_LOG is unset

use std::env;
use std::str::FromStr;
use std::time::Duration;

use ndn_consumer::core::TracingSink;
use ndn_consumer::sim::{Link, Simulation};
use ndn_consumer::transport::Randomize;
use ndn_consumer::{ConsumerBuilder, ConsumerError, Name};
use tracing_subscriber::EnvFilter;

fn var<T>(key: &str, default: T) -> Result<T, ConsumerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value.parse().map_err(|err: T::Err| ConsumerError::InvalidSetting {
            key: key.to_string(),
            reason: err.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<(), ConsumerError> {
    let level = env::var("NDN_CONSUMER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    let prefix = match env::var("NDN_CONSUMER_PREFIX") {
        Ok(uri) => uri.parse::<Name>()?,
        Err(_) => Name::new(),
    };
    let config = ConsumerBuilder::new()
        .prefix(prefix)
        .max_sequence(var("NDN_CONSUMER_MAX_SEQUENCE", 100u32)?)
        .frequency(var("NDN_CONSUMER_FREQUENCY", 1.0f64)?)
        .randomize(var("NDN_CONSUMER_RANDOMIZE", Randomize::None)?)
        .retx_timer(Duration::from_millis(var("NDN_CONSUMER_RETX_TIMER_MS", 50u64)?))
        .max_retransmissions(var("NDN_CONSUMER_MAX_RETRANSMISSIONS", 2u32)?)
        .seed(var("NDN_CONSUMER_SEED", 0u64)?)
        .build()?;

    let rtt = Duration::from_millis(var("NDN_CONSUMER_RTT_MS", 50u64)?);
    let loss: f64 = var("NDN_CONSUMER_LOSS", 0.0)?;
    let limit = Duration::from_millis(var("NDN_CONSUMER_DURATION_MS", 600_000u64)?);
    let seed = config.seed.unwrap_or_default();

    tracing::info!(prefix = %config.prefix, ?rtt, loss, "starting simulation");

    let link = Link::new(rtt).with_loss(loss, seed.wrapping_add(1));
    let mut sim = Simulation::new(config, link, TracingSink)?;
    sim.start();
    let finished = sim.run_to_completion(limit);

    let stats = sim.consumer().stats();
    let rto = sim.consumer().rto();
    tracing::info!(finished, elapsed = ?sim.elapsed(), "simulation done");

    println!("interests sent    {}", stats.interests_sent);
    println!("retransmissions   {}", stats.retransmissions);
    println!("timeouts          {}", stats.timeouts);
    println!("abandoned         {}", stats.abandoned);
    println!("data received     {}", stats.data_received);
    println!("unmatched data    {}", stats.unmatched_data);
    println!("srtt              {:?}", rto.srtt());
    println!("rttvar            {:?}", rto.rttvar());
    println!("rto               {:?}", rto.current_timeout());
    println!("elapsed           {:?}", sim.elapsed());

    Ok(())
}
