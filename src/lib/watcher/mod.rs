pub mod cpu;
pub mod gpu;
pub mod memory;
pub mod network;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::telemetry::{MetricKind, Sample};

/// One metric producer. Implementations read the host once per call and are
/// free to return `None` on ticks where no measurement is available.
pub trait Sampler: Send + 'static {
    fn kind(&self) -> MetricKind;

    fn sample(&mut self) -> Option<Sample>;
}

/// Drive a sampler at a fixed cadence, labeling its measurements into the
/// shared sample channel until the token is cancelled or the consumer goes
/// away. The first tick fires one interval after start, not immediately.
pub fn spawn<S: Sampler>(
    mut sampler: S,
    interval: Duration,
    sender: mpsc::Sender<Sample>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let kind = sampler.kind();
        info!("{kind} watcher started");

        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(sample) = sampler.sample() else {
                        continue;
                    };
                    if sender.send(sample).await.is_err() {
                        // Consumer is gone, nobody wants samples anymore
                        break;
                    }
                }
            }
        }

        info!("{kind} watcher stopped");
    })
}

/// Start the watcher matching a metric category.
pub fn spawn_kind(
    kind: MetricKind,
    interval: Duration,
    sender: mpsc::Sender<Sample>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    match kind {
        MetricKind::Cpu => spawn(cpu::CpuSampler::new(), interval, sender, cancel),
        MetricKind::Memory => spawn(memory::MemorySampler::new(), interval, sender, cancel),
        MetricKind::Gpu => spawn(gpu::GpuSampler::new(), interval, sender, cancel),
        MetricKind::Network => {
            spawn(network::NetworkSampler::new(interval), interval, sender, cancel)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSampler {
        produced: u64,
    }

    impl Sampler for CountingSampler {
        fn kind(&self) -> MetricKind {
            MetricKind::Network
        }

        fn sample(&mut self) -> Option<Sample> {
            self.produced += 1;
            Some(Sample::Network {
                download_kbs: self.produced,
                upload_kbs: 0,
            })
        }
    }

    #[tokio::test]
    async fn produces_in_order_and_stops_within_a_tick() {
        let (sender, mut receiver) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = spawn(
            CountingSampler { produced: 0 },
            Duration::from_millis(5),
            sender,
            cancel.clone(),
        );

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(
            (first, second),
            (
                Sample::Network {
                    download_kbs: 1,
                    upload_kbs: 0,
                },
                Sample::Network {
                    download_kbs: 2,
                    upload_kbs: 0,
                }
            )
        );

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stops_when_the_consumer_is_dropped() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let handle = spawn(
            CountingSampler { produced: 0 },
            Duration::from_millis(5),
            sender,
            CancellationToken::new(),
        );
        handle.await.unwrap();
    }
}
