use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::*;
use uuid::Uuid;

use crate::{
    settings::manager::{StatsSettings, TelemetrySettings},
    transport::Transport,
    watcher,
};

use super::{
    alert::{AlertTracker, AlertTransition},
    frame::Frame,
    MetricKind, Sample,
};

/// All frames funnel through this lock, so writes to the display never
/// interleave.
type SharedTransport = Arc<Mutex<Box<dyn Transport>>>;

const SAMPLE_QUEUE_DEPTH: usize = 32;

/// One complete monitoring incarnation: the transport, the fan-in loop and
/// its samplers, and the alert state, all replaced together on restart. At
/// most one pipeline is live at any time.
pub struct Pipeline {
    id: Uuid,
    transport: SharedTransport,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl Pipeline {
    pub fn start(
        settings: TelemetrySettings,
        transport: Box<dyn Transport>,
        parent: &CancellationToken,
    ) -> Self {
        let id = Uuid::new_v4();
        let cancel = parent.child_token();
        let transport: SharedTransport = Arc::new(Mutex::new(transport));

        debug!("Starting monitoring pipeline {id}");
        let handle = tokio::spawn({
            let transport = transport.clone();
            let cancel = cancel.clone();
            async move {
                run(settings, transport, cancel).await;
                debug!("Monitoring pipeline {id} ended");
            }
        });

        Self {
            id,
            transport,
            cancel,
            handle,
        }
    }

    /// Adjust the display brightness, serialized with the monitoring loop's
    /// own writes through the shared transport lock.
    pub async fn set_brightness(&self, level: u8) {
        write_frame(&self.transport, Frame::Brightness(level)).await;
    }

    /// Stop the monitoring loop and every sampler it owns, then release the
    /// transport. Returns only once nothing of the incarnation remains.
    pub async fn shutdown(self) {
        debug!("Stopping monitoring pipeline {}", self.id);
        self.cancel.cancel();
        if let Err(error) = self.handle.await {
            warn!("Monitoring pipeline {} failed to join: {error:?}", self.id);
        }
    }
}

/// Fan in samples from every enabled watcher and stream them to the display
/// until cancelled. Alert state starts from zero on every invocation.
async fn run(settings: TelemetrySettings, transport: SharedTransport, cancel: CancellationToken) {
    // Bring the display back to its daytime brightness
    write_frame(
        &transport,
        Frame::Brightness(settings.sleep.normal_brightness),
    )
    .await;

    let interval = Duration::from_secs(settings.stats.interval.max(1));
    let (sample_sender, mut sample_receiver) = mpsc::channel(SAMPLE_QUEUE_DEPTH);
    let mut samplers = Vec::new();
    let mut trackers: HashMap<MetricKind, AlertTracker> = HashMap::new();

    for kind in MetricKind::ALL {
        if settings.stats.enabled(kind) {
            trackers.insert(kind, AlertTracker::new(kind));
            samplers.push(watcher::spawn_kind(
                kind,
                interval,
                sample_sender.clone(),
                cancel.child_token(),
            ));
        } else {
            // Blank the stale row and clear any alert left on the display
            // from a previous configuration
            write_frame(&transport, Frame::Reset(kind)).await;
            write_frame(
                &transport,
                Frame::Alert {
                    kind,
                    active: false,
                },
            )
            .await;
        }
    }
    drop(sample_sender);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            sample = sample_receiver.recv() => match sample {
                Some(sample) => {
                    handle_sample(&settings.stats, &transport, &mut trackers, sample).await
                }
                // No producer is running; park until cancelled
                None => {
                    cancel.cancelled().await;
                    break;
                }
            }
        }
    }

    // Wait for every sampler to observe the cancellation, so nothing can
    // reach the transport once we return
    for sampler in samplers {
        if let Err(error) = sampler.await {
            warn!("Sampler task failed to join: {error:?}");
        }
    }
}

async fn handle_sample(
    stats: &StatsSettings,
    transport: &SharedTransport,
    trackers: &mut HashMap<MetricKind, AlertTracker>,
    sample: Sample,
) {
    let kind = sample.kind();
    let frame = Frame::Sample(sample);
    debug!("{kind}: {frame}");
    write_frame(transport, frame).await;

    let Some(tracker) = trackers.get_mut(&kind) else {
        return;
    };
    if let Some(transition) = tracker.update(&sub_readings(stats, &sample)) {
        write_frame(
            transport,
            Frame::Alert {
                kind,
                active: transition == AlertTransition::On,
            },
        )
        .await;
    }
}

/// Pair each of the sample's fields with its configured alert limit, in
/// sub-threshold order.
fn sub_readings(stats: &StatsSettings, sample: &Sample) -> Vec<(u64, u64)> {
    match sample {
        Sample::Cpu { load, temp } => vec![
            (stats.cpu.load, *load as u64),
            (stats.cpu.temp, *temp as u64),
        ],
        Sample::Memory { load, .. } => vec![(stats.memory.load, *load as u64)],
        Sample::Gpu { load, used_mb } => {
            vec![(stats.gpu.load, *load as u64), (stats.gpu.mem, *used_mb)]
        }
        Sample::Network {
            download_kbs,
            upload_kbs,
        } => vec![
            (stats.network.download, *download_kbs),
            (stats.network.upload, *upload_kbs),
        ],
    }
}

/// A failed write is logged and otherwise ignored: telemetry is best effort
/// and a single lost frame must not bring the monitoring down.
async fn write_frame(transport: &SharedTransport, frame: Frame) {
    if let Err(error) = transport.lock().await.write_frame(&frame.encode()) {
        error!("Failed to write {frame} to display: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        settings::manager::{
            CpuStatsSettings, GpuStatsSettings, MemoryStatsSettings, NetworkStatsSettings,
            SerialSettings, SleepSettings,
        },
        transport::fake::FakeTransport,
    };

    fn test_settings() -> TelemetrySettings {
        TelemetrySettings {
            serial: SerialSettings {
                port: "".to_string(),
                baud: 9600,
            },
            stats: StatsSettings {
                interval: 1,
                cpu: CpuStatsSettings {
                    enabled: false,
                    load: 0,
                    temp: 0,
                },
                memory: MemoryStatsSettings {
                    enabled: false,
                    load: 0,
                },
                gpu: GpuStatsSettings {
                    enabled: false,
                    load: 0,
                    mem: 0,
                },
                network: NetworkStatsSettings {
                    enabled: false,
                    download: 0,
                    upload: 0,
                },
            },
            sleep: SleepSettings {
                start: "00:00".to_string(),
                end: "00:00".to_string(),
                normal_brightness: 80,
                sleep_brightness: 10,
            },
        }
    }

    fn shared(fake: FakeTransport) -> SharedTransport {
        Arc::new(Mutex::new(Box::new(fake)))
    }

    #[tokio::test]
    async fn disabled_metrics_reset_once_then_loop_waits() {
        let fake = FakeTransport::new();
        let writes = fake.writes();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(test_settings(), shared(fake), cancel.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            *writes.lock().unwrap(),
            vec![
                "y|80$", "1|-|-$", "z|1|0$", "2|-|-$", "z|2|0$", "3|-|-$", "z|3|0$", "4|-|-$",
                "z|4|0$",
            ]
        );

        cancel.cancel();
        handle.await.unwrap();

        // Nothing may be written after the cancellation was observed
        assert_eq!(writes.lock().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn sample_frames_and_alert_lifecycle() {
        let fake = FakeTransport::new();
        let writes = fake.writes();
        let transport = shared(fake);

        let mut settings = test_settings();
        settings.stats.cpu = CpuStatsSettings {
            enabled: true,
            load: 50,
            temp: 0,
        };
        let mut trackers =
            HashMap::from([(MetricKind::Cpu, AlertTracker::new(MetricKind::Cpu))]);

        for load in [70.0, 80.2, 10.0] {
            handle_sample(
                &settings.stats,
                &transport,
                &mut trackers,
                Sample::Cpu { load, temp: 40.0 },
            )
            .await;
        }

        assert_eq!(
            *writes.lock().unwrap(),
            vec!["1|70|40$", "z|1|1$", "1|80|40$", "1|10|40$", "z|1|0$"]
        );
    }

    #[tokio::test]
    async fn write_failures_do_not_stop_the_loop() {
        let transport = shared(FakeTransport::failing());

        let mut settings = test_settings();
        settings.stats.memory = MemoryStatsSettings {
            enabled: true,
            load: 50,
        };
        let mut trackers =
            HashMap::from([(MetricKind::Memory, AlertTracker::new(MetricKind::Memory))]);

        // Both the sample frame and the alert frame fail to write; the loop
        // carries on and keeps processing further samples
        for load in [90.0, 95.0] {
            handle_sample(
                &settings.stats,
                &transport,
                &mut trackers,
                Sample::Memory {
                    load,
                    used_mb: 15000,
                },
            )
            .await;
        }
    }

    #[tokio::test]
    async fn pipeline_shutdown_is_clean() {
        let fake = FakeTransport::new();
        let writes = fake.writes();
        let cancel = CancellationToken::new();

        let pipeline = Pipeline::start(test_settings(), Box::new(fake), &cancel);
        tokio::time::sleep(Duration::from_millis(50)).await;
        pipeline.set_brightness(10).await;
        pipeline.shutdown().await;

        let written = writes.lock().unwrap().clone();
        assert_eq!(written.last().unwrap(), "y|10$");
    }

    #[tokio::test]
    async fn cancelling_the_parent_token_stops_the_pipeline() {
        let fake = FakeTransport::new();
        let cancel = CancellationToken::new();

        let pipeline = Pipeline::start(test_settings(), Box::new(fake), &cancel);
        cancel.cancel();
        // The child token observes the parent's cancellation, so joining
        // completes without an explicit shutdown call
        pipeline.handle.await.unwrap();
    }
}
