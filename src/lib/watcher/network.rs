use std::time::Duration;

use sysinfo::{NetworkExt, NetworksExt, System, SystemExt};

use crate::telemetry::{MetricKind, Sample};

use super::Sampler;

/// Download and upload rates summed over all interfaces, in KB/s. sysinfo
/// reports the byte counters accumulated since the previous refresh, which
/// happens exactly once per tick here.
pub struct NetworkSampler {
    system: System,
    interval_secs: u64,
}

impl NetworkSampler {
    pub fn new(interval: Duration) -> Self {
        let mut system = System::new();
        system.refresh_networks_list();
        Self {
            system,
            interval_secs: interval.as_secs().max(1),
        }
    }
}

impl Sampler for NetworkSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Network
    }

    fn sample(&mut self) -> Option<Sample> {
        self.system.refresh_networks();

        let mut received = 0u64;
        let mut transmitted = 0u64;
        for (_name, data) in self.system.networks().iter() {
            received += data.received();
            transmitted += data.transmitted();
        }

        Some(Sample::Network {
            download_kbs: received / self.interval_secs / 1000,
            upload_kbs: transmitted / self.interval_secs / 1000,
        })
    }
}
