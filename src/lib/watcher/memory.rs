use sysinfo::{System, SystemExt};

use crate::telemetry::{MetricKind, Sample};

use super::Sampler;

pub struct MemorySampler {
    system: System,
}

impl MemorySampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for MemorySampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Memory
    }

    fn sample(&mut self) -> Option<Sample> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        if total == 0 {
            return None;
        }
        let used = self.system.used_memory();

        Some(Sample::Memory {
            load: used as f64 / total as f64 * 100.0,
            used_mb: used / 1_000_000,
        })
    }
}
