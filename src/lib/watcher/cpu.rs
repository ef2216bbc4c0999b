use sysinfo::{ComponentExt, CpuExt, System, SystemExt};

use crate::telemetry::{MetricKind, Sample};

use super::Sampler;

/// Aggregate CPU load and package temperature. Load is computed by sysinfo
/// from the delta between consecutive refreshes, so the first tick after
/// start reads low.
pub struct CpuSampler {
    system: System,
}

impl CpuSampler {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_components_list();
        Self { system }
    }
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for CpuSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Cpu
    }

    fn sample(&mut self) -> Option<Sample> {
        self.system.refresh_cpu();
        self.system.refresh_components();

        Some(Sample::Cpu {
            load: self.system.global_cpu_info().cpu_usage() as f64,
            temp: cpu_temperature(self.system.components()),
        })
    }
}

/// The package sensor when the platform exposes one, otherwise the hottest
/// core. 0.0 when no CPU temperature sensor exists at all.
fn cpu_temperature(components: &[sysinfo::Component]) -> f64 {
    if let Some(package) = components.iter().find(|component| {
        let label = component.label().to_ascii_lowercase();
        label.contains("package")
    }) {
        return package.temperature() as f64;
    }

    components
        .iter()
        .filter(|component| {
            let label = component.label().to_ascii_lowercase();
            label.contains("core") || label.contains("cpu")
        })
        .map(|component| component.temperature())
        .fold(0.0_f32, f32::max) as f64
}
