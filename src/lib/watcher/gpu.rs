use tracing::*;

use crate::telemetry::{MetricKind, Sample};

use super::Sampler;

/// GPU load and used memory of the first NVIDIA device, through NVML.
/// Without the `nvml` feature, or without a reachable driver, the sampler
/// produces no measurements and the GPU row on the display stays blank.
pub struct GpuSampler {
    #[cfg(feature = "nvml")]
    nvml: Option<nvml_wrapper::Nvml>,
}

impl GpuSampler {
    #[cfg(feature = "nvml")]
    pub fn new() -> Self {
        let nvml = match nvml_wrapper::Nvml::init() {
            Ok(nvml) => Some(nvml),
            Err(error) => {
                warn!("NVML unavailable, GPU stats will not be reported: {error}");
                None
            }
        };
        Self { nvml }
    }

    #[cfg(not(feature = "nvml"))]
    pub fn new() -> Self {
        warn!("Built without the nvml feature, GPU stats will not be reported");
        Self {}
    }
}

impl Default for GpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for GpuSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Gpu
    }

    #[cfg(feature = "nvml")]
    fn sample(&mut self) -> Option<Sample> {
        let nvml = self.nvml.as_ref()?;
        let device = nvml.device_by_index(0).ok()?;

        let load = device.utilization_rates().ok()?.gpu as f64;
        let used_mb = device.memory_info().ok()?.used / 1_000_000;

        Some(Sample::Gpu { load, used_mb })
    }

    #[cfg(not(feature = "nvml"))]
    fn sample(&mut self) -> Option<Sample> {
        None
    }
}
