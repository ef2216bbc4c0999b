pub mod alert;
pub mod frame;
pub mod manager;
pub mod monitor;
pub mod scheduler;

/// Metric categories streamed to the display. Each one maps to a fixed frame
/// tag and alert id on the wire (see [`frame`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Cpu,
    Memory,
    Gpu,
    Network,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::Gpu,
        MetricKind::Network,
    ];

    /// First character of this metric's sample frame.
    pub fn tag(&self) -> char {
        match self {
            MetricKind::Cpu => '1',
            MetricKind::Memory => '2',
            MetricKind::Gpu => '3',
            MetricKind::Network => '4',
        }
    }

    /// Identifier used in alert frames. 0 is reserved for configuration
    /// alerts raised by the display itself.
    pub fn alert_id(&self) -> u8 {
        match self {
            MetricKind::Cpu => 1,
            MetricKind::Memory => 2,
            MetricKind::Gpu => 3,
            MetricKind::Network => 4,
        }
    }

    /// Number of alert sub-thresholds tracked for this metric.
    pub fn sub_threshold_count(&self) -> usize {
        match self {
            MetricKind::Cpu => 2,
            MetricKind::Memory => 1,
            MetricKind::Gpu => 2,
            MetricKind::Network => 2,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Cpu => write!(formatter, "CPU"),
            MetricKind::Memory => write!(formatter, "memory"),
            MetricKind::Gpu => write!(formatter, "GPU"),
            MetricKind::Network => write!(formatter, "network"),
        }
    }
}

/// One measurement produced by a watcher, fresh every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    Cpu { load: f64, temp: f64 },
    Memory { load: f64, used_mb: u64 },
    Gpu { load: f64, used_mb: u64 },
    Network { download_kbs: u64, upload_kbs: u64 },
}

impl Sample {
    pub fn kind(&self) -> MetricKind {
        match self {
            Sample::Cpu { .. } => MetricKind::Cpu,
            Sample::Memory { .. } => MetricKind::Memory,
            Sample::Gpu { .. } => MetricKind::Gpu,
            Sample::Network { .. } => MetricKind::Network,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("At least one system statistic must be enabled")]
    NoMetricEnabled,

    #[error("Stats interval must be at least one second")]
    ZeroInterval,
}
