use super::{MetricKind, Sample};

/// One event bound for the display, rendered as a `$`-terminated,
/// `|`-separated ASCII frame:
///
/// | Tag | Meaning         | Fields                                      |
/// |-----|-----------------|---------------------------------------------|
/// | 1   | CPU sample      | load %, temperature °C — `-\|-` when reset  |
/// | 2   | Memory sample   | load %, used MB — `-\|-` when reset         |
/// | 3   | GPU sample      | load %, used MB — `-\|-` when reset         |
/// | 4   | Network sample  | download KB/s, upload KB/s — `-\|-` on reset|
/// | z   | Alert           | metric id (0=config, 1..4), state (0/1)     |
/// | y   | Brightness      | level                                       |
///
/// Numeric fields are whole numbers; fractional parts are truncated, never
/// rounded, so a value stays below its alert threshold until it fully
/// reaches it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Frame {
    Sample(Sample),
    /// Placeholder telling the display to blank a metric's row.
    Reset(MetricKind),
    Alert {
        kind: MetricKind,
        active: bool,
    },
    Brightness(u8),
}

impl Frame {
    /// Render the frame to the bytes sent over the wire. Always succeeds:
    /// every variant has a complete textual form.
    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frame::Sample(Sample::Cpu { load, temp }) => {
                write!(formatter, "1|{}|{}$", *load as u64, *temp as u64)
            }
            Frame::Sample(Sample::Memory { load, used_mb }) => {
                write!(formatter, "2|{}|{used_mb}$", *load as u64)
            }
            Frame::Sample(Sample::Gpu { load, used_mb }) => {
                write!(formatter, "3|{}|{used_mb}$", *load as u64)
            }
            Frame::Sample(Sample::Network {
                download_kbs,
                upload_kbs,
            }) => write!(formatter, "4|{download_kbs}|{upload_kbs}$"),
            Frame::Reset(kind) => write!(formatter, "{}|-|-$", kind.tag()),
            Frame::Alert { kind, active } => {
                write!(formatter, "z|{}|{}$", kind.alert_id(), u8::from(*active))
            }
            Frame::Brightness(level) => write!(formatter, "y|{level}$"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_sample_truncates_fractions() {
        let frame = Frame::Sample(Sample::Cpu {
            load: 42.4,
            temp: 55.9,
        });
        assert_eq!(frame.encode(), b"1|42|55$");
    }

    #[test]
    fn sample_frames() {
        assert_eq!(
            Frame::Sample(Sample::Memory {
                load: 73.2,
                used_mb: 11740,
            })
            .encode(),
            b"2|73|11740$"
        );
        assert_eq!(
            Frame::Sample(Sample::Gpu {
                load: 99.99,
                used_mb: 2048,
            })
            .encode(),
            b"3|99|2048$"
        );
        assert_eq!(
            Frame::Sample(Sample::Network {
                download_kbs: 1200,
                upload_kbs: 340,
            })
            .encode(),
            b"4|1200|340$"
        );
    }

    #[test]
    fn reset_frames() {
        assert_eq!(Frame::Reset(MetricKind::Cpu).encode(), b"1|-|-$");
        assert_eq!(Frame::Reset(MetricKind::Network).encode(), b"4|-|-$");
    }

    #[test]
    fn alert_frames() {
        assert_eq!(
            Frame::Alert {
                kind: MetricKind::Memory,
                active: true,
            }
            .encode(),
            b"z|2|1$"
        );
        assert_eq!(
            Frame::Alert {
                kind: MetricKind::Gpu,
                active: false,
            }
            .encode(),
            b"z|3|0$"
        );
    }

    #[test]
    fn brightness_frame() {
        assert_eq!(Frame::Brightness(80).encode(), b"y|80$");
    }
}
