pub mod fake;

use std::{io::Write, time::Duration};

use tracing::*;

use crate::settings::manager::SerialSettings;

/// Time the display device needs to boot after the serial port opens, since
/// opening the port resets the microcontroller.
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to open serial port {port:?}: {source}")]
    Unavailable {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("Failed to write frame to display: {0}")]
    WriteFailed(#[from] std::io::Error),
}

/// Write-only link to the display device. Closing is dropping: the serial
/// port is released when the implementor goes out of scope.
pub trait Transport: Send {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;
}

pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialLink {
    pub fn connect(settings: &SerialSettings) -> Result<Self, TransportError> {
        debug!(
            "Opening serial port {}@{}",
            settings.port, settings.baud
        );
        let port = serialport::new(settings.port.as_str(), settings.baud)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|source| TransportError::Unavailable {
                port: settings.port.clone(),
                source,
            })?;
        Ok(Self { port })
    }
}

impl Transport for SerialLink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }
}

/// List the serial port names present on this machine, for the web page's
/// port picker.
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|port| port.port_name).collect(),
        Err(error) => {
            warn!("Failed to enumerate serial ports: {error}");
            vec![]
        }
    }
}
