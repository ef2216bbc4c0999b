use std::sync::{Arc, Mutex};

use super::{Transport, TransportError};

/// In-memory transport used in tests to record every frame written, or to
/// script write failures.
#[derive(Default)]
pub struct FakeTransport {
    writes: Arc<Mutex<Vec<String>>>,
    fail_writes: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every write fails with an I/O error.
    pub fn failing() -> Self {
        Self {
            writes: Default::default(),
            fail_writes: true,
        }
    }

    /// Shared handle to the recorded frames, valid after the transport
    /// itself has been moved into the code under test.
    pub fn writes(&self) -> Arc<Mutex<Vec<String>>> {
        self.writes.clone()
    }
}

impl Transport for FakeTransport {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::WriteFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        self.writes
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(frame).to_string());
        Ok(())
    }
}
