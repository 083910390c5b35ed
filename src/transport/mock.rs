//! # Mock Transport
//!
//! A scriptable, in-memory [`Transport`] for exercising session and
//! diagnostics logic without hardware. Records every call and lets tests
//! inject failures at precise points: absent device, refused connect,
//! fault on the nth write.

use crate::error::TarjetaError;
use crate::protocol::{Frame, FrameKind};
use crate::transport::{DeviceId, DeviceStatus, Transport, TransportState};

/// Scriptable test double for [`Transport`]
///
/// Defaults to a present, connectable, always-ready device.
#[derive(Debug)]
pub struct MockTransport {
    /// Device shows up in discovery
    pub device_present: bool,
    /// Connects allowed before `connect` starts failing (None = unlimited)
    pub allowed_connects: Option<usize>,
    /// Fault on this zero-based write call index
    pub fail_write_at: Option<usize>,
    /// Status snapshot returned by `query_status`
    pub status: DeviceStatus,
    /// Make `query_status` fail at the link level
    pub fail_status: bool,

    /// Number of `discover` calls
    pub discover_calls: usize,
    /// Number of `connect` calls
    pub connect_calls: usize,
    /// Number of `write` calls
    pub write_calls: usize,
    /// Number of `close` calls
    pub close_calls: usize,
    /// Frame kinds of every successful write, in order
    pub written: Vec<Vec<FrameKind>>,

    /// Current resting state (exposed so tests can build with
    /// struct-update syntax)
    pub state: TransportState,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            device_present: true,
            allowed_connects: None,
            fail_write_at: None,
            status: DeviceStatus::ready(),
            fail_status: false,
            discover_calls: 0,
            connect_calls: 0,
            write_calls: 0,
            close_calls: 0,
            written: Vec::new(),
            state: TransportState::Disconnected,
        }
    }
}

impl MockTransport {
    /// A present, ready device
    pub fn ready() -> Self {
        Self::default()
    }

    /// No device on the bus
    pub fn absent() -> Self {
        Self {
            device_present: false,
            ..Self::default()
        }
    }

    /// Total frames of a given kind across all successful writes
    pub fn frames_of_kind(&self, kind: FrameKind) -> usize {
        self.written
            .iter()
            .flatten()
            .filter(|&&k| k == kind)
            .count()
    }
}

impl Transport for MockTransport {
    fn discover(&mut self) -> Result<DeviceId, TarjetaError> {
        self.discover_calls += 1;
        if self.device_present {
            Ok(DeviceId {
                vendor_id: 0x04b8,
                product_id: 0x0e28,
                bus: 1,
                address: 7,
            })
        } else {
            Err(TarjetaError::DeviceNotFound {
                vendor_id: 0x04b8,
                product_id: 0x0e28,
            })
        }
    }

    fn connect(&mut self) -> Result<(), TarjetaError> {
        self.connect_calls += 1;
        if !self.device_present {
            return Err(TarjetaError::Connection("no device".to_string()));
        }
        if let Some(limit) = self.allowed_connects {
            if self.connect_calls > limit {
                return Err(TarjetaError::Connection(
                    "device did not come back".to_string(),
                ));
            }
        }
        self.state = TransportState::Connected;
        Ok(())
    }

    fn write(&mut self, frames: &[Frame]) -> Result<(), TarjetaError> {
        let call = self.write_calls;
        self.write_calls += 1;

        if self.state != TransportState::Connected {
            return Err(TarjetaError::Transfer(format!(
                "write in state {:?}",
                self.state
            )));
        }
        if self.fail_write_at == Some(call) {
            self.state = TransportState::Faulted;
            return Err(TarjetaError::Transfer("injected write fault".to_string()));
        }

        self.written
            .push(frames.iter().map(|f| f.kind()).collect());
        Ok(())
    }

    fn query_status(&mut self) -> Result<DeviceStatus, TarjetaError> {
        if self.state != TransportState::Connected {
            return Err(TarjetaError::Transfer(format!(
                "status query in state {:?}",
                self.state
            )));
        }
        if self.fail_status {
            self.state = TransportState::Faulted;
            return Err(TarjetaError::Transfer("injected status fault".to_string()));
        }
        Ok(self.status.clone())
    }

    fn close(&mut self) {
        self.close_calls += 1;
        self.state = TransportState::Disconnected;
    }

    fn state(&self) -> TransportState {
        self.state
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::PrinterConfig;
    use crate::protocol::{EncodeOptions, encode};
    use crate::render::Bitmap;

    fn frames() -> Vec<Frame> {
        let config = PrinterConfig::generic_58mm();
        let bmp = Bitmap::from_packed(384, 10, vec![0; 48 * 10]).unwrap();
        encode(&bmp, &config, &EncodeOptions::default()).unwrap()
    }

    #[test]
    fn test_happy_path_lifecycle() {
        let mut mock = MockTransport::ready();
        assert_eq!(mock.state(), TransportState::Disconnected);

        mock.discover().unwrap();
        mock.connect().unwrap();
        assert_eq!(mock.state(), TransportState::Connected);

        mock.write(&frames()).unwrap();
        assert_eq!(mock.written.len(), 1);

        mock.close();
        assert_eq!(mock.state(), TransportState::Disconnected);
    }

    #[test]
    fn test_absent_device() {
        let mut mock = MockTransport::absent();
        assert!(mock.discover().is_err());
        assert!(mock.connect().is_err());
    }

    #[test]
    fn test_injected_write_fault() {
        let mut mock = MockTransport {
            fail_write_at: Some(1),
            ..MockTransport::ready()
        };
        mock.discover().unwrap();
        mock.connect().unwrap();

        assert!(mock.write(&frames()).is_ok());
        assert!(mock.write(&frames()).is_err());
        assert_eq!(mock.state(), TransportState::Faulted);

        // Faulted transport rejects further writes
        assert!(mock.write(&frames()).is_err());
        assert_eq!(mock.written.len(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut mock = MockTransport::ready();
        mock.close();
        mock.close();
        assert_eq!(mock.close_calls, 2);
        assert_eq!(mock.state(), TransportState::Disconnected);
    }

    #[test]
    fn test_connect_limit() {
        let mut mock = MockTransport {
            allowed_connects: Some(1),
            ..MockTransport::ready()
        };
        assert!(mock.connect().is_ok());
        assert!(mock.connect().is_err());
    }
}
