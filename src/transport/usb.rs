//! # USB Bulk Transport
//!
//! This module provides communication with ESC/POS printers over USB
//! bulk transfer via libusb (`rusb`).
//!
//! ## Endpoint Layout
//!
//! Receipt printers expose the USB printer class (0x07) with one bulk
//! OUT endpoint for command/raster data and, on most models, one bulk
//! IN endpoint for DLE EOT status bytes. Both are located from the
//! active configuration descriptor at connect time — endpoint addresses
//! vary between vendors and must not be assumed.
//!
//! ## Linux Setup
//!
//! The kernel's `usblp` class driver usually claims the printer first.
//! The transport asks libusb to auto-detach it for the duration of the
//! claim, which requires either root or a udev rule:
//!
//! ```text
//! # /etc/udev/rules.d/99-escpos.rules
//! SUBSYSTEM=="usb", ATTRS{idVendor}=="04b8", ATTRS{idProduct}=="0e28", MODE="0664", GROUP="lp"
//! ```
//!
//! ## Retry Policy
//!
//! Bulk writes fail transiently when the printer's input buffer is full
//! (long raster jobs) or the hub is momentarily busy. Each frame is
//! retried up to `write_retries` times with a doubling backoff before
//! the transport gives up and faults. A timeout counts toward the bound
//! like any other transient error. Device-gone errors fault immediately;
//! no amount of backoff brings back an unplugged cable.

use std::thread;

use rusb::{Device, DeviceHandle, GlobalContext, TransferType, UsbContext};
use tracing::{debug, error, warn};

use crate::error::TarjetaError;
use crate::printer::PrinterConfig;
use crate::protocol::status::{self, StatusRequest};
use crate::protocol::{Frame, FrameKind};
use crate::transport::{DeviceId, DeviceStatus, Transport, TransportState};

/// Claimed interface and endpoint addresses for one open device
#[derive(Debug, Clone, Copy)]
struct Endpoints {
    interface: u8,
    bulk_out: u8,
    bulk_in: Option<u8>,
}

/// # USB Printer Transport
///
/// Owns the libusb device handle for exactly one printer. All I/O is
/// `&mut self`, so calls against one transport are serialized by
/// construction.
///
/// ## Example
///
/// ```no_run
/// use tarjeta::printer::PrinterConfig;
/// use tarjeta::transport::{Transport, UsbTransport};
///
/// let mut transport = UsbTransport::new(PrinterConfig::generic_58mm());
/// transport.discover()?;
/// transport.connect()?;
/// let status = transport.query_status()?;
/// println!("ready: {}", status.is_ready());
/// transport.close();
/// # Ok::<(), tarjeta::TarjetaError>(())
/// ```
pub struct UsbTransport {
    config: PrinterConfig,
    device: Option<Device<GlobalContext>>,
    handle: Option<DeviceHandle<GlobalContext>>,
    endpoints: Option<Endpoints>,
    state: TransportState,
}

impl UsbTransport {
    /// Create a transport for the configured device identity.
    ///
    /// No bus access happens until [`discover`](Transport::discover).
    pub fn new(config: PrinterConfig) -> Self {
        Self {
            config,
            device: None,
            handle: None,
            endpoints: None,
            state: TransportState::Disconnected,
        }
    }

    /// The configuration this transport was built with
    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Locate the printer interface and its bulk endpoints.
    fn find_endpoints(device: &Device<GlobalContext>) -> Result<Endpoints, TarjetaError> {
        let config_desc = device
            .active_config_descriptor()
            .map_err(|e| TarjetaError::Connection(format!("config descriptor: {}", e)))?;

        for interface in config_desc.interfaces() {
            for desc in interface.descriptors() {
                let mut bulk_out = None;
                let mut bulk_in = None;
                for ep in desc.endpoint_descriptors() {
                    if ep.transfer_type() != TransferType::Bulk {
                        continue;
                    }
                    match ep.direction() {
                        rusb::Direction::Out => bulk_out = Some(ep.address()),
                        rusb::Direction::In => bulk_in = Some(ep.address()),
                    }
                }
                if let Some(out) = bulk_out {
                    return Ok(Endpoints {
                        interface: desc.interface_number(),
                        bulk_out: out,
                        bulk_in,
                    });
                }
            }
        }

        Err(TarjetaError::Connection(
            "device has no bulk OUT endpoint".to_string(),
        ))
    }

    /// Write one frame completely, retrying transient errors.
    ///
    /// Tracks the unsent remainder so a short transfer continues where
    /// it stopped instead of resending bytes the printer already has.
    fn write_frame(&mut self, index: usize, frame: &Frame) -> Result<(), TarjetaError> {
        let endpoints = self.endpoints.ok_or_else(|| {
            TarjetaError::Transfer("write on a transport that is not connected".to_string())
        })?;
        let handle = self.handle.as_ref().ok_or_else(|| {
            TarjetaError::Transfer("write on a transport that is not connected".to_string())
        })?;

        let bytes = frame.bytes();
        let mut offset = 0usize;
        let mut attempts_left = self.config.write_retries.max(1);
        let mut backoff = self.config.retry_backoff;

        while offset < bytes.len() {
            match handle.write_bulk(endpoints.bulk_out, &bytes[offset..], self.config.io_timeout) {
                Ok(written) if written > 0 => {
                    offset += written;
                }
                Ok(_) => {
                    // Zero-length transfer: treat as a transient stall
                    attempts_left -= 1;
                    if attempts_left == 0 {
                        return Err(TarjetaError::Transfer(format!(
                            "frame {} ({:?}): device accepted no data",
                            index,
                            frame.kind()
                        )));
                    }
                    thread::sleep(backoff);
                    backoff *= 2;
                }
                Err(rusb::Error::NoDevice) | Err(rusb::Error::Pipe) => {
                    // The device is gone or the endpoint halted; retrying
                    // the same handle cannot succeed
                    return Err(TarjetaError::Transfer(format!(
                        "frame {} ({:?}): device unavailable",
                        index,
                        frame.kind()
                    )));
                }
                Err(e) => {
                    attempts_left -= 1;
                    if attempts_left == 0 {
                        return Err(TarjetaError::Transfer(format!(
                            "frame {} ({:?}): {} after {} attempts",
                            index,
                            frame.kind(),
                            e,
                            self.config.write_retries
                        )));
                    }
                    warn!(
                        frame = index,
                        kind = ?frame.kind(),
                        error = %e,
                        attempts_left,
                        "bulk write failed, backing off"
                    );
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }

        Ok(())
    }

    /// Issue one DLE EOT request and read back its single status byte.
    fn request_status_byte(&self, request: StatusRequest) -> Result<u8, TarjetaError> {
        let endpoints = self
            .endpoints
            .ok_or_else(|| TarjetaError::Transfer("status query while disconnected".to_string()))?;
        let bulk_in = endpoints.bulk_in.ok_or_else(|| {
            TarjetaError::Transfer("device has no bulk IN endpoint for status".to_string())
        })?;
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| TarjetaError::Transfer("status query while disconnected".to_string()))?;

        handle
            .write_bulk(endpoints.bulk_out, &request.command(), self.config.io_timeout)
            .map_err(|e| TarjetaError::Transfer(format!("status request: {}", e)))?;

        // The response is a single byte, but stale data can precede it;
        // scan the read for the first byte with valid status framing.
        let mut buf = [0u8; 16];
        let read = handle
            .read_bulk(bulk_in, &mut buf, self.config.io_timeout)
            .map_err(|e| TarjetaError::Transfer(format!("status read: {}", e)))?;

        buf[..read]
            .iter()
            .copied()
            .find(|&b| status::is_status_byte(b))
            .ok_or_else(|| {
                TarjetaError::Transfer(format!(
                    "no valid status byte in {} bytes read",
                    read
                ))
            })
    }
}

impl Transport for UsbTransport {
    fn discover(&mut self) -> Result<DeviceId, TarjetaError> {
        // Fresh scan on every call; stale results lie about hot-plugged
        // or unplugged printers
        let devices = GlobalContext::default()
            .devices()
            .map_err(|e| TarjetaError::Connection(format!("USB enumeration: {}", e)))?;

        for device in devices.iter() {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            if desc.vendor_id() == self.config.vendor_id
                && desc.product_id() == self.config.product_id
            {
                let id = DeviceId {
                    vendor_id: desc.vendor_id(),
                    product_id: desc.product_id(),
                    bus: device.bus_number(),
                    address: device.address(),
                };
                debug!(?id, "printer discovered");
                self.device = Some(device);
                return Ok(id);
            }
        }

        self.device = None;
        Err(TarjetaError::DeviceNotFound {
            vendor_id: self.config.vendor_id,
            product_id: self.config.product_id,
        })
    }

    fn connect(&mut self) -> Result<(), TarjetaError> {
        if self.state == TransportState::Connected {
            return Ok(());
        }
        if self.state == TransportState::Faulted {
            return Err(TarjetaError::Connection(
                "transport is faulted; close and rediscover first".to_string(),
            ));
        }

        let device = self
            .device
            .clone()
            .ok_or_else(|| TarjetaError::Connection("no discovered device".to_string()))?;

        let handle = device
            .open()
            .map_err(|e| TarjetaError::Connection(format!("open failed: {}", e)))?;

        let endpoints = Self::find_endpoints(&device)?;

        // Let libusb juggle the kernel class driver; unsupported on some
        // platforms, which is fine
        let _ = handle.set_auto_detach_kernel_driver(true);

        // A claim held elsewhere means another session owns the printer.
        // That is an error, not a queue.
        handle.claim_interface(endpoints.interface).map_err(|e| {
            TarjetaError::Connection(format!(
                "claim interface {} failed (device busy?): {}",
                endpoints.interface, e
            ))
        })?;

        debug!(
            interface = endpoints.interface,
            bulk_out = endpoints.bulk_out,
            bulk_in = ?endpoints.bulk_in,
            "printer connected"
        );

        self.handle = Some(handle);
        self.endpoints = Some(endpoints);
        self.state = TransportState::Connected;
        Ok(())
    }

    fn write(&mut self, frames: &[Frame]) -> Result<(), TarjetaError> {
        match self.state {
            TransportState::Connected => {}
            TransportState::Faulted => {
                return Err(TarjetaError::Transfer(
                    "transport is faulted; close and rediscover first".to_string(),
                ));
            }
            TransportState::Disconnected => {
                return Err(TarjetaError::Transfer(
                    "write on a disconnected transport".to_string(),
                ));
            }
        }

        for (index, frame) in frames.iter().enumerate() {
            if let Err(e) = self.write_frame(index, frame) {
                self.state = TransportState::Faulted;
                error!(frame = index, kind = ?frame.kind(), "transport faulted: {}", e);
                return Err(e);
            }
            if let FrameKind::Raster { rows } = frame.kind() {
                debug!(frame = index, rows, bytes = frame.len(), "raster chunk sent");
            }
        }

        Ok(())
    }

    fn query_status(&mut self) -> Result<DeviceStatus, TarjetaError> {
        if self.state != TransportState::Connected {
            return Err(TarjetaError::Transfer(
                "status query on a transport that is not connected".to_string(),
            ));
        }

        let printer = match self.request_status_byte(StatusRequest::Printer) {
            Ok(b) => b,
            Err(e) => {
                self.state = TransportState::Faulted;
                return Err(e);
            }
        };
        let offline_cause = match self.request_status_byte(StatusRequest::OfflineCause) {
            Ok(b) => b,
            Err(e) => {
                self.state = TransportState::Faulted;
                return Err(e);
            }
        };
        let paper = match self.request_status_byte(StatusRequest::PaperSensor) {
            Ok(b) => b,
            Err(e) => {
                self.state = TransportState::Faulted;
                return Err(e);
            }
        };

        let mut snapshot = DeviceStatus {
            online: !status::is_offline(printer),
            paper_out: status::is_paper_out(paper) || status::is_paper_end_stop(offline_cause),
            paper_near_end: status::is_paper_near_end(paper),
            cover_open: status::is_cover_open(offline_cause),
            error: status::is_error(offline_cause),
            errors: Vec::new(),
        };

        if !snapshot.online {
            snapshot.errors.push("printer is offline".to_string());
        }
        if snapshot.paper_out {
            snapshot.errors.push("paper out".to_string());
        }
        if snapshot.cover_open {
            snapshot.errors.push("cover open".to_string());
        }
        if snapshot.error {
            snapshot.errors.push("printer error condition".to_string());
        }
        if snapshot.paper_near_end {
            snapshot.errors.push("paper near end".to_string());
        }

        Ok(snapshot)
    }

    fn close(&mut self) {
        if let (Some(handle), Some(endpoints)) = (self.handle.take(), self.endpoints.take()) {
            // Best effort: the handle is released either way
            let _ = handle.release_interface(endpoints.interface);
            debug!("printer connection closed");
        }
        self.state = TransportState::Disconnected;
    }

    fn state(&self) -> TransportState {
        self.state
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// Note: transport tests against real hardware live with the hardware.
// Protocol-visible behavior (retry, fault, ordering) is covered through
// the mock transport in `session` and `diagnostics` tests.
