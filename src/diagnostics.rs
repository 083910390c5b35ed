//! # Connectivity Diagnostics
//!
//! Answers "why won't it print?" in one pass without printing anything:
//!
//! 1. Is the device on the bus at all?
//! 2. Can it be opened and claimed?
//! 3. Does it report ready (paper, cover, no error)?
//!
//! Each check only runs when the previous one passed, so the report
//! reads as a ladder: the first `false` is the thing to fix. Collection
//! itself never fails — every probe failure becomes report data.

use serde::Serialize;
use tracing::debug;

use crate::transport::Transport;

/// # Diagnostic Report
///
/// Serialized as camelCase JSON for the CLI's `diag` output.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    /// A matching device was found on the bus
    pub usb_device_found: bool,
    /// The device could be opened and its interface claimed
    pub printer_exists: bool,
    /// The printer reports online with paper loaded and cover closed
    pub printer_ready: bool,
    /// One entry per failed check or non-ready condition
    pub error_messages: Vec<String>,
}

impl DiagnosticReport {
    /// Whether every check passed
    pub fn all_ok(&self) -> bool {
        self.usb_device_found && self.printer_exists && self.printer_ready
    }
}

/// Probe the device through the given transport.
///
/// Never returns an error: failures are recorded in the report. The
/// transport is always closed before returning, whatever the probes
/// found.
pub fn collect<T: Transport>(transport: &mut T) -> DiagnosticReport {
    let mut report = DiagnosticReport::default();

    match transport.discover() {
        Ok(id) => {
            debug!(
                vendor = format_args!("{:04x}", id.vendor_id),
                product = format_args!("{:04x}", id.product_id),
                bus = id.bus,
                address = id.address,
                "device found"
            );
            report.usb_device_found = true;
        }
        Err(e) => {
            report.error_messages.push(e.to_string());
            transport.close();
            return report;
        }
    }

    if let Err(e) = transport.connect() {
        report.error_messages.push(e.to_string());
        transport.close();
        return report;
    }
    report.printer_exists = true;

    match transport.query_status() {
        Ok(status) => {
            report.printer_ready = status.is_ready();
            report.error_messages.extend(status.errors);
        }
        Err(e) => {
            report.error_messages.push(e.to_string());
        }
    }

    transport.close();
    report
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::transport::{DeviceStatus, TransportState};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ready_device_passes_every_check() {
        let mut mock = MockTransport::ready();
        let report = collect(&mut mock);

        assert!(report.usb_device_found);
        assert!(report.printer_exists);
        assert!(report.printer_ready);
        assert!(report.error_messages.is_empty());
        assert!(report.all_ok());
        assert_eq!(mock.close_calls, 1);
    }

    #[test]
    fn test_absent_device_stops_at_first_check() {
        let mut mock = MockTransport::absent();
        let report = collect(&mut mock);

        assert!(!report.usb_device_found);
        assert!(!report.printer_exists);
        assert!(!report.printer_ready);
        assert!(!report.error_messages.is_empty());
        // Connect was never attempted
        assert_eq!(mock.connect_calls, 0);
        assert_eq!(mock.close_calls, 1);
    }

    #[test]
    fn test_paper_out_reported_not_raised() {
        let mut mock = MockTransport {
            status: DeviceStatus {
                online: true,
                paper_out: true,
                errors: vec!["paper out".to_string()],
                ..DeviceStatus::default()
            },
            ..MockTransport::ready()
        };
        let report = collect(&mut mock);

        assert!(report.usb_device_found);
        assert!(report.printer_exists);
        assert!(!report.printer_ready);
        assert_eq!(report.error_messages, vec!["paper out".to_string()]);
    }

    #[test]
    fn test_status_link_failure_still_closes() {
        let mut mock = MockTransport {
            fail_status: true,
            ..MockTransport::ready()
        };
        let report = collect(&mut mock);

        assert!(report.printer_exists);
        assert!(!report.printer_ready);
        assert!(!report.error_messages.is_empty());
        assert_eq!(mock.close_calls, 1);
        assert_eq!(mock.state(), TransportState::Disconnected);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = DiagnosticReport {
            usb_device_found: true,
            printer_exists: true,
            printer_ready: false,
            error_messages: vec!["cover open".to_string()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["usbDeviceFound"], true);
        assert_eq!(json["printerExists"], true);
        assert_eq!(json["printerReady"], false);
        assert_eq!(json["errorMessages"][0], "cover open");
    }
}
