//! Serial port enumeration.
//!
//! A pure query against the host's device registry via
//! [`serialport::available_ports`]. Descriptors are recreated on every
//! call and may change between calls as devices are plugged and unplugged.
//! An empty list is valid output, never a failure; enumeration errors
//! degrade to an empty list with a logged warning.

use log::warn;
use serialport::SerialPortType;

/// Descriptive metadata for one enumerated serial endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    /// The addressable endpoint (e.g. "/dev/ttyACM0", "COM3").
    pub device: String,
    /// Manufacturer string, when the registry provides one.
    pub manufacturer: String,
    /// Human-readable description, when the registry provides one.
    pub description: String,
}

impl PortDescriptor {
    const UNKNOWN_MANUFACTURER: &'static str = "Unknown";
    const NO_DESCRIPTION: &'static str = "No description";

    fn from_port_info(info: &serialport::SerialPortInfo) -> Self {
        let (manufacturer, description) = match &info.port_type {
            SerialPortType::UsbPort(usb) => (
                usb.manufacturer
                    .clone()
                    .unwrap_or_else(|| Self::UNKNOWN_MANUFACTURER.to_string()),
                usb.product
                    .clone()
                    .unwrap_or_else(|| Self::NO_DESCRIPTION.to_string()),
            ),
            SerialPortType::BluetoothPort => (
                Self::UNKNOWN_MANUFACTURER.to_string(),
                "Bluetooth serial port".to_string(),
            ),
            SerialPortType::PciPort => (
                Self::UNKNOWN_MANUFACTURER.to_string(),
                "PCI serial port".to_string(),
            ),
            SerialPortType::Unknown => (
                Self::UNKNOWN_MANUFACTURER.to_string(),
                Self::NO_DESCRIPTION.to_string(),
            ),
        };

        Self {
            device: info.port_name.clone(),
            manufacturer,
            description,
        }
    }
}

/// Enumerate the serial endpoints currently known to the host.
pub fn list_ports() -> Vec<PortDescriptor> {
    match serialport::available_ports() {
        Ok(ports) => ports.iter().map(PortDescriptor::from_port_info).collect(),
        Err(e) => {
            warn!("Port enumeration failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::{SerialPortInfo, UsbPortInfo};

    #[test]
    fn test_usb_metadata_mapped() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyACM0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x2e8a,
                pid: 0x000a,
                serial_number: None,
                manufacturer: Some("Acme Instruments".to_string()),
                product: Some("MCA-4096".to_string()),
            }),
        };
        let descriptor = PortDescriptor::from_port_info(&info);
        assert_eq!(descriptor.device, "/dev/ttyACM0");
        assert_eq!(descriptor.manufacturer, "Acme Instruments");
        assert_eq!(descriptor.description, "MCA-4096");
    }

    #[test]
    fn test_missing_metadata_defaults() {
        let info = SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::Unknown,
        };
        let descriptor = PortDescriptor::from_port_info(&info);
        assert_eq!(descriptor.manufacturer, "Unknown");
        assert_eq!(descriptor.description, "No description");
    }

    #[test]
    fn test_usb_without_strings_defaults() {
        let info = SerialPortInfo {
            port_name: "COM7".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x1234,
                pid: 0x5678,
                serial_number: None,
                manufacturer: None,
                product: None,
            }),
        };
        let descriptor = PortDescriptor::from_port_info(&info);
        assert_eq!(descriptor.manufacturer, "Unknown");
        assert_eq!(descriptor.description, "No description");
    }

    #[test]
    fn test_list_ports_never_fails() {
        // May legitimately be empty on a host with no serial devices.
        let _ = list_ports();
    }
}
