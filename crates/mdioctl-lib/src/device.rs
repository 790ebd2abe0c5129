//! Device communication: trait + nusb backend.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::protocol::{USB_CDC_SUBCLASS_NCM, USB_CLASS_COMM};

// ── Error type ──

/// Device communication errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// identifies the operation or step (e.g. `"USB open"`, `"control_in(bRequest=0x01)"`)
/// and *details* is the host stack's description of what went wrong.
#[derive(Debug)]
pub enum DeviceError {
    NotFound,
    OpenFailed(String),
    InterfaceNotFound,
    ClaimFailed(String),
    UnsupportedSpeed(String),
    /// The host stack reported a failed transfer.
    TransferFailed(String),
    /// The transfer completed but moved fewer bytes than requested/supplied.
    ShortTransfer { actual: usize, expected: usize },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound => write!(f, "USB device not found"),
            DeviceError::OpenFailed(e) => write!(f, "Failed to open device: {e}"),
            DeviceError::InterfaceNotFound => write!(f, "CDC NCM interface not found"),
            DeviceError::ClaimFailed(e) => write!(f, "Failed to claim interface: {e}"),
            DeviceError::UnsupportedSpeed(s) => {
                write!(f, "Unknown/unsupported ({s}) speed device")
            }
            DeviceError::TransferFailed(e) => write!(f, "Transfer failed: {e}"),
            DeviceError::ShortTransfer { actual, expected } => {
                write!(f, "Short transfer: {actual} of {expected} bytes")
            }
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Transfer parameters ──

/// Transfer direction as seen from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// `bmRequestType` type bits. The recipient is always the claimed interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Class,
    Vendor,
}

// ── Device info ──

/// Negotiated bus speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BusSpeed {
    Low,
    Full,
    High,
    Super,
    SuperPlus,
}

impl fmt::Display for BusSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BusSpeed::Low => "Low",
            BusSpeed::Full => "Full",
            BusSpeed::High => "High",
            BusSpeed::Super => "Super",
            BusSpeed::SuperPlus => "SuperPlus",
        };
        f.write_str(s)
    }
}

/// Only full- and high-speed firmware builds exist for the adapter.
///
/// An unknown speed (the platform could not report it) is accepted.
pub fn check_speed(speed: Option<BusSpeed>) -> Result<()> {
    match speed {
        Some(BusSpeed::Full | BusSpeed::High) | None => Ok(()),
        Some(other) => Err(DeviceError::UnsupportedSpeed(other.to_string())),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    /// Bus location, e.g. `usb:001/004 [1209:0001]`.
    pub path: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub product: Option<String>,
    pub speed: Option<BusSpeed>,
    /// Number of the claimed CDC-NCM communication interface.
    pub interface_number: u8,
}

/// Parameters needed to locate and open the adapter.
#[derive(Debug, Clone, Copy)]
pub struct OpenParams {
    pub vendor_id: u16,
    pub product_id: u16,
    pub timeout: Duration,
}

/// Pick the CDC-NCM communication interface.
///
/// Takes `(interface_number, class, subclass)` of the first alternate setting
/// of each interface, in configuration order. First match wins.
pub fn select_ncm_interface(interfaces: impl IntoIterator<Item = (u8, u8, u8)>) -> Option<u8> {
    interfaces
        .into_iter()
        .find(|&(_, class, subclass)| class == USB_CLASS_COMM && subclass == USB_CDC_SUBCLASS_NCM)
        .map(|(number, _, _)| number)
}

// ── Trait ──

/// Synchronous control-transfer access to the claimed interface.
///
/// Both methods report what the host stack actually moved; length checks
/// belong to the callers (see [`crate::transfer`]).
pub trait NcmDevice {
    fn info(&self) -> &DeviceInfo;

    /// IN transfer of up to `length` bytes. The returned buffer may be shorter.
    fn control_in(
        &self,
        request_type: RequestType,
        request: u8,
        value: u16,
        length: usize,
    ) -> Result<Vec<u8>>;

    /// OUT transfer. Returns the number of bytes the device accepted.
    fn control_out(
        &self,
        request_type: RequestType,
        request: u8,
        value: u16,
        data: &[u8],
    ) -> Result<usize>;
}

// ── nusb implementation ──

mod usb_impl {
    use super::*;

    use nusb::transfer::{Control, ControlType, Recipient};

    /// An opened adapter with its communication interface claimed.
    ///
    /// Dropping it releases the interface and closes the device.
    pub struct UsbDevice {
        interface: nusb::Interface,
        _device: nusb::Device,
        info: DeviceInfo,
        timeout: Duration,
    }

    fn control_type(request_type: RequestType) -> ControlType {
        match request_type {
            RequestType::Class => ControlType::Class,
            RequestType::Vendor => ControlType::Vendor,
        }
    }

    fn bus_speed(speed: nusb::Speed) -> BusSpeed {
        match speed {
            nusb::Speed::Low => BusSpeed::Low,
            nusb::Speed::Full => BusSpeed::Full,
            nusb::Speed::High => BusSpeed::High,
            nusb::Speed::Super => BusSpeed::Super,
            _ => BusSpeed::SuperPlus,
        }
    }

    impl UsbDevice {
        pub fn open(params: &OpenParams) -> Result<Self> {
            let device_info = nusb::list_devices()
                .map_err(|e| DeviceError::OpenFailed(format!("USB enumeration: {e}")))?
                .find(|dev| {
                    dev.vendor_id() == params.vendor_id && dev.product_id() == params.product_id
                })
                .ok_or(DeviceError::NotFound)?;

            let path = format!(
                "usb:{:03}/{:03} [{:04x}:{:04x}]",
                device_info.bus_number(),
                device_info.device_address(),
                device_info.vendor_id(),
                device_info.product_id(),
            );
            let speed = device_info.speed().map(bus_speed);
            check_speed(speed)?;
            log::info!("{path}: speed {speed:?}");

            let device = device_info
                .open()
                .map_err(|e| DeviceError::OpenFailed(format!("USB open: {e}")))?;

            let iface_num = {
                let config = device.active_configuration().map_err(|e| {
                    DeviceError::OpenFailed(format!("active configuration: {e}"))
                })?;
                select_ncm_interface(config.interfaces().filter_map(|group| {
                    let alt = group.alt_settings().next()?;
                    Some((group.interface_number(), alt.class(), alt.subclass()))
                }))
                .ok_or(DeviceError::InterfaceNotFound)?
            };
            log::info!("{path}: CDC NCM interface {iface_num}");

            // The host cdc_ncm driver normally owns this interface.
            let interface = device
                .detach_and_claim_interface(iface_num)
                .map_err(|e| DeviceError::ClaimFailed(format!("interface {iface_num}: {e}")))?;

            Ok(UsbDevice {
                interface,
                _device: device,
                info: DeviceInfo {
                    path,
                    vendor_id: params.vendor_id,
                    product_id: params.product_id,
                    product: device_info.product_string().map(|s| s.to_string()),
                    speed,
                    interface_number: iface_num,
                },
                timeout: params.timeout,
            })
        }

        fn control(&self, request_type: RequestType, request: u8, value: u16) -> Control {
            Control {
                control_type: control_type(request_type),
                recipient: Recipient::Interface,
                request,
                value,
                index: self.info.interface_number as u16,
            }
        }
    }

    impl NcmDevice for UsbDevice {
        fn info(&self) -> &DeviceInfo {
            &self.info
        }

        fn control_in(
            &self,
            request_type: RequestType,
            request: u8,
            value: u16,
            length: usize,
        ) -> Result<Vec<u8>> {
            let mut buf = vec![0u8; length];
            let n = self
                .interface
                .control_in_blocking(self.control(request_type, request, value), &mut buf, self.timeout)
                .map_err(|e| {
                    DeviceError::TransferFailed(format!("control_in(bRequest=0x{request:02x}): {e}"))
                })?;
            buf.truncate(n);
            Ok(buf)
        }

        fn control_out(
            &self,
            request_type: RequestType,
            request: u8,
            value: u16,
            data: &[u8],
        ) -> Result<usize> {
            self.interface
                .control_out_blocking(self.control(request_type, request, value), data, self.timeout)
                .map_err(|e| {
                    DeviceError::TransferFailed(format!("control_out(bRequest=0x{request:02x}): {e}"))
                })
        }
    }

    impl Drop for UsbDevice {
        fn drop(&mut self) {
            log::debug!(
                "{}: releasing interface {}",
                self.info.path,
                self.info.interface_number
            );
        }
    }
}

pub use usb_impl::UsbDevice;

/// Open the adapter and claim its CDC-NCM interface.
pub fn open_device(params: &OpenParams) -> Result<UsbDevice> {
    UsbDevice::open(params)
}

// ── Mock device for testing ──

/// In-memory adapter for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use crate::protocol::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// One recorded control transfer.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Transfer {
        pub direction: Direction,
        pub request_type: RequestType,
        pub request: u8,
        pub value: u16,
        /// IN: requested length. OUT: supplied length.
        pub length: usize,
        /// OUT data stage (empty for IN).
        pub data: Vec<u8>,
    }

    /// Emulates the adapter firmware: a PHY register file keyed by
    /// `(phy, reg)`, the command-set version, the stream sink and the
    /// CDC Ethernet settings.
    pub struct MockDevice {
        info: DeviceInfo,
        pub registers: RefCell<HashMap<(u8, u8), u16>>,
        pub cmdset_version: Cell<u32>,
        pub mac_address: Cell<[u8; 6]>,
        pub packet_filter: Cell<Option<u16>>,
        /// Last multicast list: (count from wValue, data stage).
        pub multicast: RefCell<Option<(u16, Vec<u8>)>>,
        /// Bytes received by the stream test.
        pub stream: RefCell<Vec<u8>>,
        /// If set, the stream sink accepts at most this many bytes.
        pub stream_accept_limit: Cell<Option<usize>>,
        /// If set, IN replies are truncated to this many bytes.
        pub short_reply: Cell<Option<usize>>,
        /// If set, OUT transfers (other than the stream) accept at most this many bytes.
        pub short_accept: Cell<Option<usize>>,
        /// If set, transfers with this `bRequest` fail.
        pub fail_request: Cell<Option<u8>>,
        pub transfers: RefCell<Vec<Transfer>>,
    }

    impl Default for MockDevice {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockDevice {
        pub fn new() -> Self {
            MockDevice {
                info: DeviceInfo {
                    path: "mock://ncm".into(),
                    vendor_id: DEFAULT_VID,
                    product_id: DEFAULT_PID,
                    product: Some("Mock NCM Adapter".into()),
                    speed: Some(BusSpeed::High),
                    interface_number: 0,
                },
                registers: RefCell::new(HashMap::new()),
                cmdset_version: Cell::new(0x0000_0001),
                mac_address: Cell::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]),
                packet_filter: Cell::new(None),
                multicast: RefCell::new(None),
                stream: RefCell::new(Vec::new()),
                stream_accept_limit: Cell::new(None),
                short_reply: Cell::new(None),
                short_accept: Cell::new(None),
                fail_request: Cell::new(None),
                transfers: RefCell::new(Vec::new()),
            }
        }

        /// Mutable access to device info.
        pub fn info_mut(&mut self) -> &mut DeviceInfo {
            &mut self.info
        }

        pub fn set_register(&self, phy: u8, reg: u8, value: u16) {
            self.registers.borrow_mut().insert((phy, reg), value);
        }

        pub fn register(&self, phy: u8, reg: u8) -> Option<u16> {
            self.registers.borrow().get(&(phy, reg)).copied()
        }

        fn check_fault(&self, request: u8) -> Result<()> {
            if self.fail_request.get() == Some(request) {
                return Err(DeviceError::TransferFailed(format!(
                    "mock: bRequest=0x{request:02x}: failure injected"
                )));
            }
            Ok(())
        }
    }

    impl NcmDevice for MockDevice {
        fn info(&self) -> &DeviceInfo {
            &self.info
        }

        fn control_in(
            &self,
            request_type: RequestType,
            request: u8,
            value: u16,
            length: usize,
        ) -> Result<Vec<u8>> {
            self.transfers.borrow_mut().push(Transfer {
                direction: Direction::In,
                request_type,
                request,
                value,
                length,
                data: Vec::new(),
            });
            self.check_fault(request)?;

            let mut reply = match (request_type, request) {
                (RequestType::Vendor, VENDOR_CMD_CMDSET_VERSION) => {
                    self.cmdset_version.get().to_le_bytes().to_vec()
                }
                (RequestType::Vendor, VENDOR_CMD_MDIO_RW) => {
                    let phy = (value >> 8) as u8;
                    let reg = (value & 0x1F) as u8;
                    self.register(phy, reg).unwrap_or(0).to_le_bytes().to_vec()
                }
                (RequestType::Class, USB_CDC_GET_NET_ADDRESS) => self.mac_address.get().to_vec(),
                _ => {
                    return Err(DeviceError::TransferFailed(format!(
                        "mock: bRequest=0x{request:02x}: stall"
                    )));
                }
            };
            reply.truncate(length);
            if let Some(max) = self.short_reply.get() {
                reply.truncate(max);
            }
            Ok(reply)
        }

        fn control_out(
            &self,
            request_type: RequestType,
            request: u8,
            value: u16,
            data: &[u8],
        ) -> Result<usize> {
            self.transfers.borrow_mut().push(Transfer {
                direction: Direction::Out,
                request_type,
                request,
                value,
                length: data.len(),
                data: data.to_vec(),
            });
            self.check_fault(request)?;

            if (request_type, request) == (RequestType::Vendor, VENDOR_CMD_STRM) {
                let accepted = self
                    .stream_accept_limit
                    .get()
                    .map_or(data.len(), |max| max.min(data.len()));
                self.stream.borrow_mut().extend_from_slice(&data[..accepted]);
                return Ok(accepted);
            }

            let accepted = self
                .short_accept
                .get()
                .map_or(data.len(), |max| max.min(data.len()));
            if accepted < data.len() {
                return Ok(accepted);
            }

            match (request_type, request) {
                (RequestType::Vendor, VENDOR_CMD_MDIO_RW) if data.len() >= 2 => {
                    let phy = (value >> 8) as u8;
                    let reg = (value & 0x1F) as u8;
                    self.set_register(phy, reg, u16::from_le_bytes([data[0], data[1]]));
                }
                (RequestType::Class, USB_CDC_SET_ETHERNET_PACKET_FILTER) => {
                    self.packet_filter.set(Some(value));
                }
                (RequestType::Class, USB_CDC_SET_ETHERNET_MULTICAST_FILTERS) => {
                    *self.multicast.borrow_mut() = Some((value, data.to_vec()));
                }
                (RequestType::Class, USB_CDC_SET_NET_ADDRESS) if data.len() == 6 => {
                    let mut mac = [0u8; 6];
                    mac.copy_from_slice(data);
                    self.mac_address.set(mac);
                }
                _ => {
                    return Err(DeviceError::TransferFailed(format!(
                        "mock: bRequest=0x{request:02x}: stall"
                    )));
                }
            }
            Ok(accepted)
        }
    }
}
