//! Protocol constants for the CDC-NCM adapter control endpoint.
//!
//! Vendor requests are handled by the adapter firmware on the communication
//! interface (`wIndex` = interface number). Class requests are the standard
//! CDC Ethernet/NCM management requests, issued against the same interface.

// ── USB identifiers ──

/// Default vendor ID (pid.codes).
pub const DEFAULT_VID: u16 = 0x1209;

/// Default product ID.
pub const DEFAULT_PID: u16 = 0x0001;

/// Default PHY address on the MDIO bus.
pub const DEFAULT_PHY: u8 = 1;

/// `bInterfaceClass` of a CDC communication interface.
pub const USB_CLASS_COMM: u8 = 0x02;

/// `bInterfaceSubClass` for the Network Control Model.
pub const USB_CDC_SUBCLASS_NCM: u8 = 0x0D;

// ── Vendor requests ──

/// Command-set version: IN, 4-byte little-endian reply.
pub const VENDOR_CMD_CMDSET_VERSION: u8 = 0x00;

/// MDIO register read (IN) / write (OUT), 2-byte little-endian payload.
pub const VENDOR_CMD_MDIO_RW: u8 = 0x01;

/// Raw streaming test: OUT, sequential byte pattern.
pub const VENDOR_CMD_STRM: u8 = 0x02;

/// Size of the command-set version reply.
pub const CMDSET_VERSION_LEN: usize = 4;

/// Size of an MDIO register payload.
pub const MDIO_PAYLOAD_LEN: usize = 2;

/// Highest PHY address / register offset on a clause-22 MDIO bus.
pub const MDIO_MAX_ADDR: u8 = 0x1F;

/// Register read by the default action.
pub const DEFAULT_DIAG_REGISTER: u8 = 0x10;

/// Upper bound for the stream test payload.
pub const STREAM_MAX_LEN: usize = 512;

// ── CDC class requests ──

/// `SET_ETHERNET_MULTICAST_FILTERS`: value = address count, data = 6×N bytes.
pub const USB_CDC_SET_ETHERNET_MULTICAST_FILTERS: u8 = 0x40;

/// `SET_ETHERNET_PACKET_FILTER`: value = filter bitmap, no data.
pub const USB_CDC_SET_ETHERNET_PACKET_FILTER: u8 = 0x43;

/// `GET_NET_ADDRESS` (NCM): 6-byte reply.
pub const USB_CDC_GET_NET_ADDRESS: u8 = 0x81;

/// `SET_NET_ADDRESS` (NCM): 6-byte data stage.
pub const USB_CDC_SET_NET_ADDRESS: u8 = 0x82;

/// Bits defined for `SET_ETHERNET_PACKET_FILTER`
/// (promiscuous, all-multicast, directed, broadcast, multicast).
pub const PACKET_FILTER_MASK: u8 = 0x1F;

// ── Transfer parameters ──

/// Default timeout per control transfer in milliseconds.
pub const USB_TIMEOUT_MS: u64 = 1000;

/// Largest receive buffer accepted for IN class commands.
pub const MAX_RX_BUFFER: usize = 1024;
