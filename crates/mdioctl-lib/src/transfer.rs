//! Control-transfer adapter: length-checked IN/OUT requests on the claimed interface.
//!
//! A transfer that moves fewer bytes than asked for is reported as
//! [`DeviceError::ShortTransfer`], separate from host-stack failures
//! ([`DeviceError::TransferFailed`]), so callers can decide which shortfalls
//! are tolerable.

use crate::device::{DeviceError, NcmDevice, RequestType, Result};

fn read(
    device: &impl NcmDevice,
    request_type: RequestType,
    request: u8,
    value: u16,
    length: usize,
    min_len: usize,
) -> Result<Vec<u8>> {
    let buf = device.control_in(request_type, request, value, length)?;
    log::debug!(
        "IN  {request_type:?} bRequest=0x{request:02x} wValue=0x{value:04x}: {}/{length} bytes",
        buf.len()
    );
    if buf.len() < min_len {
        return Err(DeviceError::ShortTransfer {
            actual: buf.len(),
            expected: min_len,
        });
    }
    Ok(buf)
}

fn write(
    device: &impl NcmDevice,
    request_type: RequestType,
    request: u8,
    value: u16,
    data: &[u8],
) -> Result<usize> {
    let n = device.control_out(request_type, request, value, data)?;
    log::debug!(
        "OUT {request_type:?} bRequest=0x{request:02x} wValue=0x{value:04x}: {n}/{} bytes",
        data.len()
    );
    if n < data.len() {
        return Err(DeviceError::ShortTransfer {
            actual: n,
            expected: data.len(),
        });
    }
    Ok(n)
}

/// Vendor IN request; fails if fewer than `length` bytes arrive.
pub fn read_vendor(
    device: &impl NcmDevice,
    request: u8,
    value: u16,
    length: usize,
) -> Result<Vec<u8>> {
    read(device, RequestType::Vendor, request, value, length, length)
}

/// Vendor OUT request; fails unless the whole buffer is accepted.
pub fn write_vendor(device: &impl NcmDevice, request: u8, value: u16, data: &[u8]) -> Result<usize> {
    write(device, RequestType::Vendor, request, value, data)
}

/// Class IN request into a `length`-byte buffer; fails if fewer than
/// `min_len` bytes arrive.
pub fn read_class(
    device: &impl NcmDevice,
    request: u8,
    value: u16,
    length: usize,
    min_len: usize,
) -> Result<Vec<u8>> {
    read(device, RequestType::Class, request, value, length, min_len)
}

/// Class OUT request.
pub fn write_class(device: &impl NcmDevice, request: u8, value: u16, data: &[u8]) -> Result<usize> {
    write(device, RequestType::Class, request, value, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::MockDevice;
    use crate::protocol::*;

    #[test]
    fn read_vendor_full_length() {
        let dev = MockDevice::new();
        dev.cmdset_version.set(0x0102_0304);
        let buf = read_vendor(&dev, VENDOR_CMD_CMDSET_VERSION, 0, 4).unwrap();
        assert_eq!(buf, vec![0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn read_vendor_short_reply() {
        let dev = MockDevice::new();
        dev.short_reply.set(Some(3));
        let err = read_vendor(&dev, VENDOR_CMD_CMDSET_VERSION, 0, 4).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::ShortTransfer {
                actual: 3,
                expected: 4
            }
        ));
    }

    #[test]
    fn write_vendor_short_accept() {
        let dev = MockDevice::new();
        dev.short_accept.set(Some(1));
        let err = write_vendor(&dev, VENDOR_CMD_MDIO_RW, 0x0101, &[0x34, 0x12]).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::ShortTransfer {
                actual: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn transfer_failure_passes_through() {
        let dev = MockDevice::new();
        dev.fail_request.set(Some(VENDOR_CMD_CMDSET_VERSION));
        let err = read_vendor(&dev, VENDOR_CMD_CMDSET_VERSION, 0, 4).unwrap_err();
        assert!(matches!(err, DeviceError::TransferFailed(_)));
    }

    #[test]
    fn zero_length_write_succeeds() {
        let dev = MockDevice::new();
        let n = write_class(&dev, USB_CDC_SET_ETHERNET_PACKET_FILTER, 0x0C, &[]).unwrap();
        assert_eq!(n, 0);
        assert_eq!(dev.packet_filter.get(), Some(0x0C));
    }

    #[test]
    fn read_class_oversized_buffer() {
        let dev = MockDevice::new();
        let buf = read_class(&dev, USB_CDC_GET_NET_ADDRESS, 0, 64, 6).unwrap();
        assert_eq!(buf.len(), 6);
        assert!(read_class(&dev, USB_CDC_GET_NET_ADDRESS, 0, 64, 8).is_err());
    }

    #[test]
    fn request_type_is_forwarded() {
        let dev = MockDevice::new();
        read_class(&dev, USB_CDC_GET_NET_ADDRESS, 0, 6, 6).unwrap();
        let transfers = dev.transfers.borrow();
        assert_eq!(transfers[0].request_type, RequestType::Class);
        assert_eq!(transfers[0].request, USB_CDC_GET_NET_ADDRESS);
    }
}
