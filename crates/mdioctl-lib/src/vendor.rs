//! Vendor commands other than MDIO: command-set version and stream test.

use crate::device::{DeviceError, NcmDevice};
use crate::error::Result;
use crate::protocol::{CMDSET_VERSION_LEN, STREAM_MAX_LEN, VENDOR_CMD_CMDSET_VERSION, VENDOR_CMD_STRM};
use crate::transfer;

/// Read the firmware's command-set version (4 bytes, little-endian).
pub fn command_set_version(device: &impl NcmDevice) -> Result<u32> {
    let buf = transfer::read_vendor(device, VENDOR_CMD_CMDSET_VERSION, 0x0000, CMDSET_VERSION_LEN)?;
    let reply = buf
        .iter()
        .take(CMDSET_VERSION_LEN)
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
    Ok(reply)
}

/// Stream test payload: byte `i` is `i & 0xFF`.
pub fn stream_pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i & 0xFF) as u8).collect()
}

/// Cap a requested stream length at [`STREAM_MAX_LEN`].
///
/// Returns the effective length and whether it was clamped.
pub fn clamp_stream_len(len: usize) -> (usize, bool) {
    if len > STREAM_MAX_LEN {
        (STREAM_MAX_LEN, true)
    } else {
        (len, false)
    }
}

/// Result of a stream test write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Bytes sent after clamping.
    pub requested: usize,
    /// Bytes the device accepted.
    pub written: usize,
}

impl StreamOutcome {
    pub fn is_complete(&self) -> bool {
        self.written >= self.requested
    }
}

/// Send the stream test pattern.
///
/// Lengths above the cap are clamped with a warning. A short write is not an
/// error here (the caller reports it); host-stack failures are.
pub fn stream_test(device: &impl NcmDevice, len: usize) -> Result<StreamOutcome> {
    let (len, clamped) = clamp_stream_len(len);
    if clamped {
        log::warn!("stream length capped at {len}");
    }
    let payload = stream_pattern(len);
    let written = match transfer::write_vendor(device, VENDOR_CMD_STRM, 0x0000, &payload) {
        Ok(n) => n,
        Err(DeviceError::ShortTransfer { actual, .. }) => actual,
        Err(e) => return Err(e.into()),
    };
    Ok(StreamOutcome {
        requested: len,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::MockDevice;
    use crate::error::MdioctlError;

    #[test]
    fn version_little_endian() {
        let dev = MockDevice::new();
        dev.cmdset_version.set(0xDEAD_BEEF);
        assert_eq!(command_set_version(&dev).unwrap(), 0xDEAD_BEEF);
        let transfers = dev.transfers.borrow();
        assert_eq!(transfers[0].request, VENDOR_CMD_CMDSET_VERSION);
        assert_eq!(transfers[0].value, 0);
        assert_eq!(transfers[0].length, 4);
    }

    #[test]
    fn version_short_reply_is_error() {
        let dev = MockDevice::new();
        dev.short_reply.set(Some(2));
        assert!(command_set_version(&dev).is_err());
    }

    #[test]
    fn pattern_wraps_at_256() {
        let p = stream_pattern(300);
        assert_eq!(p.len(), 300);
        assert_eq!(p[0], 0);
        assert_eq!(p[255], 255);
        assert_eq!(p[256], 0);
        assert_eq!(p[299], 43);
    }

    #[test]
    fn clamp() {
        assert_eq!(clamp_stream_len(0), (0, false));
        assert_eq!(clamp_stream_len(512), (512, false));
        assert_eq!(clamp_stream_len(600), (512, true));
    }

    #[test]
    fn stream_clamps_before_transfer() {
        let dev = MockDevice::new();
        let outcome = stream_test(&dev, 600).unwrap();
        assert_eq!(
            outcome,
            StreamOutcome {
                requested: 512,
                written: 512
            }
        );
        assert_eq!(dev.transfers.borrow()[0].length, 512);
        assert_eq!(*dev.stream.borrow(), stream_pattern(512));
    }

    #[test]
    fn short_stream_write_is_not_an_error() {
        let dev = MockDevice::new();
        dev.stream_accept_limit.set(Some(100));
        let outcome = stream_test(&dev, 256).unwrap();
        assert_eq!(outcome.written, 100);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn stream_transport_error_is_fatal() {
        let dev = MockDevice::new();
        dev.fail_request.set(Some(VENDOR_CMD_STRM));
        assert!(matches!(
            stream_test(&dev, 16),
            Err(MdioctlError::Device(DeviceError::TransferFailed(_)))
        ));
    }
}
