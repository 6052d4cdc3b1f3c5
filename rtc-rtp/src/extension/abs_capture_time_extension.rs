//! Absolute capture time: a 64-bit NTP capture timestamp, plus an optional
//! 64-bit signed estimated capture clock offset when the extension carries
//! the longer form.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::Result;
use shared::marshal::require_remaining;

pub const ABS_CAPTURE_TIME_EXTENSION_SIZE: usize = 8;
pub const ABS_CAPTURE_TIME_EXTENSION_SIZE_WITH_OFFSET: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbsCaptureTimeExtension {
    /// 64-bit NTP timestamp of when the first frame in this packet was captured.
    pub absolute_capture_timestamp: u64,
    /// Estimated offset between the capture device's clock and the sender's
    /// own clock, present only on the first packet of a talk spurt.
    pub estimated_capture_clock_offset: Option<i64>,
}

impl AbsCaptureTimeExtension {
    pub fn marshal(&self) -> Result<Bytes> {
        let size = if self.estimated_capture_clock_offset.is_some() {
            ABS_CAPTURE_TIME_EXTENSION_SIZE_WITH_OFFSET
        } else {
            ABS_CAPTURE_TIME_EXTENSION_SIZE
        };
        let mut buf = BytesMut::with_capacity(size);
        buf.put_u64(self.absolute_capture_timestamp);
        if let Some(offset) = self.estimated_capture_clock_offset {
            buf.put_i64(offset);
        }
        Ok(buf.freeze())
    }

    pub fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(buf, ABS_CAPTURE_TIME_EXTENSION_SIZE, "abs-capture-time extension")?;
        let absolute_capture_timestamp = buf.get_u64();
        let estimated_capture_clock_offset = if buf.remaining() >= 8 {
            Some(buf.get_i64())
        } else {
            None
        };
        Ok(Self {
            absolute_capture_timestamp,
            estimated_capture_clock_offset,
        })
    }
}
