//! Absolute send time (the 3-byte, 6.18 fixed-point seconds since epoch,
//! top 24 bits of a 32-bit compact NTP timestamp) used by REMB-style
//! send-side bandwidth estimation.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::require_remaining;
use std::time::{SystemTime, UNIX_EPOCH};

pub const ABS_SEND_TIME_EXTENSION_SIZE: usize = 3;

/// Converts a wall-clock time to a 64-bit NTP timestamp (seconds since
/// 1900-01-01 in the high 32 bits, binary fraction in the low 32).
pub fn unix2ntp(t: SystemTime) -> u64 {
    let since_epoch = t.duration_since(UNIX_EPOCH).unwrap_or_default();
    let seconds = since_epoch.as_secs().wrapping_add(0x83AA_7E80);
    let frac = ((since_epoch.subsec_nanos() as u64) << 32) / 1_000_000_000;
    (seconds << 32) | frac
}

/// Inverse of [`unix2ntp`].
pub fn ntp2unix(ntp: u64) -> SystemTime {
    let seconds = (ntp >> 32).wrapping_sub(0x83AA_7E80);
    let frac = ntp & 0xFFFF_FFFF;
    let nanos = (frac * 1_000_000_000) >> 32;
    UNIX_EPOCH + std::time::Duration::new(seconds, nanos as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbsSendTimeExtension {
    /// The top 24 bits of a 64-bit NTP timestamp.
    pub timestamp: u64,
}

impl AbsSendTimeExtension {
    pub fn new(send_time: SystemTime) -> Self {
        Self {
            timestamp: unix2ntp(send_time) >> 14,
        }
    }

    pub fn marshal(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(ABS_SEND_TIME_EXTENSION_SIZE);
        buf.put_uint(self.timestamp & 0x00FF_FFFF, ABS_SEND_TIME_EXTENSION_SIZE);
        Ok(buf.freeze())
    }

    pub fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(buf, ABS_SEND_TIME_EXTENSION_SIZE, "abs-send-time extension")?;
        let timestamp = buf.get_uint(ABS_SEND_TIME_EXTENSION_SIZE);
        Ok(Self { timestamp })
    }

    pub fn estimate(&self, receive_time: SystemTime) -> SystemTime {
        let receive_ntp = unix2ntp(receive_time);
        let receive_high = (receive_ntp >> 14) & !0x00FF_FFFF;
        ntp2unix((receive_high | self.timestamp) << 14)
    }
}

impl TryFrom<Bytes> for AbsSendTimeExtension {
    type Error = Error;

    fn try_from(mut value: Bytes) -> Result<Self> {
        AbsSendTimeExtension::unmarshal(&mut value)
    }
}
