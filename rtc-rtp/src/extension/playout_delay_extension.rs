//! Playout delay limits: two 12-bit values, in 10ms units, capped at 40.95s.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::require_remaining;

pub const PLAYOUT_DELAY_EXTENSION_SIZE: usize = 3;
/// 12 bits of 10ms units caps the representable delay at 40.95 seconds.
pub const MAX_PLAYOUT_DELAY_MS: u32 = 40_950;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayoutDelayExtension {
    pub min_delay_ms: u32,
    pub max_delay_ms: u32,
}

impl PlayoutDelayExtension {
    pub fn new(min_delay_ms: u32, max_delay_ms: u32) -> Result<Self> {
        if min_delay_ms > MAX_PLAYOUT_DELAY_MS || max_delay_ms > MAX_PLAYOUT_DELAY_MS {
            return Err(Error::OtherRtpErr(format!(
                "playout delay exceeds {MAX_PLAYOUT_DELAY_MS}ms"
            )));
        }
        if min_delay_ms > max_delay_ms {
            return Err(Error::OtherRtpErr(
                "playout delay min exceeds max".to_owned(),
            ));
        }
        Ok(Self {
            min_delay_ms,
            max_delay_ms,
        })
    }

    pub fn marshal(&self) -> Result<Bytes> {
        let min_units = (self.min_delay_ms / 10) & 0x0FFF;
        let max_units = (self.max_delay_ms / 10) & 0x0FFF;
        let mut buf = BytesMut::with_capacity(PLAYOUT_DELAY_EXTENSION_SIZE);
        buf.put_u8((min_units >> 4) as u8);
        buf.put_u8((((min_units & 0xF) << 4) | (max_units >> 8)) as u8);
        buf.put_u8((max_units & 0xFF) as u8);
        Ok(buf.freeze())
    }

    pub fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(buf, PLAYOUT_DELAY_EXTENSION_SIZE, "playout-delay extension")?;
        let b0 = buf.get_u8() as u32;
        let b1 = buf.get_u8() as u32;
        let b2 = buf.get_u8() as u32;
        let min_units = (b0 << 4) | (b1 >> 4);
        let max_units = ((b1 & 0xF) << 8) | b2;
        Ok(Self {
            min_delay_ms: min_units * 10,
            max_delay_ms: max_units * 10,
        })
    }
}
