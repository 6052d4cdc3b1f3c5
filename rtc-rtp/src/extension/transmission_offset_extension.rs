//! Transmission time offset: a signed 24-bit delta (in RTP timestamp units)
//! between capture and transmission, used for send-side delay-based
//! bandwidth estimation.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::Result;
use shared::marshal::require_remaining;

pub const TRANSMISSION_OFFSET_EXTENSION_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransmissionOffsetExtension {
    /// Signed 24-bit offset, sign-extended into an i32.
    pub transmission_offset: i32,
}

impl TransmissionOffsetExtension {
    pub fn marshal(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(TRANSMISSION_OFFSET_EXTENSION_SIZE);
        let raw = (self.transmission_offset as u32) & 0x00FF_FFFF;
        buf.put_uint(raw as u64, TRANSMISSION_OFFSET_EXTENSION_SIZE);
        Ok(buf.freeze())
    }

    pub fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(
            buf,
            TRANSMISSION_OFFSET_EXTENSION_SIZE,
            "transmission-offset extension",
        )?;
        let raw = buf.get_uint(TRANSMISSION_OFFSET_EXTENSION_SIZE) as u32;
        let sign_extended = if raw & 0x0080_0000 != 0 {
            (raw | 0xFF00_0000) as i32
        } else {
            raw as i32
        };
        Ok(Self {
            transmission_offset: sign_extended,
        })
    }
}
