//! Transport-wide congestion control sequence number (one URN, 2-byte body).

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::Result;
use shared::marshal::require_remaining;

pub const TRANSPORT_CC_EXTENSION_SIZE: usize = 2;

pub const TRANSPORT_CC_URI: &str =
    "http://www.ietf.org/id/draft-holmer-rmcat-transport-wide-cc-extensions-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportCcExtension {
    pub transport_sequence: u16,
}

impl TransportCcExtension {
    pub fn marshal(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(TRANSPORT_CC_EXTENSION_SIZE);
        buf.put_u16(self.transport_sequence);
        Ok(buf.freeze())
    }

    pub fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(buf, TRANSPORT_CC_EXTENSION_SIZE, "transport-cc extension")?;
        Ok(Self {
            transport_sequence: buf.get_u16(),
        })
    }
}
