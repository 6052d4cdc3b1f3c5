//! Goodbye (RFC 3550 §6.6): announces that one or more SSRC/CSRC sources are
//! leaving the session, with an optional human-readable reason.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, align4, require_remaining};

use crate::header::{self, Header, PacketType, get_padding, put_padding};
use crate::packet::Packet;

pub const MAX_SOURCES: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Goodbye {
    pub sources: Vec<u32>,
    pub reason: String,
}

impl Goodbye {
    pub(crate) fn unmarshal_body(hdr: &Header, mut body: Bytes) -> Result<Self> {
        require_remaining(&body, hdr.count as usize * 4, "goodbye sources")?;
        let mut sources = Vec::with_capacity(hdr.count as usize);
        for _ in 0..hdr.count {
            sources.push(body.get_u32());
        }

        if hdr.padding {
            let pad_len = get_padding(body.len(), &body)?;
            body.truncate(body.len() - pad_len);
        }

        let reason = if body.has_remaining() {
            let len = body.get_u8() as usize;
            require_remaining(&body, len, "goodbye reason")?;
            let raw = body.copy_to_bytes(len);
            String::from_utf8(raw.to_vec())
                .map_err(|e| Error::OtherRtcpErr(format!("goodbye reason not utf8: {e}")))?
        } else {
            String::new()
        };

        Ok(Goodbye { sources, reason })
    }
}

impl MarshalSize for Goodbye {
    fn marshal_size(&self) -> usize {
        let reason_block = if self.reason.is_empty() {
            0
        } else {
            align4(1 + self.reason.len())
        };
        header::HEADER_LENGTH + self.sources.len() * 4 + reason_block
    }
}

impl Marshal for Goodbye {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        if self.sources.len() > MAX_SOURCES {
            return Err(Error::OtherRtcpErr(format!(
                "goodbye carries more than {MAX_SOURCES} sources"
            )));
        }
        let reason_len = if self.reason.is_empty() {
            0
        } else {
            align4(1 + self.reason.len())
        };
        let body_len = self.sources.len() * 4 + reason_len;
        let hdr = Header {
            padding: false,
            count: self.sources.len() as u8,
            packet_type_raw: PacketType::Goodbye.into(),
            length: (body_len / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        for ssrc in &self.sources {
            buf.put_u32(*ssrc);
        }
        if !self.reason.is_empty() {
            let item_start = buf.len();
            buf.put_u8(self.reason.len() as u8);
            buf.put_slice(self.reason.as_bytes());
            put_padding(buf, reason_len - (buf.len() - item_start));
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for Goodbye {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for Goodbye {
    fn destination_ssrc(&self) -> Vec<u32> {
        self.sources.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<Goodbye>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}
