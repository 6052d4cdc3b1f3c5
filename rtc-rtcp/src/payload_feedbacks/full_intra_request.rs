//! Full Intra Request (RFC 5104 §4.3.1): like PLI but carries one FCI entry
//! per media source, each with its own sequence number so repeated requests
//! for the same source can be told apart.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use super::{COMMON_FEEDBACK_LENGTH, CommonFeedback};
use crate::header::{self, Header, PacketType};
use crate::packet::Packet;

const FCI_ITEM_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirEntry {
    pub ssrc: u32,
    pub sequence_number: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FullIntraRequest {
    pub sender_ssrc: u32,
    pub entries: Vec<FirEntry>,
}

impl FullIntraRequest {
    pub(crate) fn unmarshal_body(_hdr: &Header, mut body: Bytes) -> Result<Self> {
        let common = CommonFeedback::unmarshal(&mut body)?;
        if body.remaining() % FCI_ITEM_SIZE != 0 {
            return Err(Error::OtherRtcpErr(
                "full intra request FCI length is not a multiple of 8".to_owned(),
            ));
        }
        let mut entries = Vec::with_capacity(body.remaining() / FCI_ITEM_SIZE);
        while body.has_remaining() {
            require_remaining(&body, FCI_ITEM_SIZE, "fir fci entry")?;
            let ssrc = body.get_u32();
            let sequence_number = body.get_u8();
            body.advance(3); // reserved
            entries.push(FirEntry {
                ssrc,
                sequence_number,
            });
        }
        Ok(FullIntraRequest {
            sender_ssrc: common.sender_ssrc,
            entries,
        })
    }
}

impl MarshalSize for FullIntraRequest {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH + COMMON_FEEDBACK_LENGTH + self.entries.len() * FCI_ITEM_SIZE
    }
}

impl Marshal for FullIntraRequest {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        if self.entries.is_empty() {
            return Err(Error::OtherRtcpErr(
                "full intra request requires at least one entry".to_owned(),
            ));
        }
        let body_len = COMMON_FEEDBACK_LENGTH + self.entries.len() * FCI_ITEM_SIZE;
        let hdr = Header {
            padding: false,
            count: 4, // FMT = FIR
            packet_type_raw: PacketType::PayloadSpecificFeedback.into(),
            length: (body_len / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        CommonFeedback {
            sender_ssrc: self.sender_ssrc,
            media_ssrc: 0,
        }
        .marshal_to(buf);
        for entry in &self.entries {
            buf.put_u32(entry.ssrc);
            buf.put_u8(entry.sequence_number);
            buf.put_slice(&[0, 0, 0]);
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for FullIntraRequest {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for FullIntraRequest {
    fn destination_ssrc(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.ssrc).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<FullIntraRequest>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}
