//! Picture Loss Indication (RFC 4585 §6.3.1): asks the encoder for a keyframe.
//! Carries no FCI beyond the common sender/media SSRC pair.

use std::any::Any;

use bytes::{Buf, Bytes, BytesMut};
use shared::error::Result;
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

use super::{COMMON_FEEDBACK_LENGTH, CommonFeedback};
use crate::header::{self, Header, PacketType};
use crate::packet::Packet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PictureLossIndication {
    pub sender_ssrc: u32,
    pub media_ssrc: u32,
}

impl PictureLossIndication {
    pub(crate) fn unmarshal_body(_hdr: &Header, mut body: Bytes) -> Result<Self> {
        let common = CommonFeedback::unmarshal(&mut body)?;
        Ok(PictureLossIndication {
            sender_ssrc: common.sender_ssrc,
            media_ssrc: common.media_ssrc,
        })
    }
}

impl MarshalSize for PictureLossIndication {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH + COMMON_FEEDBACK_LENGTH
    }
}

impl Marshal for PictureLossIndication {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let hdr = Header {
            padding: false,
            count: 1, // FMT = PLI
            packet_type_raw: PacketType::PayloadSpecificFeedback.into(),
            length: (COMMON_FEEDBACK_LENGTH / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        CommonFeedback {
            sender_ssrc: self.sender_ssrc,
            media_ssrc: self.media_ssrc,
        }
        .marshal_to(buf);
        Ok(buf.len() - start)
    }
}

impl Unmarshal for PictureLossIndication {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for PictureLossIndication {
    fn destination_ssrc(&self) -> Vec<u32> {
        vec![self.media_ssrc]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<PictureLossIndication>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(*self)
    }
}
