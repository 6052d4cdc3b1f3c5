//! Loss Notification (AFB, FMT=15, 'LNTF' identifier): tells a sender which
//! frame a decoder last managed to decode and whether it can still recover
//! without a keyframe.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use super::{COMMON_FEEDBACK_LENGTH, CommonFeedback};
use crate::header::{self, Header, PacketType};
use crate::packet::Packet;

const UNIQUE_IDENTIFIER: u32 = 0x4C4E_5446; // 'L' 'N' 'T' 'F'
const PAYLOAD_LENGTH: usize = 8;
/// The max gap representable in the 15-bit (last_received - last_decoded) field.
pub const MAX_GAP: u16 = 0x7FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LossNotification {
    pub sender_ssrc: u32,
    pub media_ssrc: u32,
    pub last_decoded: u16,
    pub last_received: u16,
    pub decodable: bool,
}

impl LossNotification {
    pub fn new(
        sender_ssrc: u32,
        media_ssrc: u32,
        last_decoded: u16,
        last_received: u16,
        decodable: bool,
    ) -> Result<Self> {
        let gap = last_received.wrapping_sub(last_decoded);
        if gap > MAX_GAP {
            return Err(Error::OtherRtcpErr(format!(
                "loss notification gap {gap} exceeds {MAX_GAP}"
            )));
        }
        Ok(Self {
            sender_ssrc,
            media_ssrc,
            last_decoded,
            last_received,
            decodable,
        })
    }

    pub(crate) fn unmarshal_body(_hdr: &Header, mut body: Bytes) -> Result<Self> {
        let common = CommonFeedback::unmarshal(&mut body)?;
        require_remaining(&body, PAYLOAD_LENGTH, "loss notification")?;
        let identifier = body.get_u32();
        if identifier != UNIQUE_IDENTIFIER {
            return Err(Error::OtherRtcpErr(
                "loss notification unique identifier mismatch".to_owned(),
            ));
        }
        let last_decoded = body.get_u16();
        let delta_and_decodability = body.get_u16();
        let last_received = last_decoded.wrapping_add(delta_and_decodability >> 1);
        let decodable = delta_and_decodability & 0x1 != 0;
        Ok(LossNotification {
            sender_ssrc: common.sender_ssrc,
            media_ssrc: common.media_ssrc,
            last_decoded,
            last_received,
            decodable,
        })
    }
}

impl MarshalSize for LossNotification {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH + COMMON_FEEDBACK_LENGTH + PAYLOAD_LENGTH
    }
}

impl Marshal for LossNotification {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let gap = self.last_received.wrapping_sub(self.last_decoded);
        if gap > MAX_GAP {
            return Err(Error::OtherRtcpErr(format!(
                "loss notification gap {gap} exceeds {MAX_GAP}"
            )));
        }
        let body_len = COMMON_FEEDBACK_LENGTH + PAYLOAD_LENGTH;
        let hdr = Header {
            padding: false,
            count: 15, // FMT = AFB
            packet_type_raw: PacketType::PayloadSpecificFeedback.into(),
            length: (body_len / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        CommonFeedback {
            sender_ssrc: self.sender_ssrc,
            media_ssrc: self.media_ssrc,
        }
        .marshal_to(buf);
        buf.put_u32(UNIQUE_IDENTIFIER);
        buf.put_u16(self.last_decoded);
        let delta_and_decodability = (gap << 1) | (self.decodable as u16);
        buf.put_u16(delta_and_decodability);
        Ok(buf.len() - start)
    }
}

impl Unmarshal for LossNotification {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for LossNotification {
    fn destination_ssrc(&self) -> Vec<u32> {
        vec![self.media_ssrc]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<LossNotification>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_notification_round_trip() {
        let ln = LossNotification::new(1, 2, 100, 105, true).unwrap();
        let raw = ln.marshal().unwrap();
        let mut buf = raw.clone();
        assert_eq!(ln, LossNotification::unmarshal(&mut buf).unwrap());
    }

    #[test]
    fn test_loss_notification_rejects_too_large_gap() {
        assert!(LossNotification::new(1, 2, 0, MAX_GAP + 1, false).is_err());
    }
}
