//! Receiver Estimated Maximum Bitrate (draft-alvestrand-rmcat-remb-03), sent
//! as an application-layer feedback (AFB, FMT=15) message tagged with the
//! 'REMB' identifier.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use super::{COMMON_FEEDBACK_LENGTH, CommonFeedback};
use crate::header::{self, Header, PacketType};
use crate::packet::Packet;

const UNIQUE_IDENTIFIER: u32 = 0x5245_4D42; // 'R' 'E' 'M' 'B'
const REMB_BASE_LENGTH: usize = 8;
const MAX_MANTISSA: u64 = 0x3_FFFF; // 18 bits

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceiverEstimatedMaximumBitrate {
    pub sender_ssrc: u32,
    pub bitrate_bps: u64,
    pub ssrcs: Vec<u32>,
}

impl ReceiverEstimatedMaximumBitrate {
    pub(crate) fn unmarshal_body(_hdr: &Header, mut body: Bytes) -> Result<Self> {
        let common = CommonFeedback::unmarshal(&mut body)?;
        require_remaining(&body, REMB_BASE_LENGTH, "remb base")?;
        let identifier = body.get_u32();
        if identifier != UNIQUE_IDENTIFIER {
            return Err(Error::OtherRtcpErr(
                "remb unique identifier mismatch".to_owned(),
            ));
        }
        let num_ssrcs = body.get_u8() as usize;
        let b1 = body.get_u8();
        let b2 = body.get_u16();
        let exponent = b1 >> 2;
        let mantissa = (((b1 & 0x03) as u64) << 16) | b2 as u64;
        let bitrate_bps = mantissa << exponent;

        require_remaining(&body, num_ssrcs * 4, "remb ssrc list")?;
        let mut ssrcs = Vec::with_capacity(num_ssrcs);
        for _ in 0..num_ssrcs {
            ssrcs.push(body.get_u32());
        }

        Ok(ReceiverEstimatedMaximumBitrate {
            sender_ssrc: common.sender_ssrc,
            bitrate_bps,
            ssrcs,
        })
    }
}

impl MarshalSize for ReceiverEstimatedMaximumBitrate {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH
            + COMMON_FEEDBACK_LENGTH
            + REMB_BASE_LENGTH
            + self.ssrcs.len() * 4
    }
}

impl Marshal for ReceiverEstimatedMaximumBitrate {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        if self.ssrcs.len() > 0xFF {
            return Err(Error::OtherRtcpErr(
                "remb carries more than 255 ssrcs".to_owned(),
            ));
        }
        let body_len = COMMON_FEEDBACK_LENGTH + REMB_BASE_LENGTH + self.ssrcs.len() * 4;
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
            media_ssrc: 0,
        }
        .marshal_to(buf);

        buf.put_u32(UNIQUE_IDENTIFIER);
        let mut mantissa = self.bitrate_bps;
        let mut exponent = 0u8;
        while mantissa > MAX_MANTISSA {
            mantissa >>= 1;
            exponent += 1;
        }
        buf.put_u8(self.ssrcs.len() as u8);
        buf.put_u8((exponent << 2) | ((mantissa >> 16) as u8));
        buf.put_u16((mantissa & 0xFFFF) as u16);
        for ssrc in &self.ssrcs {
            buf.put_u32(*ssrc);
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for ReceiverEstimatedMaximumBitrate {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for ReceiverEstimatedMaximumBitrate {
    fn destination_ssrc(&self) -> Vec<u32> {
        self.ssrcs.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<ReceiverEstimatedMaximumBitrate>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remb_round_trip() {
        let remb = ReceiverEstimatedMaximumBitrate {
            sender_ssrc: 1,
            bitrate_bps: 2_500_000,
            ssrcs: vec![10, 20],
        };
        let raw = remb.marshal().unwrap();
        let mut buf = raw.clone();
        assert_eq!(remb, ReceiverEstimatedMaximumBitrate::unmarshal(&mut buf).unwrap());
    }

    #[test]
    fn test_remb_rejects_wrong_identifier() {
        let hdr = Header {
            padding: false,
            count: 15,
            packet_type_raw: PacketType::PayloadSpecificFeedback.into(),
            length: 5,
        };
        let mut body = BytesMut::new();
        CommonFeedback::default().marshal_to(&mut body);
        body.put_u32(0xDEAD_BEEF);
        body.put_u32(0);
        assert!(ReceiverEstimatedMaximumBitrate::unmarshal_body(&hdr, body.freeze()).is_err());
    }
}
