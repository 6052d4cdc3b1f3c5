//! Transport-specific feedback packets (RFC 4585 §6.2, RFC 5104 §4.2):
//! generic NACK, TMMBR/TMMBN bandwidth bounds, and the transport-wide
//! congestion-control feedback report.

pub mod transport_layer_cc;
pub mod transport_layer_nack;

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use crate::header::{self, Header, PacketType};
use crate::packet::Packet;
use crate::payload_feedbacks::{COMMON_FEEDBACK_LENGTH, CommonFeedback};

const TMMB_ITEM_LENGTH: usize = 8;
const MAX_MANTISSA: u64 = 0x1_FFFF; // 17 bits
const MAX_OVERHEAD: u16 = 0x1FF; // 9 bits

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TmmbItem {
    pub ssrc: u32,
    pub bitrate_bps: u64,
    pub packet_overhead: u16,
}

impl TmmbItem {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<()> {
        if self.packet_overhead > MAX_OVERHEAD {
            return Err(Error::OtherRtcpErr(format!(
                "tmmb item overhead {} exceeds {MAX_OVERHEAD}",
                self.packet_overhead
            )));
        }
        let mut mantissa = self.bitrate_bps;
        let mut exponent = 0u32;
        while mantissa > MAX_MANTISSA {
            mantissa >>= 1;
            exponent += 1;
        }
        buf.put_u32(self.ssrc);
        let compact = (exponent << 26) | ((mantissa as u32) << 9) | self.packet_overhead as u32;
        buf.put_u32(compact);
        Ok(())
    }

    fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(buf, TMMB_ITEM_LENGTH, "tmmb item")?;
        let ssrc = buf.get_u32();
        let compact = buf.get_u32();
        let exponent = compact >> 26;
        let mantissa = ((compact >> 9) & 0x1_FFFF) as u64;
        let packet_overhead = (compact & 0x1FF) as u16;
        let bitrate_bps = mantissa << exponent;
        if (bitrate_bps >> exponent) != mantissa {
            return Err(Error::OtherRtcpErr(
                "tmmb item mantissa shift overflows 64 bits".to_owned(),
            ));
        }
        Ok(TmmbItem {
            ssrc,
            bitrate_bps,
            packet_overhead,
        })
    }
}

macro_rules! tmmb_packet {
    ($name:ident, $fmt:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        pub struct $name {
            pub sender_ssrc: u32,
            pub items: Vec<TmmbItem>,
        }

        impl $name {
            pub(crate) fn unmarshal_body(_hdr: &Header, mut body: Bytes) -> Result<Self> {
                let common = CommonFeedback::unmarshal(&mut body)?;
                if body.remaining() % TMMB_ITEM_LENGTH != 0 {
                    return Err(Error::OtherRtcpErr(concat!(
                        stringify!($name),
                        " item length not a multiple of 8"
                    )
                    .to_owned()));
                }
                let mut items = Vec::with_capacity(body.remaining() / TMMB_ITEM_LENGTH);
                while body.has_remaining() {
                    items.push(TmmbItem::unmarshal(&mut body)?);
                }
                Ok($name {
                    sender_ssrc: common.sender_ssrc,
                    items,
                })
            }
        }

        impl MarshalSize for $name {
            fn marshal_size(&self) -> usize {
                header::HEADER_LENGTH + COMMON_FEEDBACK_LENGTH + self.items.len() * TMMB_ITEM_LENGTH
            }
        }

        impl Marshal for $name {
            fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
                let body_len = COMMON_FEEDBACK_LENGTH + self.items.len() * TMMB_ITEM_LENGTH;
                let hdr = Header {
                    padding: false,
                    count: $fmt,
                    packet_type_raw: PacketType::TransportSpecificFeedback.into(),
                    length: (body_len / 4) as u16,
                };
                let start = buf.len();
                hdr.marshal_to(buf)?;
                CommonFeedback {
                    sender_ssrc: self.sender_ssrc,
                    media_ssrc: 0,
                }
                .marshal_to(buf);
                for item in &self.items {
                    item.marshal_to(buf)?;
                }
                Ok(buf.len() - start)
            }
        }

        impl Unmarshal for $name {
            fn unmarshal<B>(buf: &mut B) -> Result<Self>
            where
                B: Buf,
            {
                let hdr = Header::unmarshal(buf)?;
                let body = buf.copy_to_bytes((hdr.length as usize) * 4);
                Self::unmarshal_body(&hdr, body)
            }
        }

        impl Packet for $name {
            fn destination_ssrc(&self) -> Vec<u32> {
                self.items.iter().map(|i| i.ssrc).collect()
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn equal(&self, other: &dyn Packet) -> bool {
                other
                    .as_any()
                    .downcast_ref::<$name>()
                    .is_some_and(|o| o == self)
            }

            fn clone_packet(&self) -> Box<dyn Packet> {
                Box::new(self.clone())
            }
        }
    };
}

tmmb_packet!(Tmmbr, 3);
tmmb_packet!(Tmmbn, 4);
