//! Generic NACK (RFC 4585 §6.2.1): each FCI entry names a lost packet id plus
//! a 16-bit bitmask of up to 16 further losses immediately following it.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use crate::header::{self, Header, PacketType};
use crate::packet::Packet;
use crate::payload_feedbacks::{COMMON_FEEDBACK_LENGTH, CommonFeedback};

const NACK_PAIR_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NackPair {
    pub packet_id: u16,
    /// Bit `n` (0-indexed) set means `packet_id + n + 1` is also lost.
    pub lost_packets: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportLayerNack {
    pub sender_ssrc: u32,
    pub media_ssrc: u32,
    pub nacks: Vec<NackPair>,
}

/// Packs a sorted list of missing sequence numbers into the minimal set of
/// `NackPair`s, each covering its packet id plus up to the next 16 losses.
pub fn nack_pairs_from_sequence_numbers(missing: &[u16]) -> Vec<NackPair> {
    let mut pairs = Vec::new();
    let mut it = missing.iter().peekable();
    while let Some(&first) = it.next() {
        let mut lost_packets = 0u16;
        while let Some(&&next) = it.peek() {
            let shift = next.wrapping_sub(first).wrapping_sub(1);
            if shift <= 15 {
                lost_packets |= 1 << shift;
                it.next();
            } else {
                break;
            }
        }
        pairs.push(NackPair {
            packet_id: first,
            lost_packets,
        });
    }
    pairs
}

impl TransportLayerNack {
    pub(crate) fn unmarshal_body(_hdr: &Header, mut body: Bytes) -> Result<Self> {
        let common = CommonFeedback::unmarshal(&mut body)?;
        if body.remaining() % NACK_PAIR_LENGTH != 0 {
            return Err(Error::OtherRtcpErr(
                "nack fci length not a multiple of 4".to_owned(),
            ));
        }
        let mut nacks = Vec::with_capacity(body.remaining() / NACK_PAIR_LENGTH);
        while body.has_remaining() {
            require_remaining(&body, NACK_PAIR_LENGTH, "nack pair")?;
            nacks.push(NackPair {
                packet_id: body.get_u16(),
                lost_packets: body.get_u16(),
            });
        }
        Ok(TransportLayerNack {
            sender_ssrc: common.sender_ssrc,
            media_ssrc: common.media_ssrc,
            nacks,
        })
    }
}

impl MarshalSize for TransportLayerNack {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH + COMMON_FEEDBACK_LENGTH + self.nacks.len() * NACK_PAIR_LENGTH
    }
}

impl Marshal for TransportLayerNack {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        if self.nacks.is_empty() {
            return Err(Error::OtherRtcpErr(
                "transport layer nack requires at least one pair".to_owned(),
            ));
        }
        let body_len = COMMON_FEEDBACK_LENGTH + self.nacks.len() * NACK_PAIR_LENGTH;
        let hdr = Header {
            padding: false,
            count: 1, // FMT = generic NACK
            packet_type_raw: PacketType::TransportSpecificFeedback.into(),
            length: (body_len / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        CommonFeedback {
            sender_ssrc: self.sender_ssrc,
            media_ssrc: self.media_ssrc,
        }
        .marshal_to(buf);
        for pair in &self.nacks {
            buf.put_u16(pair.packet_id);
            buf.put_u16(pair.lost_packets);
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for TransportLayerNack {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for TransportLayerNack {
    fn destination_ssrc(&self) -> Vec<u32> {
        vec![self.media_ssrc]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<TransportLayerNack>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}
