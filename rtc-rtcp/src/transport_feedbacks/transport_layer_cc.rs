//! Transport-wide congestion control feedback (RFC draft
//! `draft-holmer-rmcat-transport-wide-cc-extensions`), FMT=15 under
//! `TransportSpecificFeedback`.
//!
//! The body lists, for a contiguous run of transport sequence numbers
//! starting at `base_sequence_number`, whether each packet arrived and (if
//! so) how long after the previous arrival, in 250 microsecond ticks. The
//! per-packet statuses are run-length- or bit-vector-encoded into 2-byte
//! chunks; the deltas that go with `received` statuses follow the chunk
//! list as a tightly packed byte stream.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, align4, require_remaining};

use super::{COMMON_FEEDBACK_LENGTH, CommonFeedback};
use crate::header::{self, Header, PacketType};
use crate::packet::Packet;

const BASE_LENGTH: usize = 8; // base seq(2) + count(2) + ref time(3) + fb count(1)
const TCC_FMT: u8 = 15;

/// The one- or two-bit symbol recorded per packet in a status chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTypeTcc {
    PacketNotReceived = 0,
    PacketReceivedSmallDelta = 1,
    PacketReceivedLargeDelta = 2,
    PacketReceivedWithoutDelta = 3,
}

impl SymbolTypeTcc {
    fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            0 => SymbolTypeTcc::PacketNotReceived,
            1 => SymbolTypeTcc::PacketReceivedSmallDelta,
            2 => SymbolTypeTcc::PacketReceivedLargeDelta,
            3 => SymbolTypeTcc::PacketReceivedWithoutDelta,
            _ => return Err(Error::OtherRtcpErr(format!("invalid tcc symbol {v}"))),
        })
    }
}

/// Whether a [`StatusVectorChunk`] packs one or two bits per symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSizeTypeTcc {
    OneBit,
    TwoBit,
}

/// The top bit of a chunk: run-length (0) or vector (1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChunkTypeTcc {
    RunLengthChunk,
    StatusVectorChunk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLengthChunk {
    pub type_tcc: StatusChunkTypeTcc,
    pub packet_status_symbol: SymbolTypeTcc,
    pub run_length: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusVectorChunk {
    pub type_tcc: StatusChunkTypeTcc,
    pub symbol_size: SymbolSizeTypeTcc,
    pub symbol_list: Vec<SymbolTypeTcc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketStatusChunk {
    RunLengthChunk(RunLengthChunk),
    StatusVectorChunk(StatusVectorChunk),
}

impl PacketStatusChunk {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<()> {
        let word: u16 = match self {
            PacketStatusChunk::RunLengthChunk(c) => {
                if c.run_length > 0x1FFF {
                    return Err(Error::OtherRtcpErr(format!(
                        "tcc run length {} exceeds 13 bits",
                        c.run_length
                    )));
                }
                ((c.packet_status_symbol as u16) << 13) | c.run_length
            }
            PacketStatusChunk::StatusVectorChunk(c) => {
                let (size_bit, symbol_bits, max_symbols) = match c.symbol_size {
                    SymbolSizeTypeTcc::OneBit => (0u16, 1u16, 14usize),
                    SymbolSizeTypeTcc::TwoBit => (1u16, 2u16, 7usize),
                };
                if c.symbol_list.len() > max_symbols {
                    return Err(Error::OtherRtcpErr(
                        "tcc status vector chunk overflows its symbol width".to_owned(),
                    ));
                }
                let mut bits = 0u16;
                for (i, symbol) in c.symbol_list.iter().enumerate() {
                    let shift = 14 - symbol_bits * (i as u16 + 1);
                    bits |= (*symbol as u16) << shift;
                }
                (1 << 15) | (size_bit << 14) | bits
            }
        };
        buf.put_u16(word);
        Ok(())
    }

    fn unmarshal<B: Buf>(buf: &mut B) -> Result<Self> {
        require_remaining(buf, 2, "tcc status chunk")?;
        let word = buf.get_u16();
        if word & 0x8000 == 0 {
            let symbol = SymbolTypeTcc::from_u8(((word >> 13) & 0x3) as u8)?;
            let run_length = word & 0x1FFF;
            Ok(PacketStatusChunk::RunLengthChunk(RunLengthChunk {
                type_tcc: StatusChunkTypeTcc::RunLengthChunk,
                packet_status_symbol: symbol,
                run_length,
            }))
        } else {
            let (symbol_size, symbol_bits, count) = if word & 0x4000 == 0 {
                (SymbolSizeTypeTcc::OneBit, 1u16, 14usize)
            } else {
                (SymbolSizeTypeTcc::TwoBit, 2u16, 7usize)
            };
            let bits = word & 0x3FFF;
            let mask = (1u16 << symbol_bits) - 1;
            let mut symbol_list = Vec::with_capacity(count);
            for i in 0..count {
                let shift = 14 - symbol_bits * (i as u16 + 1);
                let symbol = SymbolTypeTcc::from_u8((((bits >> shift) & mask) as u8).min(3))?;
                symbol_list.push(symbol);
            }
            Ok(PacketStatusChunk::StatusVectorChunk(StatusVectorChunk {
                type_tcc: StatusChunkTypeTcc::StatusVectorChunk,
                symbol_size,
                symbol_list,
            }))
        }
    }

    /// How many packet statuses this chunk accounts for.
    fn entry_count(&self) -> usize {
        match self {
            PacketStatusChunk::RunLengthChunk(c) => c.run_length as usize,
            PacketStatusChunk::StatusVectorChunk(c) => c.symbol_list.len(),
        }
    }
}

/// The receive-delta value tagged with the symbol that determines whether
/// it marshals as 1 or 2 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvDelta {
    pub type_tcc_packet: SymbolTypeTcc,
    /// Delta since the previous received packet, in 250 microsecond ticks
    /// scaled back up to microseconds (i.e. already multiplied by 250).
    pub delta: i64,
}

impl RecvDelta {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<()> {
        let ticks = self.delta / 250;
        match self.type_tcc_packet {
            SymbolTypeTcc::PacketReceivedSmallDelta => {
                if !(0..=255).contains(&ticks) {
                    return Err(Error::OtherRtcpErr("tcc small delta out of range".to_owned()));
                }
                buf.put_u8(ticks as u8);
            }
            SymbolTypeTcc::PacketReceivedLargeDelta => {
                if !(i16::MIN as i64..=i16::MAX as i64).contains(&ticks) {
                    return Err(Error::OtherRtcpErr("tcc large delta out of range".to_owned()));
                }
                buf.put_i16(ticks as i16);
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransportLayerCc {
    pub sender_ssrc: u32,
    pub media_ssrc: u32,
    pub base_sequence_number: u16,
    pub packet_status_count: u16,
    /// 24-bit field counted in 64ms units, wraps at 2^24.
    pub reference_time: u32,
    pub fb_pkt_count: u8,
    pub packet_chunks: Vec<PacketStatusChunk>,
    pub recv_deltas: Vec<RecvDelta>,
}

impl TransportLayerCc {
    pub(crate) fn unmarshal_body(_hdr: &Header, mut body: Bytes) -> Result<Self> {
        let common = CommonFeedback::unmarshal(&mut body)?;
        require_remaining(&body, BASE_LENGTH, "tcc base")?;
        let base_sequence_number = body.get_u16();
        let packet_status_count = body.get_u16();
        let reference_time = body.get_uint(3) as u32;
        let fb_pkt_count = body.get_u8();

        let mut packet_chunks = Vec::new();
        let mut remaining_entries = packet_status_count as usize;
        while remaining_entries > 0 {
            let chunk = PacketStatusChunk::unmarshal(&mut body)?;
            remaining_entries = remaining_entries.saturating_sub(chunk.entry_count());
            packet_chunks.push(chunk);
        }

        let mut recv_deltas = Vec::new();
        for chunk in &packet_chunks {
            let symbols: Vec<SymbolTypeTcc> = match chunk {
                PacketStatusChunk::RunLengthChunk(c) => {
                    vec![c.packet_status_symbol; c.run_length as usize]
                }
                PacketStatusChunk::StatusVectorChunk(c) => c.symbol_list.clone(),
            };
            for symbol in symbols {
                match symbol {
                    SymbolTypeTcc::PacketReceivedSmallDelta => {
                        require_remaining(&body, 1, "tcc small delta")?;
                        recv_deltas.push(RecvDelta {
                            type_tcc_packet: symbol,
                            delta: body.get_u8() as i64 * 250,
                        });
                    }
                    SymbolTypeTcc::PacketReceivedLargeDelta => {
                        require_remaining(&body, 2, "tcc large delta")?;
                        recv_deltas.push(RecvDelta {
                            type_tcc_packet: symbol,
                            delta: body.get_i16() as i64 * 250,
                        });
                    }
                    _ => {}
                }
            }
        }

        Ok(TransportLayerCc {
            sender_ssrc: common.sender_ssrc,
            media_ssrc: common.media_ssrc,
            base_sequence_number,
            packet_status_count,
            reference_time,
            fb_pkt_count,
            packet_chunks,
            recv_deltas,
        })
    }

    fn delta_bytes(&self) -> usize {
        self.recv_deltas
            .iter()
            .map(|d| match d.type_tcc_packet {
                SymbolTypeTcc::PacketReceivedSmallDelta => 1,
                SymbolTypeTcc::PacketReceivedLargeDelta => 2,
                _ => 0,
            })
            .sum()
    }
}

impl MarshalSize for TransportLayerCc {
    fn marshal_size(&self) -> usize {
        let unpadded = COMMON_FEEDBACK_LENGTH
            + BASE_LENGTH
            + self.packet_chunks.len() * 2
            + self.delta_bytes();
        header::HEADER_LENGTH + align4(unpadded)
    }
}

impl Marshal for TransportLayerCc {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let unpadded = COMMON_FEEDBACK_LENGTH
            + BASE_LENGTH
            + self.packet_chunks.len() * 2
            + self.delta_bytes();
        let padded = align4(unpadded);
        let hdr = Header {
            padding: false,
            count: TCC_FMT,
            packet_type_raw: PacketType::TransportSpecificFeedback.into(),
            length: (padded / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        CommonFeedback {
            sender_ssrc: self.sender_ssrc,
            media_ssrc: self.media_ssrc,
        }
        .marshal_to(buf);
        buf.put_u16(self.base_sequence_number);
        buf.put_u16(self.packet_status_count);
        buf.put_uint(self.reference_time as u64 & 0x00FF_FFFF, 3);
        buf.put_u8(self.fb_pkt_count);
        for chunk in &self.packet_chunks {
            chunk.marshal_to(buf)?;
        }
        for delta in &self.recv_deltas {
            delta.marshal_to(buf)?;
        }
        for _ in 0..(padded - unpadded) {
            buf.put_u8(0);
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for TransportLayerCc {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for TransportLayerCc {
    fn destination_ssrc(&self) -> Vec<u32> {
        vec![self.media_ssrc]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<TransportLayerCc>()
            .is_some_and(|o| o == self)
    }

    fn clone_packet(&self) -> Box<dyn Packet> {
        Box::new(self.clone())
    }
}
