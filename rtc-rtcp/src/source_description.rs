//! Source Description (RFC 3550 §6.5): per-source SDES items, most commonly
//! the mandatory CNAME identifying a participant across all its streams.

use std::any::Any;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, require_remaining};

use crate::header::{self, Header, PacketType, get_padding};
use crate::packet::Packet;

pub const MAX_CHUNKS: usize = 31;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SdesItemType {
    Cname,
    Name,
    Email,
    Phone,
    Location,
    Tool,
    Note,
    Priv,
    Unsupported(u8),
}

impl From<u8> for SdesItemType {
    fn from(b: u8) -> Self {
        match b {
            1 => SdesItemType::Cname,
            2 => SdesItemType::Name,
            3 => SdesItemType::Email,
            4 => SdesItemType::Phone,
            5 => SdesItemType::Location,
            6 => SdesItemType::Tool,
            7 => SdesItemType::Note,
            8 => SdesItemType::Priv,
            other => SdesItemType::Unsupported(other),
        }
    }
}

impl From<SdesItemType> for u8 {
    fn from(t: SdesItemType) -> u8 {
        match t {
            SdesItemType::Cname => 1,
            SdesItemType::Name => 2,
            SdesItemType::Email => 3,
            SdesItemType::Phone => 4,
            SdesItemType::Location => 5,
            SdesItemType::Tool => 6,
            SdesItemType::Note => 7,
            SdesItemType::Priv => 8,
            SdesItemType::Unsupported(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdesItem {
    pub sdes_type: SdesItemType,
    pub text: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SdesChunk {
    pub ssrc: u32,
    pub items: Vec<SdesItem>,
}

impl SdesChunk {
    pub fn cname(&self) -> Option<&Bytes> {
        self.items
            .iter()
            .find(|i| i.sdes_type == SdesItemType::Cname)
            .map(|i| &i.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceDescription {
    pub chunks: Vec<SdesChunk>,
}

fn marshal_chunk(buf: &mut BytesMut, chunk: &SdesChunk) {
    let start = buf.len();
    buf.put_u32(chunk.ssrc);
    for item in &chunk.items {
        buf.put_u8(item.sdes_type.into());
        buf.put_u8(item.text.len() as u8);
        buf.put_slice(&item.text);
    }
    buf.put_u8(0);
    while (buf.len() - start) % 4 != 0 {
        buf.put_u8(0);
    }
}

fn chunk_size(chunk: &SdesChunk) -> usize {
    let mut n = 4 + 1; // ssrc + terminating null
    for item in &chunk.items {
        n += 2 + item.text.len();
    }
    n.div_ceil(4) * 4
}

fn unmarshal_chunk(body: &mut Bytes) -> Result<Option<SdesChunk>> {
    require_remaining(body, 4, "sdes chunk ssrc")?;
    let start_remaining = body.remaining();
    let ssrc = body.get_u32();
    let mut items = Vec::new();
    loop {
        require_remaining(body, 1, "sdes item type")?;
        let item_type = body.get_u8();
        if item_type == 0 {
            break;
        }
        require_remaining(body, 1, "sdes item length")?;
        let len = body.get_u8() as usize;
        require_remaining(body, len, "sdes item text")?;
        let text = body.copy_to_bytes(len);
        items.push(SdesItem {
            sdes_type: item_type.into(),
            text,
        });
    }
    let consumed = start_remaining - body.remaining();
    let pad = consumed.div_ceil(4) * 4 - consumed;
    require_remaining(body, pad, "sdes chunk padding")?;
    body.advance(pad);

    let retained = items
        .iter()
        .any(|i| i.sdes_type == SdesItemType::Cname);
    if retained {
        Ok(Some(SdesChunk { ssrc, items }))
    } else {
        Ok(None)
    }
}

impl SourceDescription {
    pub(crate) fn unmarshal_body(hdr: &Header, mut body: Bytes) -> Result<Self> {
        let mut chunks = Vec::with_capacity(hdr.count as usize);
        for _ in 0..hdr.count {
            if let Some(chunk) = unmarshal_chunk(&mut body)? {
                chunks.push(chunk);
            }
        }
        if hdr.padding {
            get_padding(body.len(), &body)?;
        }
        Ok(SourceDescription { chunks })
    }
}

impl MarshalSize for SourceDescription {
    fn marshal_size(&self) -> usize {
        header::HEADER_LENGTH + self.chunks.iter().map(chunk_size).sum::<usize>()
    }
}

impl Marshal for SourceDescription {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        if self.chunks.len() > MAX_CHUNKS {
            return Err(Error::OtherRtcpErr(format!(
                "source description carries more than {MAX_CHUNKS} chunks"
            )));
        }
        let body_len: usize = self.chunks.iter().map(chunk_size).sum();
        let hdr = Header {
            padding: false,
            count: self.chunks.len() as u8,
            packet_type_raw: PacketType::SourceDescription.into(),
            length: (body_len / 4) as u16,
        };
        let start = buf.len();
        hdr.marshal_to(buf)?;
        for chunk in &self.chunks {
            marshal_chunk(buf, chunk);
        }
        Ok(buf.len() - start)
    }
}

impl Unmarshal for SourceDescription {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let hdr = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes((hdr.length as usize) * 4);
        Self::unmarshal_body(&hdr, body)
    }
}

impl Packet for SourceDescription {
    fn destination_ssrc(&self) -> Vec<u32> {
        self.chunks.iter().map(|c| c.ssrc).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equal(&self, other: &dyn Packet) -> bool {
        other
            .as_any()
            .downcast_ref::<SourceDescription>()
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
    fn test_source_description_round_trip() {
        let sdes = SourceDescription {
            chunks: vec![SdesChunk {
                ssrc: 0x1234,
                items: vec![SdesItem {
                    sdes_type: SdesItemType::Cname,
                    text: Bytes::from_static(b"user@example.com"),
                }],
            }],
        };
        let raw = sdes.marshal().unwrap();
        let mut buf = raw.clone();
        assert_eq!(sdes, SourceDescription::unmarshal(&mut buf).unwrap());
    }

    #[test]
    fn test_source_description_drops_chunk_without_cname() {
        let sdes = SourceDescription {
            chunks: vec![SdesChunk {
                ssrc: 0x1234,
                items: vec![SdesItem {
                    sdes_type: SdesItemType::Tool,
                    text: Bytes::from_static(b"encoder"),
                }],
            }],
        };
        let raw = sdes.marshal().unwrap();
        let mut buf = raw.clone();
        let parsed = SourceDescription::unmarshal(&mut buf).unwrap();
        assert!(parsed.chunks.is_empty());
    }
}
