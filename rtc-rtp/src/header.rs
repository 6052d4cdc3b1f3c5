//! RTP header: fixed fields, CSRC list, and one-byte/two-byte extensions.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal, align4, require_remaining};

pub(crate) const HEADER_LENGTH: usize = 4;
pub(crate) const VERSION_SHIFT: u8 = 6;
pub(crate) const VERSION_MASK: u8 = 0x3;
pub(crate) const PADDING_SHIFT: u8 = 5;
pub(crate) const PADDING_MASK: u8 = 0x1;
pub(crate) const EXTENSION_SHIFT: u8 = 4;
pub(crate) const EXTENSION_MASK: u8 = 0x1;
pub(crate) const CC_MASK: u8 = 0xF;
pub(crate) const MARKER_SHIFT: u8 = 7;
pub(crate) const MARKER_MASK: u8 = 0x1;
pub(crate) const PT_MASK: u8 = 0x7F;
pub(crate) const SEQ_NUM_OFFSET: usize = 2;
pub(crate) const TIMESTAMP_OFFSET: usize = 4;
pub(crate) const SSRC_OFFSET: usize = 8;
pub(crate) const CSRC_OFFSET: usize = 12;
pub(crate) const CSRC_LENGTH: usize = 4;

/// Profile id marking a one-byte (RFC 8285 §4.2) extension block.
pub const EXTENSION_PROFILE_ONE_BYTE: u16 = 0xBEDE;
/// Profile id prefix marking a two-byte (RFC 8285 §4.3) extension block; the
/// low nibble is reserved and ignored on read, written as 0.
pub const EXTENSION_PROFILE_TWO_BYTE: u16 = 0x1000;
/// A one-byte extension id of 0xF is reserved and terminates parsing early.
pub const EXTENSION_ID_RESERVED: u8 = 0xF;

/// A single header extension: a small local id plus its raw payload bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extension {
    pub id: u8,
    pub payload: Bytes,
}

/// RTP fixed header (RFC 3550 §5.1) plus its extension area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc: Vec<u32>,
    pub extension_profile: u16,
    pub extensions: Vec<Extension>,
    /// When true, a two-byte extension id/length layout is used instead of
    /// the default one-byte layout, even for extensions that would fit in
    /// one byte. Set once `extmap-allow-mixed` or an oversized id/value is
    /// in play.
    pub extensions_padding: usize,
    /// Number of RFC 3550 padding bytes trailing the payload, including the
    /// count byte itself. Meaningful only when `padding` is set; not part of
    /// the header's own wire bytes (the trailer lives at the end of the
    /// packet payload), so `Header::marshal`/`unmarshal` never touch it —
    /// [`crate::packet::Packet`] reads and writes the trailer.
    pub padding_size: u8,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: 2,
            padding: false,
            extension: false,
            marker: false,
            payload_type: 0,
            sequence_number: 0,
            timestamp: 0,
            ssrc: 0,
            csrc: Vec::new(),
            extension_profile: 0,
            extensions: Vec::new(),
            extensions_padding: 0,
            padding_size: 0,
        }
    }
}

impl Header {
    fn uses_two_byte_extensions(&self) -> bool {
        self.extension_profile & 0xFFF0 == EXTENSION_PROFILE_TWO_BYTE
    }

    fn extensions_payload_len(&self) -> usize {
        if !self.extension {
            return 0;
        }
        let body: usize = if self.uses_two_byte_extensions() {
            self.extensions.iter().map(|e| 2 + e.payload.len()).sum()
        } else {
            self.extensions.iter().map(|e| 1 + e.payload.len()).sum()
        };
        4 + align4(body) + self.extensions_padding
    }

    /// Look up a previously parsed/set extension's raw payload by id.
    pub fn get_extension(&self, id: u8) -> Option<Bytes> {
        self.extensions
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.payload.clone())
    }

    /// Returns the ids of every extension currently present, in header order.
    pub fn get_extension_ids(&self) -> Vec<u8> {
        self.extensions.iter().map(|e| e.id).collect()
    }

    /// Inserts or replaces the extension at `id` with `payload`. Enables the
    /// header's extension bit and, on first use, picks a one-byte or
    /// two-byte profile based on whether any registered id/length already
    /// requires the wider layout.
    pub fn set_extension(&mut self, id: u8, payload: Bytes) -> Result<()> {
        if id == 0 || id >= 256 {
            return Err(Error::OtherRtpErr(format!(
                "invalid header extension id {id}"
            )));
        }
        if self.extensions.is_empty() && self.extension_profile == 0 {
            self.extension_profile = if id > 14 || payload.len() > 16 {
                EXTENSION_PROFILE_TWO_BYTE
            } else {
                EXTENSION_PROFILE_ONE_BYTE
            };
        }
        if !self.uses_two_byte_extensions() && (id > 14 || payload.len() > 16) {
            return Err(Error::OtherRtpErr(
                "extension id/length requires a two-byte profile but header is one-byte"
                    .to_owned(),
            ));
        }
        self.extension = true;
        if let Some(existing) = self.extensions.iter_mut().find(|e| e.id == id) {
            existing.payload = payload;
        } else {
            self.extensions.push(Extension { id, payload });
        }
        Ok(())
    }

    /// Removes the extension at `id`, if present. Leaves the extension bit
    /// and profile untouched even if this empties the list, rather than
    /// rewriting an already-negotiated profile.
    pub fn del_extension(&mut self, id: u8) -> Result<()> {
        let before = self.extensions.len();
        self.extensions.retain(|e| e.id != id);
        if self.extensions.len() == before {
            return Err(Error::OtherRtpErr(format!(
                "extension id {id} not found"
            )));
        }
        Ok(())
    }
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH + CSRC_LENGTH * self.csrc.len() + self.extensions_payload_len()
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let size = self.marshal_size();
        if buf.len() < size {
            buf.resize(size, 0);
        }

        buf[0] = (self.version << VERSION_SHIFT)
            | ((self.padding as u8) << PADDING_SHIFT)
            | ((self.extension as u8) << EXTENSION_SHIFT)
            | (self.csrc.len() as u8 & CC_MASK);
        buf[1] = ((self.marker as u8) << MARKER_SHIFT) | (self.payload_type & PT_MASK);
        buf[SEQ_NUM_OFFSET..SEQ_NUM_OFFSET + 2].copy_from_slice(&self.sequence_number.to_be_bytes());
        buf[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 4].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[SSRC_OFFSET..SSRC_OFFSET + 4].copy_from_slice(&self.ssrc.to_be_bytes());

        let mut offset = CSRC_OFFSET;
        for csrc in &self.csrc {
            buf[offset..offset + 4].copy_from_slice(&csrc.to_be_bytes());
            offset += 4;
        }

        if self.extension {
            let two_byte = self.uses_two_byte_extensions();
            let profile = if two_byte {
                EXTENSION_PROFILE_TWO_BYTE
            } else {
                self.extension_profile
            };
            buf[offset..offset + 2].copy_from_slice(&profile.to_be_bytes());
            offset += 2;

            let body_start = offset + 2;
            let mut body = body_start;
            for ext in &self.extensions {
                if two_byte {
                    buf[body] = ext.id;
                    buf[body + 1] = ext.payload.len() as u8;
                    body += 2;
                } else {
                    buf[body] = (ext.id << 4) | ((ext.payload.len() as u8 - 1) & 0xF);
                    body += 1;
                }
                buf[body..body + ext.payload.len()].copy_from_slice(&ext.payload);
                body += ext.payload.len();
            }
            let body_len = body - body_start;
            let padded_len = align4(body_len);
            for b in buf.iter_mut().take(body_start + padded_len).skip(body) {
                *b = 0;
            }
            buf[offset..offset + 2].copy_from_slice(&((padded_len / 4) as u16).to_be_bytes());
            offset = body_start + padded_len;
        }

        Ok(offset)
    }
}

impl Unmarshal for Header {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        require_remaining(buf, HEADER_LENGTH, "rtp header")?;
        let b0 = buf.get_u8();
        let b1 = buf.get_u8();

        let version = (b0 >> VERSION_SHIFT) & VERSION_MASK;
        if version != 2 {
            return Err(Error::OtherRtpErr(format!(
                "unsupported RTP version {version}"
            )));
        }
        let padding = (b0 >> PADDING_SHIFT) & PADDING_MASK != 0;
        let extension = (b0 >> EXTENSION_SHIFT) & EXTENSION_MASK != 0;
        let cc = (b0 & CC_MASK) as usize;
        let marker = (b1 >> MARKER_SHIFT) & MARKER_MASK != 0;
        let payload_type = b1 & PT_MASK;

        require_remaining(buf, 8 + cc * 4, "rtp header fixed fields")?;
        let sequence_number = buf.get_u16();
        let timestamp = buf.get_u32();
        let ssrc = buf.get_u32();

        let mut csrc = Vec::with_capacity(cc);
        for _ in 0..cc {
            csrc.push(buf.get_u32());
        }

        let mut header = Header {
            version,
            padding,
            extension,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc,
            extension_profile: 0,
            extensions: Vec::new(),
            extensions_padding: 0,
            padding_size: 0,
        };

        if extension {
            require_remaining(buf, 4, "rtp extension header")?;
            let profile = buf.get_u16();
            let len_words = buf.get_u16() as usize;
            let body_len = len_words * 4;
            require_remaining(buf, body_len, "rtp extension body")?;

            header.extension_profile = profile;
            let mut body = buf.copy_to_bytes(body_len);

            if profile == EXTENSION_PROFILE_ONE_BYTE {
                while body.has_remaining() {
                    let b = body.get_u8();
                    let id = b >> 4;
                    if id == 0 {
                        continue; // padding byte between extensions
                    }
                    if id == EXTENSION_ID_RESERVED {
                        break;
                    }
                    let len = (b & 0xF) as usize + 1;
                    if body.remaining() < len {
                        break;
                    }
                    let payload = body.copy_to_bytes(len);
                    header.extensions.push(Extension { id, payload });
                }
            } else if profile & 0xFFF0 == EXTENSION_PROFILE_TWO_BYTE {
                while body.remaining() >= 2 {
                    let id = body.get_u8();
                    if id == 0 {
                        continue;
                    }
                    let len = body.get_u8() as usize;
                    if body.remaining() < len {
                        break;
                    }
                    let payload = body.copy_to_bytes(len);
                    header.extensions.push(Extension { id, payload });
                }
            }
            // Unknown profile: the extension area is kept opaque (none of
            // `extensions` populated) but its length is still honored above
            // so the payload cursor lands in the right place.
        }

        Ok(header)
    }
}
