//! A full RTP packet: header plus payload. When the header's padding bit is
//! set, `marshal_to` appends the padding trailer (zero bytes plus a count
//! byte) after the payload, and `unmarshal` strips and validates it rather
//! than leaving it mixed into `payload`.

use bytes::{Buf, Bytes, BytesMut};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::header::Header;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
}

impl Packet {
    /// Registers a header extension, generalizing the id/length rules
    /// already enforced by [`Header::set_extension`] to whatever profile the
    /// header currently uses (or picks one, on the first call).
    pub fn allocate_extension(&mut self, id: u8, payload: Bytes) -> Result<()> {
        self.header.set_extension(id, payload)
    }

    /// Replaces the payload. Only valid before padding has been set, since
    /// padding length is computed from the final payload size.
    pub fn set_payload(&mut self, payload: Bytes) -> Result<()> {
        if self.header.padding {
            return Err(Error::OtherRtpErr(
                "cannot change payload after padding is set".to_owned(),
            ));
        }
        self.payload = payload;
        Ok(())
    }

    /// Sets the trailing RFC 3550 padding to `pad_len` bytes (a padding count
    /// byte as the final octet, preceded by `pad_len - 1` zero bytes).
    /// `pad_len` must be at least 1 and at most 255. The padding trailer is
    /// not stored in `payload`; it is written by `marshal_to` and stripped by
    /// `unmarshal`, so `payload` always holds only the media payload.
    pub fn set_padding(&mut self, pad_len: u8) -> Result<()> {
        if pad_len == 0 {
            return Err(Error::OtherRtpErr("padding length must be nonzero".to_owned()));
        }
        self.header.padding = true;
        self.header.padding_size = pad_len;
        Ok(())
    }

    /// The number of trailing padding bytes this packet carries, or 0 if the
    /// padding bit is unset.
    pub fn padding_size(&self) -> u8 {
        if self.header.padding {
            self.header.padding_size
        } else {
            0
        }
    }
}

impl MarshalSize for Packet {
    fn marshal_size(&self) -> usize {
        self.header.marshal_size() + self.payload.len() + self.padding_size() as usize
    }
}

impl Marshal for Packet {
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize> {
        let header_len = self.header.marshal_size();
        let padding_len = self.padding_size() as usize;
        let total = header_len + self.payload.len() + padding_len;
        if buf.len() < total {
            buf.resize(total, 0);
        }
        let mut header_buf = BytesMut::zeroed(header_len);
        self.header.marshal_to(&mut header_buf)?;
        buf[..header_len].copy_from_slice(&header_buf);
        let payload_end = header_len + self.payload.len();
        buf[header_len..payload_end].copy_from_slice(&self.payload);
        if padding_len > 0 {
            for b in buf[payload_end..total - 1].iter_mut() {
                *b = 0;
            }
            buf[total - 1] = padding_len as u8;
        }
        Ok(total)
    }
}

impl Unmarshal for Packet {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf,
    {
        let mut header = Header::unmarshal(buf)?;
        let body = buf.copy_to_bytes(buf.remaining());

        let payload = if header.padding {
            if body.is_empty() {
                return Err(Error::OtherRtpErr(
                    "padding was set, but padding size is zero".to_owned(),
                ));
            }
            let pad_len = body[body.len() - 1];
            if pad_len == 0 {
                return Err(Error::OtherRtpErr(
                    "padding was set, but padding size is zero".to_owned(),
                ));
            }
            if pad_len as usize > body.len() {
                return Err(Error::OtherRtpErr(
                    "padding size exceeds payload length".to_owned(),
                ));
            }
            header.padding_size = pad_len;
            body.slice(0..body.len() - pad_len as usize)
        } else {
            body
        };

        Ok(Self { header, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_round_trip() {
        let packet = Packet {
            header: Header {
                marker: true,
                payload_type: 111,
                sequence_number: 42,
                timestamp: 3000,
                ssrc: 0xcafebabe,
                ..Default::default()
            },
            payload: Bytes::from_static(b"hello media"),
        };

        let raw = packet.marshal().unwrap();
        let mut buf = raw.clone();
        let parsed = Packet::unmarshal(&mut buf).unwrap();
        assert_eq!(packet, parsed);
    }

    #[test]
    fn test_packet_set_padding() {
        let mut packet = Packet {
            header: Header::default(),
            payload: Bytes::from_static(b"abc"),
        };
        packet.set_padding(4).unwrap();
        assert!(packet.header.padding);
        assert_eq!(packet.payload.len(), 3);
        assert_eq!(packet.padding_size(), 4);

        let raw = packet.marshal().unwrap();
        assert_eq!(raw.len(), packet.header.marshal_size() + 3 + 4);
        assert_eq!(*raw.last().unwrap(), 4);
    }

    #[test]
    fn test_packet_round_trip_with_padding() {
        let mut packet = Packet {
            header: Header {
                sequence_number: 9,
                ..Default::default()
            },
            payload: Bytes::from_static(b"hello media"),
        };
        packet.set_padding(4).unwrap();

        let raw = packet.marshal().unwrap();
        let mut buf = raw.clone();
        let parsed = Packet::unmarshal(&mut buf).unwrap();
        assert_eq!(packet, parsed);
        assert_eq!(parsed.payload, Bytes::from_static(b"hello media"));
        assert_eq!(parsed.padding_size(), 4);
    }

    #[test]
    fn test_packet_rejects_payload_change_after_padding() {
        let mut packet = Packet {
            header: Header::default(),
            payload: Bytes::from_static(b"abc"),
        };
        packet.set_padding(2).unwrap();
        assert!(packet.set_payload(Bytes::from_static(b"xyz")).is_err());
    }

    #[test]
    fn test_unmarshal_rejects_zero_padding_size() {
        let header = Header {
            padding: true,
            ..Default::default()
        };
        let mut raw = BytesMut::new();
        header.marshal_to(&mut raw).unwrap();
        raw.extend_from_slice(&[1, 2, 3, 0]);
        let mut buf = raw.freeze();
        assert!(Packet::unmarshal(&mut buf).is_err());
    }

    #[test]
    fn test_unmarshal_rejects_padding_longer_than_payload() {
        let header = Header {
            padding: true,
            ..Default::default()
        };
        let mut raw = BytesMut::new();
        header.marshal_to(&mut raw).unwrap();
        raw.extend_from_slice(&[1, 2, 9]);
        let mut buf = raw.freeze();
        assert!(Packet::unmarshal(&mut buf).is_err());
    }

    #[test]
    fn test_unmarshal_rejects_padding_bit_with_no_trailer() {
        let header = Header {
            padding: true,
            ..Default::default()
        };
        let mut raw = BytesMut::new();
        header.marshal_to(&mut raw).unwrap();
        let mut buf = raw.freeze();
        assert!(Packet::unmarshal(&mut buf).is_err());
    }
}
