//! String-valued header extensions: MID and RTP stream id (RID), each a
//! UTF-8 string of up to 16 bytes, stored verbatim as the extension payload.

use bytes::Bytes;
use shared::error::{Error, Result};

pub const MAX_SDES_EXTENSION_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SdesExtension {
    pub value: String,
}

impl SdesExtension {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.len() > MAX_SDES_EXTENSION_LEN {
            return Err(Error::OtherRtpErr(format!(
                "sdes extension value exceeds {MAX_SDES_EXTENSION_LEN} bytes"
            )));
        }
        Ok(Self { value })
    }

    pub fn marshal(&self) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self.value.as_bytes()))
    }

    pub fn unmarshal(payload: &Bytes) -> Result<Self> {
        let value = String::from_utf8(payload.to_vec())
            .map_err(|e| Error::OtherRtpErr(format!("sdes extension not utf8: {e}")))?;
        Ok(Self { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdes_extension_round_trip() {
        let ext = SdesExtension::new("audio0").unwrap();
        let raw = ext.marshal().unwrap();
        assert_eq!(SdesExtension::unmarshal(&raw).unwrap(), ext);
    }

    #[test]
    fn test_sdes_extension_rejects_too_long() {
        assert!(SdesExtension::new("this-mid-is-way-too-long-for-one-byte").is_err());
    }
}
