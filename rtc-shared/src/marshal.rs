//! Marshal/unmarshal traits shared by every wire-format type in the `rtp`
//! and `rtcp` crates.
//!
//! The trio mirrors the convention used throughout the webrtc-rs ecosystem:
//! [`MarshalSize`] reports how many bytes a value needs, [`Marshal`] writes
//! those bytes into a caller-owned buffer (or allocates one via the default
//! `marshal` method), and [`Unmarshal`] parses a value back out of a
//! `bytes::Buf`, advancing the cursor by exactly what it consumed.

use crate::error::{Error, Result};
use bytes::{Buf, Bytes, BytesMut};

/// Reports the exact number of bytes a type serializes to.
pub trait MarshalSize {
    /// Size in bytes of the marshaled form of this value.
    fn marshal_size(&self) -> usize;
}

/// Serializes a value into bytes.
pub trait Marshal: MarshalSize {
    /// Writes the marshaled form into `buf`, starting at `buf`'s current
    /// length, and returns the number of bytes written. `buf` is grown as
    /// needed; implementations should `reserve` rather than assume capacity.
    fn marshal_to(&self, buf: &mut BytesMut) -> Result<usize>;

    /// Allocates a new buffer sized by [`MarshalSize::marshal_size`] and
    /// marshals into it.
    fn marshal(&self) -> Result<Bytes> {
        let capacity = self.marshal_size();
        let mut buf = BytesMut::with_capacity(capacity);
        buf.resize(capacity, 0);
        let n = self.marshal_to(&mut buf)?;
        Ok(buf.freeze().slice(0..n))
    }
}

/// Parses a value out of a byte buffer, consuming exactly the bytes it
/// occupies and leaving the rest of the buffer positioned at the next value.
pub trait Unmarshal: Sized {
    fn unmarshal<B>(buf: &mut B) -> Result<Self>
    where
        B: Buf;
}

/// Fails with a short-buffer error if `buf` has fewer than `n` bytes
/// remaining. Every `unmarshal` implementation in `rtp`/`rtcp` calls this
/// before reading fixed-size fields so truncated input is rejected instead
/// of panicking.
pub fn require_remaining<B: Buf>(buf: &B, n: usize, context: &'static str) -> Result<()> {
    if buf.remaining() < n {
        return Err(Error::OtherRtpErr(format!(
            "{context}: need {n} bytes, have {}",
            buf.remaining()
        )));
    }
    Ok(())
}

/// Rounds `n` up to the next multiple of 4, the padding unit both RTP
/// extensions and RTCP packets are specified in.
pub fn align4(n: usize) -> usize {
    n.div_ceil(4) * 4
}
