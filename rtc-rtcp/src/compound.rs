//! Accumulates RTCP packets into UDP-sized compound datagrams, fragmenting
//! across multiple datagrams when the accumulated size would overflow
//! `max_size` rather than producing an oversized packet.
//!
//! This models the `OnBufferFull` pattern from the source as a streaming
//! encoder: [`CompoundBuilder::push`] writes into a fixed-size scratch
//! buffer and invokes the ready-callback whenever a packet wouldn't fit,
//! instead of a recursive builder.

use bytes::{Bytes, BytesMut};
use shared::error::Result;
use shared::marshal::Marshal;

use crate::packet::Packet;

/// Streaming compound-packet encoder. Construct with the transport's
/// maximum datagram size and a callback invoked with each completed
/// datagram; call [`CompoundBuilder::finish`] once all packets are pushed
/// to flush any partially filled buffer.
pub struct CompoundBuilder<F>
where
    F: FnMut(Bytes),
{
    max_size: usize,
    buf: BytesMut,
    on_ready: F,
}

impl<F> CompoundBuilder<F>
where
    F: FnMut(Bytes),
{
    pub fn new(max_size: usize, on_ready: F) -> Self {
        Self {
            max_size,
            buf: BytesMut::new(),
            on_ready,
        }
    }

    /// Appends `packet` to the current datagram, flushing the datagram
    /// first if the packet wouldn't otherwise fit. Fails only if a single
    /// packet is larger than `max_size` on its own.
    pub fn push(&mut self, packet: &dyn Packet) -> Result<()> {
        let size = packet.marshal_size();
        if size > self.max_size {
            return Err(shared::error::Error::OtherRtcpErr(format!(
                "rtcp packet of {size} bytes exceeds max datagram size {}",
                self.max_size
            )));
        }
        if !self.buf.is_empty() && self.buf.len() + size > self.max_size {
            self.flush();
        }
        packet.marshal_to(&mut self.buf)?;
        Ok(())
    }

    /// Appends every packet in order, fragmenting as needed.
    pub fn push_all(&mut self, packets: &[Box<dyn Packet>]) -> Result<()> {
        for packet in packets {
            self.push(packet.as_ref())?;
        }
        Ok(())
    }

    /// Flushes whatever is currently buffered, even if empty-sized (a no-op
    /// in that case). Called automatically by `push` on overflow and must
    /// be called once more after the last `push` to emit the final datagram.
    pub fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let datagram = std::mem::take(&mut self.buf).freeze();
        (self.on_ready)(datagram);
    }

    /// Flushes any remaining buffered packets. Equivalent to `flush` but
    /// named for the call site that means "no more packets are coming".
    pub fn finish(&mut self) {
        self.flush();
    }
}
