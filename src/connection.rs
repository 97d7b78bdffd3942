//! Frame-level duplex over a byte-stream transport.
//!
//! [`FrameConnection`] stacks the [`FrameLengthCodec`] on an I/O object and
//! runs every outbound frame through a [`Fragmenter`] and every inbound
//! frame through a [`Reassembler`]. Callers deal in whole frames only.

use std::{io, num::NonZeroUsize};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::{
    codec::FrameLengthCodec,
    config::FramingConfig,
    fragment::{FragmentationError, FrameLength, Fragmenter, Reassembler, ReassemblyError},
    frame::FrameType,
};

/// Errors raised by [`FrameConnection`].
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Transport or length codec error.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// An outbound frame could not be fragmented.
    #[error("failed to send frame: {0}")]
    Fragmentation(#[from] FragmentationError),
    /// Inbound fragments could not be reassembled.
    #[error("failed to receive frame: {0}")]
    Reassembly(#[from] ReassemblyError),
    /// The peer closed the stream.
    #[error("connection closed by peer")]
    Disconnected,
}

/// Sends and receives whole RSocket frames over `T`.
#[derive(Debug)]
pub struct FrameConnection<T> {
    framed: Framed<T, FrameLengthCodec>,
    fragmenter: Fragmenter,
    reassembler: Reassembler,
}

impl<T> FrameConnection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap `io` using the limits in `config`.
    ///
    /// Without a fragment bound, outbound frames are only split when they
    /// exceed what the length prefix can describe.
    #[must_use]
    pub fn new(io: T, config: &FramingConfig) -> Self {
        let codec = FrameLengthCodec::new(config.max_assembled_size.get());
        let fragmenter = Fragmenter::from_config(config)
            .unwrap_or_else(|| Fragmenter::with_codec(NonZeroUsize::MAX, config.codec()));
        Self {
            framed: Framed::new(io, codec),
            fragmenter,
            reassembler: Reassembler::from_config(config),
        }
    }

    /// Return the outbound fragmenter.
    #[must_use]
    pub fn fragmenter(&self) -> &Fragmenter { &self.fragmenter }

    /// Return the inbound reassembler.
    #[must_use]
    pub fn reassembler(&self) -> &Reassembler { &self.reassembler }

    /// Send `frame`, fragmenting it when it exceeds the bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Fragmentation`] when the frame cannot be
    /// split and [`ConnectionError::Io`] when writing fails. Nothing is
    /// written if fragmentation is rejected.
    pub async fn send(
        &mut self,
        frame: Bytes,
        frame_type: FrameType,
    ) -> Result<(), ConnectionError> {
        let fragments = self
            .fragmenter
            .fragment(frame, frame_type, FrameLength::Omitted)?;
        let mut sent = 0_usize;
        for fragment in fragments {
            self.framed.feed(fragment).await?;
            sent += 1;
        }
        self.framed.flush().await?;
        tracing::trace!(frame_type = %frame_type, fragments = sent, "frame sent");
        Ok(())
    }

    /// Receive the next whole frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Disconnected`] when the stream ends, even
    /// in the middle of a fragmented frame,
    /// [`ConnectionError::Reassembly`] when the peer violates fragmentation
    /// rules, and [`ConnectionError::Io`] for transport failures.
    pub async fn recv(&mut self) -> Result<Bytes, ConnectionError> {
        loop {
            let Some(frame) = self.framed.next().await else {
                if self.reassembler.is_assembling() {
                    tracing::warn!("connection closed inside a fragmented frame");
                    self.reassembler.reset();
                }
                return Err(ConnectionError::Disconnected);
            };
            if let Some(frame) = self.reassembler.consume(frame?)? {
                return Ok(frame);
            }
        }
    }

    /// Flush and shut down the write half.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Io`] if flushing fails.
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        self.framed.close().await?;
        Ok(())
    }

    /// Return the underlying I/O object, discarding buffered state.
    #[must_use]
    pub fn into_inner(self) -> T { self.framed.into_inner() }
}
