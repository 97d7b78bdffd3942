//! In-memory connection pairs.

use rsocket_frame::{FrameConnection, FramingConfig};
use tokio::io::{DuplexStream, duplex};

/// Default duplex buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Two connections joined by a `tokio::io::duplex` pipe, both using `config`.
#[must_use]
pub fn connection_pair(
    config: &FramingConfig,
) -> (FrameConnection<DuplexStream>, FrameConnection<DuplexStream>) {
    let (client, server) = duplex(DEFAULT_CAPACITY);
    (
        FrameConnection::new(client, config),
        FrameConnection::new(server, config),
    )
}
