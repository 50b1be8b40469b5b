//! Loading from an asynchronous byte stream, behind the `async` feature.

use crate::smf::Smf;
use crate::{Error, ErrorKind, Result};
use futures::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Reads the whole stream, then parses it with [`Smf::read_bytes`].
///
/// [`Smf::read_bytes`]: smf/struct.Smf.html#method.read_bytes
pub async fn read_smf<TRead: AsyncRead + Unpin>(mut io: TRead) -> Result<Smf> {
    let mut data = Vec::new();
    io.read_to_end(&mut data)
        .await
        .map_err(|err| Error::new("read stream", ErrorKind::Io(err.kind())))?;
    debug!(bytes = data.len(), "read smf stream");
    Smf::read_bytes(&data)
}
