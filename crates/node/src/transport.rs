//! Length-prefixed bincode frames.
//!
//! Each frame is a big-endian `u32` body length followed by the bincode
//! body. One request frame is answered by one response frame.

use crate::error::{NodeError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest body accepted in either direction.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let body = bincode::serialize(msg)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(NodeError::FrameTooLarge(body.len()));
    }
    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. `Ok(None)` means the peer closed the stream between
/// frames.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len = [0u8; 4];
    match reader.read_exact(&mut len).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len) as usize;
    if len > MAX_FRAME_LEN {
        return Err(NodeError::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(bincode::deserialize(&body)?))
}
