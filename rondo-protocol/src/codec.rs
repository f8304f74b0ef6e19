//! Frame codec for the Unix socket
//!
//! Every frame is a big-endian `u32` body length followed by a bincode
//! body. One generic codec serves both ends; the aliases fix which message
//! type each side writes and which it reads.

use std::fmt;
use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};

use crate::messages::{ClientMessage, ServerMessage};

/// Maximum frame body size (16 MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Size of the frame length prefix
const FRAME_HEADER: usize = 4;

/// Frame codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Writes `Enc` frames and reads `Dec` frames
pub struct FrameCodec<Enc, Dec> {
    _marker: PhantomData<fn(Enc) -> Dec>,
}

/// Client end: sends [`ClientMessage`], receives [`ServerMessage`]
pub type ClientCodec = FrameCodec<ClientMessage, ServerMessage>;

/// Server end: sends [`ServerMessage`], receives [`ClientMessage`]
pub type ServerCodec = FrameCodec<ServerMessage, ClientMessage>;

impl<Enc, Dec> FrameCodec<Enc, Dec> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<Enc, Dec> Default for FrameCodec<Enc, Dec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Enc, Dec> fmt::Debug for FrameCodec<Enc, Dec> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCodec").finish()
    }
}

fn check_size(size: usize) -> Result<(), CodecError> {
    if size > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

impl<Enc, Dec: DeserializeOwned> Decoder for FrameCodec<Enc, Dec> {
    type Item = Dec;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Dec>, CodecError> {
        let Some(header) = src.get(..FRAME_HEADER) else {
            return Ok(None);
        };
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        check_size(len)?;

        let frame_len = FRAME_HEADER + len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(FRAME_HEADER);
        let body = src.split_to(len);
        Ok(Some(bincode::deserialize(&body)?))
    }
}

impl<Enc: Serialize, Dec> Encoder<Enc> for FrameCodec<Enc, Dec> {
    type Error = CodecError;

    fn encode(&mut self, item: Enc, dst: &mut BytesMut) -> Result<(), CodecError> {
        let body = bincode::serialize(&item)?;
        check_size(body.len())?;

        dst.reserve(FRAME_HEADER + body.len());
        dst.put_u32(body.len() as u32);
        dst.put_slice(&body);
        Ok(())
    }
}
