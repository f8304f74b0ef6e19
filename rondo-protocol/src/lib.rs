//! rondo-protocol: Shared IPC definitions for client-server communication
//!
//! This crate defines the transport buffer that serialized command instances
//! travel in, the frame codec, and all message types exchanged between the
//! rondo client and server over the Unix socket.

pub mod buffer;
pub mod codec;
pub mod messages;
pub mod types;

// Re-export main types at crate root
pub use buffer::{Buffer, WireError};
pub use codec::{ClientCodec, CodecError, FrameCodec, ServerCodec};
pub use messages::{ClientMessage, CommandMessage, ServerMessage};
pub use types::ClientId;

/// Current protocol version
pub const PROTOCOL_VERSION: u32 = 1;
