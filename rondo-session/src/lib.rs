//! Session management for rondo
//!
//! Provides the session/winlink/window tree that commands operate on. A
//! session holds an ordered set of winlinks (slot index -> window); a window
//! may be linked into several sessions at once and lives for as long as any
//! winlink references it.

mod manager;
mod session;
mod window;

pub use manager::SessionManager;
pub use session::{Session, MAX_INDEX};
pub use window::Window;

/// Identifier of a session
pub type SessionId = uuid::Uuid;

/// Identifier of a window
pub type WindowId = uuid::Uuid;
