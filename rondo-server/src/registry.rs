//! Client connection registry
//!
//! Tracks connected clients and the session each one is attached to, so the
//! dispatcher can address one client or every client of a session.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use rondo_protocol::{ClientId, ServerMessage};
use rondo_session::SessionId;

/// Entry for a connected client
pub struct ClientEntry {
    /// Channel for sending messages to this client
    pub sender: mpsc::Sender<ServerMessage>,
    /// Session this client is attached to (if any)
    pub attached_session: Option<SessionId>,
}

impl std::fmt::Debug for ClientEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientEntry")
            .field("attached_session", &self.attached_session)
            .field("sender_closed", &self.sender.is_closed())
            .finish()
    }
}

/// Registry tracking all connected clients
///
/// Connection tasks register and the dispatcher does everything else.
pub struct ClientRegistry {
    /// Client ID -> Client entry
    clients: DashMap<ClientId, ClientEntry>,
    /// Session ID -> Set of client IDs (reverse index for broadcast)
    session_clients: DashMap<SessionId, HashSet<ClientId>>,
    /// Counter for generating unique client IDs
    next_client_id: AtomicU64,
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    /// Create a new empty client registry
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            session_clients: DashMap::new(),
            next_client_id: AtomicU64::new(1),
        }
    }

    // ==================== Client Management ====================

    /// Register a new client connection
    pub fn register_client(&self, sender: mpsc::Sender<ServerMessage>) -> ClientId {
        let id = ClientId::new(self.next_client_id.fetch_add(1, Ordering::SeqCst));

        self.clients.insert(
            id,
            ClientEntry {
                sender,
                attached_session: None,
            },
        );
        debug!("Registered client {}", id);

        id
    }

    /// Unregister a client connection, returning the session it was attached to
    pub fn unregister_client(&self, client_id: ClientId) -> Option<SessionId> {
        let (_, entry) = self.clients.remove(&client_id)?;
        debug!("Unregistered client {}", client_id);

        let session_id = entry.attached_session?;
        self.remove_client_from_session_index(client_id, session_id);
        Some(session_id)
    }

    /// Drop every client, closing their outgoing queues
    pub fn clear(&self) {
        self.clients.clear();
        self.session_clients.clear();
    }

    /// Get the number of connected clients
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Every connected client
    pub fn client_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.clients.iter().map(|e| *e.key()).collect();
        ids.sort();
        ids
    }

    // ==================== Session Association ====================

    /// Attach a client to a session
    ///
    /// Returns the session the client was attached to before, if any, or
    /// `None` without change if the client does not exist.
    pub fn attach_to_session(
        &self,
        client_id: ClientId,
        session_id: SessionId,
    ) -> Option<Option<SessionId>> {
        let mut entry = self.clients.get_mut(&client_id)?;

        let previous = entry.attached_session.replace(session_id);
        if let Some(old) = previous.filter(|&old| old != session_id) {
            self.remove_client_from_session_index(client_id, old);
        }

        self.session_clients
            .entry(session_id)
            .or_default()
            .insert(client_id);

        debug!("Client {} attached to session {}", client_id, session_id);
        Some(previous)
    }

    /// Detach a client from its current session, returning that session
    pub fn detach_from_session(&self, client_id: ClientId) -> Option<SessionId> {
        let session_id = self.clients.get_mut(&client_id)?.attached_session.take()?;
        self.remove_client_from_session_index(client_id, session_id);

        debug!("Client {} detached from session {}", client_id, session_id);
        Some(session_id)
    }

    /// Get the session a client is attached to
    pub fn get_client_session(&self, client_id: ClientId) -> Option<SessionId> {
        self.clients.get(&client_id)?.attached_session
    }

    /// Get all client IDs attached to a session, in ID order
    pub fn get_session_clients(&self, session_id: SessionId) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .session_clients
            .get(&session_id)
            .map(|clients| clients.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Clients attached to a session for which `alive` is false
    pub fn clients_of_dead_sessions(&self, alive: impl Fn(SessionId) -> bool) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .session_clients
            .iter()
            .filter(|e| !alive(*e.key()))
            .flat_map(|e| e.value().iter().copied().collect::<Vec<_>>())
            .collect();
        ids.sort();
        ids
    }

    fn remove_client_from_session_index(&self, client_id: ClientId, session_id: SessionId) {
        if let Some(mut clients) = self.session_clients.get_mut(&session_id) {
            clients.remove(&client_id);
            if clients.is_empty() {
                drop(clients); // Release the shard lock before removing
                self.session_clients.remove(&session_id);
            }
        }
    }

    // ==================== Message Delivery ====================

    /// Queue a message for a client without waiting
    ///
    /// Returns `false` if the client doesn't exist or the queue is closed or
    /// full. A closed queue unregisters the client.
    pub fn try_send_to_client(&self, client_id: ClientId, message: ServerMessage) -> bool {
        let sender = match self.clients.get(&client_id) {
            Some(entry) => entry.sender.clone(),
            None => return false,
        };

        match sender.try_send(message) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Client {} channel closed, removing from registry", client_id);
                self.unregister_client(client_id);
                false
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Client {} channel full, message dropped", client_id);
                false
            }
        }
    }

    /// Queue a message for every client attached to a session
    ///
    /// Returns the number of clients the message was queued for.
    pub fn try_broadcast_to_session(&self, session_id: SessionId, message: ServerMessage) -> usize {
        self.get_session_clients(session_id)
            .into_iter()
            .filter(|&client_id| self.try_send_to_client(client_id, message.clone()))
            .count()
    }
}
