use std::collections::HashMap;

use rondo_utils::{Result, RondoError};

use crate::{Session, SessionId, Window, WindowId, MAX_INDEX};

/// Manages all sessions and the windows they link
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<SessionId, Session>,
    /// Map session name to ID for lookup
    name_to_id: HashMap<String, SessionId>,
    /// Every live window; each is referenced by at least one winlink
    windows: HashMap<WindowId, Window>,
    /// Activity counter handed out to sessions as they are used
    activity: u64,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Sessions ====================

    /// Create a session holding a single window
    ///
    /// Without a name the lowest unused number is taken. The window goes in
    /// slot `base_index` and is named after `window_name`, or its slot.
    pub fn create_session(
        &mut self,
        name: Option<&str>,
        window_name: Option<&str>,
        base_index: u32,
    ) -> Result<SessionId> {
        let name = name.map(String::from).unwrap_or_else(|| self.next_session_name());
        if self.name_to_id.contains_key(&name) {
            return Err(RondoError::SessionExists(name));
        }

        let mut session = Session::new(&name);
        let session_id = session.id();

        let window_id = self.create_window(
            window_name
                .map(String::from)
                .unwrap_or_else(|| base_index.to_string()),
        );
        session.insert(base_index, window_id);

        self.name_to_id.insert(name, session_id);
        self.sessions.insert(session_id, session);
        self.touch(session_id);

        Ok(session_id)
    }

    /// Lowest non-negative integer not already used as a session name
    pub fn next_session_name(&self) -> String {
        (0u64..)
            .map(|n| n.to_string())
            .find(|name| !self.name_to_id.contains_key(name))
            .unwrap_or_default()
    }

    /// Get session by ID
    pub fn session(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    /// Get mutable session by ID
    pub fn session_mut(&mut self, session_id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&session_id)
    }

    /// Look up a session ID by exact name
    pub fn find_session(&self, name: &str) -> Option<SessionId> {
        self.name_to_id.get(name).copied()
    }

    /// Get session by name
    pub fn session_by_name(&self, name: &str) -> Option<&Session> {
        self.find_session(name).and_then(|id| self.sessions.get(&id))
    }

    /// List all sessions, ordered by name
    pub fn list_sessions(&self) -> Vec<&Session> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| a.name().cmp(b.name()));
        sessions
    }

    /// Get session count
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The session used most recently
    pub fn most_recent_session(&self) -> Option<SessionId> {
        self.sessions
            .values()
            .max_by_key(|s| s.activity())
            .map(|s| s.id())
    }

    /// Rename a session
    pub fn rename_session(&mut self, session_id: SessionId, name: &str) -> Result<()> {
        if let Some(&existing) = self.name_to_id.get(name) {
            if existing == session_id {
                return Ok(());
            }
            return Err(RondoError::SessionExists(name.to_string()));
        }

        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| RondoError::SessionNotFound(session_id.to_string()))?;

        self.name_to_id.remove(session.name());
        session.set_name(name);
        self.name_to_id.insert(name.to_string(), session_id);
        Ok(())
    }

    /// Remove a session, releasing every window it links
    pub fn destroy_session(&mut self, session_id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&session_id)?;
        self.name_to_id.remove(session.name());

        let windows: Vec<WindowId> = session.winlinks().map(|(_, w)| w).collect();
        for window_id in windows {
            self.release_window(window_id);
        }

        Some(session)
    }

    // ==================== Windows ====================

    /// Get window by ID
    pub fn window(&self, window_id: WindowId) -> Option<&Window> {
        self.windows.get(&window_id)
    }

    /// Get the number of live windows
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Window shown in a session's slot
    pub fn window_at(&self, session_id: SessionId, index: u32) -> Option<&Window> {
        self.sessions
            .get(&session_id)?
            .window_at(index)
            .and_then(|w| self.windows.get(&w))
    }

    /// Create a window in a session
    ///
    /// Without an index the first free slot at or above `base_index` is used.
    /// Returns the slot the window went into.
    pub fn new_window(
        &mut self,
        session_id: SessionId,
        index: Option<u32>,
        name: Option<&str>,
        base_index: u32,
    ) -> Result<u32> {
        let session = self
            .sessions
            .get(&session_id)
            .ok_or_else(|| RondoError::SessionNotFound(session_id.to_string()))?;

        let index = match index {
            Some(index) if session.window_at(index).is_some() => {
                return Err(RondoError::IndexInUse(index))
            }
            Some(index) => index,
            None => session
                .first_free_index(base_index)
                .ok_or(RondoError::IndexInUse(MAX_INDEX))?,
        };

        let window_id = self.create_window(
            name.map(String::from).unwrap_or_else(|| index.to_string()),
        );
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.insert(index, window_id);
        }
        self.touch(session_id);

        Ok(index)
    }

    /// Link an existing window into an empty slot
    pub fn link_window(
        &mut self,
        session_id: SessionId,
        index: u32,
        window_id: WindowId,
    ) -> Result<()> {
        if !self.windows.contains_key(&window_id) {
            return Err(RondoError::internal(format!("unknown window {}", window_id)));
        }
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| RondoError::SessionNotFound(session_id.to_string()))?;
        if session.window_at(index).is_some() {
            return Err(RondoError::IndexInUse(index));
        }

        session.insert(index, window_id);
        if let Some(window) = self.windows.get_mut(&window_id) {
            window.reference();
        }
        Ok(())
    }

    /// Show `window_id` in an occupied slot, releasing the window it showed
    pub fn replace_window(
        &mut self,
        session_id: SessionId,
        index: u32,
        window_id: WindowId,
    ) -> Result<()> {
        if !self.windows.contains_key(&window_id) {
            return Err(RondoError::internal(format!("unknown window {}", window_id)));
        }
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| RondoError::SessionNotFound(session_id.to_string()))?;
        let old = session
            .replace(index, window_id)
            .ok_or(RondoError::WindowNotFound(index))?;

        if let Some(window) = self.windows.get_mut(&window_id) {
            window.reference();
        }
        self.release_window(old);
        Ok(())
    }

    /// Empty a slot
    ///
    /// The window is destroyed if this was its last winlink, and the session
    /// is destroyed if this was its last slot. Returns whether the session
    /// still exists.
    pub fn unlink_window(&mut self, session_id: SessionId, index: u32) -> Result<bool> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| RondoError::SessionNotFound(session_id.to_string()))?;
        let window_id = session
            .remove(index)
            .ok_or(RondoError::WindowNotFound(index))?;
        let emptied = session.is_empty();

        self.release_window(window_id);
        if emptied {
            self.destroy_session(session_id);
        }
        Ok(!emptied)
    }

    /// Exchange the windows shown in two slots
    ///
    /// Slot positions and each session's current/last pointers stay put;
    /// only window identity moves. Both slots are resolved before anything
    /// changes.
    pub fn swap_windows(
        &mut self,
        a: (SessionId, u32),
        b: (SessionId, u32),
    ) -> Result<()> {
        let window_a = self.slot(a)?;
        let window_b = self.slot(b)?;

        if let Some(session) = self.sessions.get_mut(&a.0) {
            session.replace(a.1, window_b);
        }
        if let Some(session) = self.sessions.get_mut(&b.0) {
            session.replace(b.1, window_a);
        }
        Ok(())
    }

    /// Make a slot current in its session
    pub fn select_window(&mut self, session_id: SessionId, index: u32) -> bool {
        let selected = self
            .sessions
            .get_mut(&session_id)
            .map(|s| s.select(index))
            .unwrap_or(false);
        if selected {
            self.touch(session_id);
        }
        selected
    }

    /// Select the slot after the current one, wrapping around
    pub fn next_window(&mut self, session_id: SessionId) -> Option<u32> {
        let index = self.sessions.get(&session_id)?.next_index()?;
        self.select_window(session_id, index).then_some(index)
    }

    /// Select the slot before the current one, wrapping around
    pub fn previous_window(&mut self, session_id: SessionId) -> Option<u32> {
        let index = self.sessions.get(&session_id)?.previous_index()?;
        self.select_window(session_id, index).then_some(index)
    }

    /// Select the previously selected slot
    pub fn last_window(&mut self, session_id: SessionId) -> Option<u32> {
        let index = self.sessions.get(&session_id)?.last_index()?;
        self.select_window(session_id, index).then_some(index)
    }

    /// Destroy a window, unlinking it from every session
    ///
    /// Sessions left empty are destroyed. Returns the sessions that lost a
    /// slot and still exist, ordered by name.
    pub fn kill_window(&mut self, window_id: WindowId) -> Vec<SessionId> {
        let touched = self.sessions_with_window(window_id);
        let mut survivors = Vec::new();

        for session_id in touched {
            let Some(session) = self.sessions.get_mut(&session_id) else {
                continue;
            };
            let slots: Vec<u32> = session
                .winlinks()
                .filter(|&(_, w)| w == window_id)
                .map(|(idx, _)| idx)
                .collect();
            for idx in slots {
                session.remove(idx);
            }

            if session.is_empty() {
                if let Some(session) = self.sessions.remove(&session_id) {
                    self.name_to_id.remove(session.name());
                }
            } else {
                survivors.push(session_id);
            }
        }

        self.windows.remove(&window_id);
        survivors
    }

    /// Rename a window everywhere it is shown
    pub fn rename_window(&mut self, window_id: WindowId, name: &str) -> bool {
        match self.windows.get_mut(&window_id) {
            Some(window) => {
                window.set_name(name);
                true
            }
            None => false,
        }
    }

    /// Sessions with at least one slot showing `window_id`, ordered by name
    pub fn sessions_with_window(&self, window_id: WindowId) -> Vec<SessionId> {
        self.list_sessions()
            .into_iter()
            .filter(|s| s.contains_window(window_id))
            .map(|s| s.id())
            .collect()
    }

    // ==================== Internals ====================

    fn create_window(&mut self, name: String) -> WindowId {
        let mut window = Window::new(name);
        window.reference();
        let window_id = window.id();
        self.windows.insert(window_id, window);
        window_id
    }

    fn release_window(&mut self, window_id: WindowId) {
        let remaining = self
            .windows
            .get_mut(&window_id)
            .map(|w| w.release())
            .unwrap_or(0);
        if remaining == 0 {
            self.windows.remove(&window_id);
        }
    }

    fn slot(&self, (session_id, index): (SessionId, u32)) -> Result<WindowId> {
        self.sessions
            .get(&session_id)
            .ok_or_else(|| RondoError::SessionNotFound(session_id.to_string()))?
            .window_at(index)
            .ok_or(RondoError::WindowNotFound(index))
    }

    fn touch(&mut self, session_id: SessionId) {
        self.activity += 1;
        let activity = self.activity;
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.set_activity(activity);
        }
    }
}
