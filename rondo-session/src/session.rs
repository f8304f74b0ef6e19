use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::{SessionId, WindowId};

/// Highest slot index a window can occupy
pub const MAX_INDEX: u32 = i32::MAX as u32;

/// A named container of window slots
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier
    id: SessionId,
    /// Session name
    name: String,
    /// Winlinks: slot index -> window
    winlinks: BTreeMap<u32, WindowId>,
    /// Currently selected slot
    current: Option<u32>,
    /// Previously selected slot
    last: Option<u32>,
    /// Number of attached clients
    attached_clients: usize,
    /// Activity stamp, bumped whenever the session is used
    activity: u64,
    /// When created
    created_at: SystemTime,
}

impl Session {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: SessionId::new_v4(),
            name: name.into(),
            winlinks: BTreeMap::new(),
            current: None,
            last: None,
            attached_clients: 0,
            activity: 0,
            created_at: SystemTime::now(),
        }
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Get session name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Get winlink count
    pub fn window_count(&self) -> usize {
        self.winlinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winlinks.is_empty()
    }

    /// Iterate over winlinks in slot order
    pub fn winlinks(&self) -> impl Iterator<Item = (u32, WindowId)> + '_ {
        self.winlinks.iter().map(|(&idx, &window)| (idx, window))
    }

    /// Window shown in a slot
    pub fn window_at(&self, index: u32) -> Option<WindowId> {
        self.winlinks.get(&index).copied()
    }

    /// Whether any slot shows `window`
    pub fn contains_window(&self, window: WindowId) -> bool {
        self.winlinks.values().any(|&w| w == window)
    }

    /// Currently selected slot
    pub fn current_index(&self) -> Option<u32> {
        self.current
    }

    /// Window in the currently selected slot
    pub fn current_window(&self) -> Option<WindowId> {
        self.current.and_then(|idx| self.window_at(idx))
    }

    /// Previously selected slot
    pub fn last_index(&self) -> Option<u32> {
        self.last
    }

    /// Lowest unused slot at or above `base`
    ///
    /// `None` when every slot from `base` up to [`MAX_INDEX`] is taken.
    pub fn first_free_index(&self, base: u32) -> Option<u32> {
        (base..=MAX_INDEX).find(|index| !self.winlinks.contains_key(index))
    }

    /// Slot after the current one, wrapping to the first
    ///
    /// `None` when there is no other slot to move to.
    pub fn next_index(&self) -> Option<u32> {
        let current = self.current?;
        self.winlinks
            .range(current.saturating_add(1)..)
            .next()
            .or_else(|| self.winlinks.iter().next())
            .map(|(&idx, _)| idx)
            .filter(|&idx| idx != current)
    }

    /// Slot before the current one, wrapping to the last
    pub fn previous_index(&self) -> Option<u32> {
        let current = self.current?;
        self.winlinks
            .range(..current)
            .next_back()
            .or_else(|| self.winlinks.iter().next_back())
            .map(|(&idx, _)| idx)
            .filter(|&idx| idx != current)
    }

    /// Get attached client count
    pub fn attached_clients(&self) -> usize {
        self.attached_clients
    }

    /// Increment attached clients
    pub fn attach_client(&mut self) {
        self.attached_clients += 1;
    }

    /// Decrement attached clients
    pub fn detach_client(&mut self) {
        self.attached_clients = self.attached_clients.saturating_sub(1);
    }

    /// Activity stamp; larger is more recent
    pub fn activity(&self) -> u64 {
        self.activity
    }

    pub(crate) fn set_activity(&mut self, activity: u64) {
        self.activity = activity;
    }

    /// Get creation time
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Make `index` current; the old current slot becomes last
    ///
    /// Returns false if the slot is empty. Selecting the current slot is a
    /// no-op that succeeds.
    pub(crate) fn select(&mut self, index: u32) -> bool {
        if !self.winlinks.contains_key(&index) {
            return false;
        }
        if self.current != Some(index) {
            self.last = self.current;
            self.current = Some(index);
        }
        true
    }

    /// Put `window` in an empty slot
    pub(crate) fn insert(&mut self, index: u32, window: WindowId) {
        self.winlinks.insert(index, window);
        if self.current.is_none() {
            self.current = Some(index);
        }
    }

    /// Replace the window shown in an occupied slot, returning the old one
    pub(crate) fn replace(&mut self, index: u32, window: WindowId) -> Option<WindowId> {
        self.winlinks
            .get_mut(&index)
            .map(|slot| std::mem::replace(slot, window))
    }

    /// Empty a slot, moving current/last pointers off it
    pub(crate) fn remove(&mut self, index: u32) -> Option<WindowId> {
        let window = self.winlinks.remove(&index)?;

        if self.last == Some(index) {
            self.last = None;
        }
        if self.current == Some(index) {
            self.current = self
                .last
                .take()
                .or_else(|| self.winlinks.keys().next().copied());
        }

        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(indices: &[u32]) -> Session {
        let mut session = Session::new("test");
        for &idx in indices {
            session.insert(idx, WindowId::new_v4());
        }
        session
    }

    #[test]
    fn test_first_insert_becomes_current() {
        let session = session_with(&[3, 5]);
        assert_eq!(session.current_index(), Some(3));
        assert_eq!(session.last_index(), None);
    }

    #[test]
    fn test_select_tracks_last() {
        let mut session = session_with(&[0, 1, 2]);

        assert!(session.select(2));
        assert_eq!(session.current_index(), Some(2));
        assert_eq!(session.last_index(), Some(0));

        // Reselecting current leaves last alone
        assert!(session.select(2));
        assert_eq!(session.last_index(), Some(0));

        assert!(!session.select(9));
        assert_eq!(session.current_index(), Some(2));
    }

    #[test]
    fn test_next_and_previous_wrap() {
        let mut session = session_with(&[0, 4, 7]);

        assert_eq!(session.next_index(), Some(4));
        assert_eq!(session.previous_index(), Some(7));

        session.select(7);
        assert_eq!(session.next_index(), Some(0));
        assert_eq!(session.previous_index(), Some(4));
    }

    #[test]
    fn test_next_with_single_window() {
        let session = session_with(&[0]);
        assert_eq!(session.next_index(), None);
        assert_eq!(session.previous_index(), None);
    }

    #[test]
    fn test_first_free_index() {
        let session = session_with(&[0, 1, 3]);
        assert_eq!(session.first_free_index(0), Some(2));
        assert_eq!(session.first_free_index(3), Some(4));
        assert_eq!(session.first_free_index(10), Some(10));
    }

    #[test]
    fn test_first_free_index_stops_at_max() {
        let session = session_with(&[MAX_INDEX - 1, MAX_INDEX]);
        assert_eq!(session.first_free_index(MAX_INDEX - 2), Some(MAX_INDEX - 2));
        assert_eq!(session.first_free_index(MAX_INDEX - 1), None);
        assert_eq!(session.first_free_index(MAX_INDEX), None);
        assert_eq!(session.first_free_index(u32::MAX), None);
    }

    #[test]
    fn test_remove_current_falls_back_to_last() {
        let mut session = session_with(&[0, 1, 2]);
        session.select(2);

        session.remove(2);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.last_index(), None);
    }

    #[test]
    fn test_remove_current_without_last() {
        let mut session = session_with(&[0, 1]);

        session.remove(0);
        assert_eq!(session.current_index(), Some(1));

        session.remove(1);
        assert_eq!(session.current_index(), None);
        assert!(session.is_empty());
    }

    #[test]
    fn test_replace_keeps_pointers() {
        let mut session = session_with(&[0, 1]);
        session.select(1);
        let old = session.window_at(0).unwrap();
        let new = WindowId::new_v4();

        assert_eq!(session.replace(0, new), Some(old));
        assert_eq!(session.window_at(0), Some(new));
        assert_eq!(session.current_index(), Some(1));
        assert_eq!(session.last_index(), Some(0));
        assert_eq!(session.replace(5, new), None);
    }
}
