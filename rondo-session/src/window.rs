use std::time::SystemTime;

use crate::WindowId;

/// A unit of display content, shared by reference across sessions
#[derive(Debug)]
pub struct Window {
    /// Unique window identifier
    id: WindowId,
    /// Window name
    name: String,
    /// Number of winlinks pointing at this window
    references: usize,
    /// When created
    created_at: SystemTime,
}

impl Window {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: WindowId::new_v4(),
            name: name.into(),
            references: 0,
            created_at: SystemTime::now(),
        }
    }

    /// Get window ID
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Get window name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of winlinks (across all sessions) showing this window
    pub fn references(&self) -> usize {
        self.references
    }

    pub(crate) fn reference(&mut self) {
        self.references += 1;
    }

    /// Drop one reference, returning the remaining count
    pub(crate) fn release(&mut self) -> usize {
        self.references = self.references.saturating_sub(1);
        self.references
    }

    /// Get creation time
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
}
