/// Identifier → session mapping
use std::collections::HashMap;

use crate::app_state::Session;

/// Plain map from session identifier to the live session.
///
/// It enforces nothing beyond map semantics. The `SessionManager` owns the
/// only instance, behind a mutex, and is responsible for close-before-replace.
#[derive(Debug)]
pub struct SessionRegistry<S = Session> {
    sessions: HashMap<String, S>,
}

impl<S> SessionRegistry<S> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Insert `session` under `id`, returning whatever was there before.
    pub fn put(&mut self, id: impl Into<String>, session: S) -> Option<S> {
        self.sessions.insert(id.into(), session)
    }

    pub fn get(&self, id: &str) -> Option<&S> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut S> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<S> {
        self.sessions.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn values(&self) -> impl Iterator<Item = &S> {
        self.sessions.values()
    }
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
