//! Cascading selectors: Department → Course → [Semester] → Subject → Papers.
//!
//! Each [`Level`] holds the current selection and the option list fetched
//! for it.  Changing a selection resets every level below it; a reset or a
//! new fetch bumps the level's generation, so a result carrying an older
//! [`Ticket`] is discarded instead of overwriting newer state.

use tracing::debug;

use qparchive_common::protocol::{Course, Department, Id, Paper, Subject};

/// Something that can appear in a selector.
pub trait Choice {
    type Key: Copy + PartialEq + std::fmt::Debug + std::fmt::Display;

    fn key(&self) -> Self::Key;
    fn label(&self) -> String;
}

impl Choice for Department {
    type Key = Id;

    fn key(&self) -> Id {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Choice for Course {
    type Key = Id;

    fn key(&self) -> Id {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Choice for Subject {
    type Key = Id;

    fn key(&self) -> Id {
        self.id
    }

    fn label(&self) -> String {
        format!("{} (Sem {})", self.name, self.semester)
    }
}

impl Choice for Paper {
    type Key = Id;

    fn key(&self) -> Id {
        self.id
    }

    fn label(&self) -> String {
        self.original_name.clone()
    }
}

/// Semester numbers.
impl Choice for u8 {
    type Key = u8;

    fn key(&self) -> u8 {
        *self
    }

    fn label(&self) -> String {
        self.to_string()
    }
}

/// Proof that a fetch was started for a particular generation of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Ticket {
    generation: u64,
}

/// One selector in the chain.
#[derive(Debug, Clone)]
pub struct Level<T: Choice> {
    selected: Option<T::Key>,
    options: Vec<T>,
    generation: u64,
    loading: bool,
}

impl<T: Choice> Default for Level<T> {
    fn default() -> Self {
        Self {
            selected: None,
            options: Vec::new(),
            generation: 0,
            loading: false,
        }
    }
}

impl<T: Choice> Level<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<T::Key> {
        self.selected
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    /// The option matching the current selection, if it is loaded.
    pub fn selected_option(&self) -> Option<&T> {
        let key = self.selected?;
        self.find(key)
    }

    pub fn find(&self, key: T::Key) -> Option<&T> {
        self.options.iter().find(|o| o.key() == key)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record the selection. Downstream resets are the caller's job.
    pub fn select(&mut self, key: Option<T::Key>) {
        self.selected = key;
    }

    /// Clear selection and options and invalidate any fetch in flight.
    pub fn reset(&mut self) {
        self.selected = None;
        self.options.clear();
        self.loading = false;
        self.generation += 1;
    }

    /// Fill the options without a fetch (static lists).
    pub fn fill(&mut self, options: Vec<T>) {
        self.generation += 1;
        self.loading = false;
        self.options = options;
    }

    /// Start (re)loading the option list. Earlier tickets become stale.
    pub fn begin_load(&mut self) -> Ticket {
        self.generation += 1;
        self.options.clear();
        self.loading = true;
        Ticket {
            generation: self.generation,
        }
    }

    /// Like [`Level::begin_load`] but keeps the current options visible
    /// until the new list arrives (used for refreshes).
    pub fn begin_reload(&mut self) -> Ticket {
        self.generation += 1;
        self.loading = true;
        Ticket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply a successful fetch. Returns `false` if the ticket is stale.
    pub fn accept(&mut self, ticket: Ticket, options: Vec<T>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "Discarding stale options (generation {} != {})",
                ticket.generation, self.generation
            );
            return false;
        }
        self.options = options;
        self.loading = false;
        true
    }

    /// Record a failed fetch: the list stays empty. Returns `false` if stale.
    pub fn reject(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            debug!("Discarding stale failure (generation {})", ticket.generation);
            return false;
        }
        self.options.clear();
        self.loading = false;
        true
    }
}

/// Parse a selector value as typed by the user: empty means "none".
pub fn parse_selection<K: std::str::FromStr>(raw: &str) -> Option<K> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().ok()
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn dept(id: Id, name: &str) -> Department {
        Department {
            id,
            name: name.into(),
            code: String::new(),
        }
    }

    #[test]
    fn test_accept_current_ticket() {
        let mut level = Level::<Department>::new();
        let ticket = level.begin_load();
        assert!(level.is_loading());
        assert!(level.accept(ticket, vec![dept(1, "CS")]));
        assert!(!level.is_loading());
        assert_eq!(level.options().len(), 1);
    }

    #[test]
    fn test_latest_request_wins() {
        let mut level = Level::<Department>::new();
        let first = level.begin_load();
        let second = level.begin_load();

        // The newer response lands first, then the stale one.
        assert!(level.accept(second, vec![dept(2, "EE")]));
        assert!(!level.accept(first, vec![dept(1, "CS")]));
        assert_eq!(level.options()[0].id, 2);
        assert!(!level.reject(first));
        assert_eq!(level.options().len(), 1);
    }

    #[test]
    fn test_reset_invalidates_in_flight() {
        let mut level = Level::<Department>::new();
        let ticket = level.begin_load();
        level.reset();
        assert!(!level.accept(ticket, vec![dept(1, "CS")]));
        assert!(level.options().is_empty());
        assert!(!level.is_loading());
    }

    #[test]
    fn test_reload_keeps_options_until_result() {
        let mut level = Level::<Department>::new();
        let t = level.begin_load();
        assert!(level.accept(t, vec![dept(1, "CS"), dept(2, "EE")]));
        level.select(Some(2));
        assert_eq!(level.selected_option().unwrap().name, "EE");

        let t = level.begin_reload();
        assert_eq!(level.options().len(), 2);
        assert!(level.accept(t, vec![dept(1, "CS")]));
        assert!(level.selected_option().is_none());
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection::<Id>(""), None);
        assert_eq!(parse_selection::<Id>(" 12 "), Some(12));
        assert_eq!(parse_selection::<u8>("x"), None);
    }
}
