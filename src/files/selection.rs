//! Multi-select state
//!
//! Every way of changing the selection goes through [`Selection::apply`], so
//! the explicit mode switch and the modified click cannot drift apart: a toggle
//! always enables selection mode in the same step that adds the name.

use serde::Serialize;

use super::types::Entry;

/// One input to the selection state machine
#[derive(Debug, Clone, Copy)]
pub enum SelectionInput<'a> {
    /// Explicit selection-mode switch; switching off also clears
    SetMode(bool),
    /// Checkbox, ctrl/cmd-click, or any click while in selection mode
    Toggle(&'a str),
    /// "Select all" checkbox: selects every listed entry, or clears when all
    /// are already selected
    ToggleAll(&'a [Entry]),
    /// Drop every name, stay in the current mode
    Clear,
    /// Drop every name and leave selection mode
    Reset,
    /// Keep only names still present in a refreshed listing
    Retain(&'a [Entry]),
}

/// Selected entry names, in the order they were selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    names: Vec<String>,
    mode: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one input. Returns whether anything changed.
    pub fn apply(&mut self, input: SelectionInput<'_>) -> bool {
        let before = self.clone();
        match input {
            SelectionInput::SetMode(on) => {
                self.mode = on;
                if !on {
                    self.names.clear();
                }
            }
            SelectionInput::Toggle(name) => {
                self.mode = true;
                if let Some(idx) = self.names.iter().position(|n| n == name) {
                    self.names.remove(idx);
                } else {
                    self.names.push(name.to_string());
                }
            }
            SelectionInput::ToggleAll(listing) => {
                if self.all_selected(listing) {
                    self.names.clear();
                } else {
                    self.names = listing.iter().map(|e| e.name.clone()).collect();
                }
            }
            SelectionInput::Clear => self.names.clear(),
            SelectionInput::Reset => {
                self.names.clear();
                self.mode = false;
            }
            SelectionInput::Retain(listing) => {
                self.names
                    .retain(|name| listing.iter().any(|e| &e.name == name));
            }
        }
        *self != before
    }

    /// Toggle `name`, entering selection mode if needed. Returns whether the
    /// name is selected afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        self.apply(SelectionInput::Toggle(name));
        self.is_selected(name)
    }

    /// Select everything in `listing`, or clear if it is all selected already.
    pub fn select_all(&mut self, listing: &[Entry]) {
        self.apply(SelectionInput::ToggleAll(listing));
    }

    pub fn clear(&mut self) {
        self.apply(SelectionInput::Clear);
    }

    pub fn reset(&mut self) {
        self.apply(SelectionInput::Reset);
    }

    pub fn set_mode(&mut self, on: bool) {
        self.apply(SelectionInput::SetMode(on));
    }

    pub fn retain_listed(&mut self, listing: &[Entry]) {
        self.apply(SelectionInput::Retain(listing));
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Whether selection mode is on (independent of having any names).
    pub fn is_active(&self) -> bool {
        self.mode
    }

    /// Whether every entry of a listing is selected. An empty listing counts
    /// as fully selected so that toggle-all on it stays a no-op.
    pub fn all_selected(&self, listing: &[Entry]) -> bool {
        listing.iter().all(|e| self.is_selected(&e.name))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
