//! Candidate menu
//!
//! Turns a list of continuations into selectable options. Display labels are
//! 1-based (`Child 1`), identifiers are the 0-based position as a string, so a
//! click maps straight back to the candidate it was generated for.

use crate::{LoomError, Result};
use serde::{Deserialize, Serialize};

/// Prefix on every preview so empty continuations still render
pub const PREVIEW_PREFIX: char = '\u{200b}';

/// One selectable continuation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    /// Button/field label, e.g. `Child 1`
    pub label: String,
    /// Identifier sent back on selection, e.g. `0`
    pub custom_id: String,
    /// Continuation text as shown to the user
    pub preview: String,
}

/// Ordered options attached to a rendered message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub options: Vec<MenuOption>,
}

impl Menu {
    /// Build a menu preserving candidate order
    pub fn from_candidates(candidates: &[String]) -> Self {
        let options = candidates
            .iter()
            .enumerate()
            .map(|(i, candidate)| MenuOption {
                label: format!("Child {}", i + 1),
                custom_id: i.to_string(),
                preview: format!("{PREVIEW_PREFIX}{candidate}"),
            })
            .collect();
        Self { options }
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Continuation text at `index`, without the preview prefix
    pub fn candidate(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(|option| {
            option
                .preview
                .strip_prefix(PREVIEW_PREFIX)
                .unwrap_or(&option.preview)
        })
    }

    /// Resolve a selection identifier to an index on this menu
    pub fn resolve(&self, custom_id: &str) -> Result<usize> {
        let index: usize = custom_id
            .trim()
            .parse()
            .map_err(|_| LoomError::InvalidSelection(format!("'{custom_id}' is not an option id")))?;
        if index >= self.options.len() {
            return Err(LoomError::InvalidSelection(format!(
                "option {} out of range ({} options)",
                index,
                self.options.len()
            )));
        }
        Ok(index)
    }
}
