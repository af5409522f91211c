// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyboard cursor over the suggestion list

use serde::{Deserialize, Serialize};

/// Keys the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

/// Active-suggestion index, `None` meaning no selection
///
/// The cursor is not reset when the list changes underneath it, so it can
/// point past the end; [`Cursor::pick`] is the guarded read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor(Option<usize>);

impl Cursor {
    pub const NONE: Cursor = Cursor(None);

    pub fn at(index: usize) -> Self {
        Cursor(Some(index))
    }

    /// Index as the host sees it, `-1` for no selection
    pub fn index(&self) -> i64 {
        self.0.map_or(-1, |i| i as i64)
    }

    pub fn down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let last = len - 1;
        self.0 = Some(match self.0 {
            None => 0,
            Some(i) => (i + 1).min(last),
        });
    }

    pub fn up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let last = len - 1;
        self.0 = Some(match self.0 {
            None => 0,
            Some(i) => i.saturating_sub(1).min(last),
        });
    }

    /// The selected entry, if the cursor is on one
    pub fn pick<'a>(&self, list: &'a [String]) -> Option<&'a str> {
        self.0.and_then(|i| list.get(i)).map(String::as_str)
    }
}
