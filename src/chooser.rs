//! Modal list chooser: the selection protocol.
//!
//! A single-session state machine over a snapshot of candidate names. Each
//! key event either advances the cursor or ends the session with a verdict.
//! No terminal types appear here; `ui` owns rendering and raw-mode input and
//! feeds plain `Key` events in.
//!
//! Three modes:
//! - select: pick one of N existing nodes, cursor over N names.
//! - insert: pick one of N+1 gaps for a pending node; the cursor position
//!   shows the pending name as a placeholder among the N names.
//! - move: same gap arithmetic over the list with the moved node taken out;
//!   the cursor starts at the node's original position.

use tracing::trace;

/// Logical key events the session accepts. Anything else is ignored upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChooserMode {
    Select,
    Insert,
    Move,
}

/// Committed result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// select mode: index into the candidate list
    Node(usize),
    /// insert/move mode: gap index into the (post-removal) child list
    Slot(usize),
    /// Escape; the caller must treat this as "no action taken"
    Cancelled,
}

/// One open selection session.
#[derive(Debug, Clone)]
pub struct Chooser {
    mode: ChooserMode,
    cursor: usize,
    /// Names of the fixed candidates (for move mode: minus the moved node)
    names: Vec<String>,
    /// Pending node's display name, shown at the cursor in insert/move mode
    pending: Option<String>,
}

impl Chooser {
    /// Select mode over `names`; commits the candidate under the cursor.
    pub fn select(names: Vec<String>) -> Self {
        Self {
            mode: ChooserMode::Select,
            cursor: 0,
            names,
            pending: None,
        }
    }

    /// Insert mode: choose one of `names.len() + 1` gaps for `pending`.
    pub fn insert(names: Vec<String>, pending: impl Into<String>) -> Self {
        Self {
            mode: ChooserMode::Insert,
            cursor: 0,
            names,
            pending: Some(pending.into()),
        }
    }

    /// Move mode: `names` must already exclude the moved node; the cursor
    /// starts where the node used to sit so "Enter immediately" is a no-op
    /// move back to its own position.
    pub fn moving(names: Vec<String>, pending: impl Into<String>, from: usize) -> Self {
        let cursor = from.min(names.len());
        Self {
            mode: ChooserMode::Move,
            cursor,
            names,
            pending: Some(pending.into()),
        }
    }

    pub fn mode(&self) -> ChooserMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Highest cursor value for this mode: last candidate in select mode,
    /// last gap otherwise.
    fn max_cursor(&self) -> usize {
        match self.mode {
            ChooserMode::Select => self.names.len().saturating_sub(1),
            ChooserMode::Insert | ChooserMode::Move => self.names.len(),
        }
    }

    /// Feeds one key event. `None` means the session stays open; Up/Down
    /// clamp at the bounds without wrapping.
    pub fn handle(&mut self, key: Key) -> Option<Verdict> {
        trace!(?key, cursor = self.cursor, "chooser event");
        match key {
            Key::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            Key::Down => {
                if self.cursor < self.max_cursor() {
                    self.cursor += 1;
                }
                None
            }
            Key::Enter => Some(match self.mode {
                // Nothing to commit over an empty candidate list
                ChooserMode::Select if self.names.is_empty() => Verdict::Cancelled,
                ChooserMode::Select => Verdict::Node(self.cursor),
                ChooserMode::Insert | ChooserMode::Move => Verdict::Slot(self.cursor),
            }),
            Key::Escape => Some(Verdict::Cancelled),
        }
    }

    /// Runs the session to completion over an event stream. A stream that
    /// ends without Enter or Escape counts as a cancellation.
    pub fn run(mut self, events: impl IntoIterator<Item = Key>) -> Verdict {
        for key in events {
            if let Some(verdict) = self.handle(key) {
                return verdict;
            }
        }
        Verdict::Cancelled
    }

    /// Current list as display lines: `(text, under_cursor)` pairs. In
    /// insert/move mode the pending name appears in braces at the cursor gap
    /// and the remaining names flow around it.
    pub fn lines(&self) -> Vec<(String, bool)> {
        match self.mode {
            ChooserMode::Select => self
                .names
                .iter()
                .enumerate()
                .map(|(i, name)| (format!("-> {name}"), i == self.cursor))
                .collect(),
            ChooserMode::Insert | ChooserMode::Move => {
                let pending = self.pending.as_deref().unwrap_or("");
                (0..=self.names.len())
                    .map(|i| {
                        if i == self.cursor {
                            (format!("-> {{{pending}}}"), true)
                        } else if i < self.cursor {
                            (format!("-> {}", self.names[i]), false)
                        } else {
                            // Slots past the cursor display the name shifted
                            // up by the placeholder row
                            (format!("-> {}", self.names[i - 1]), false)
                        }
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_commits_cursor_candidate() {
        let verdict = Chooser::select(names(&["A", "B", "C"]))
            .run([Key::Down, Key::Down, Key::Enter]);
        assert_eq!(verdict, Verdict::Node(2));
    }

    #[test]
    fn test_select_down_clamps_at_last_candidate() {
        let verdict = Chooser::select(names(&["A", "B"]))
            .run([Key::Down, Key::Down, Key::Down, Key::Enter]);
        assert_eq!(verdict, Verdict::Node(1));
    }

    #[test]
    fn test_insert_lines_show_placeholder_at_cursor() {
        let mut chooser = Chooser::insert(names(&["A", "B"]), "X");
        chooser.handle(Key::Down);
        let lines = chooser.lines();
        assert_eq!(
            lines,
            vec![
                ("-> A".to_string(), false),
                ("-> {X}".to_string(), true),
                ("-> B".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_move_cursor_starts_at_original_position() {
        let chooser = Chooser::moving(names(&["A", "C"]), "B", 1);
        assert_eq!(chooser.cursor(), 1);
    }

    #[test]
    fn test_exhausted_stream_cancels() {
        let verdict = Chooser::select(names(&["A"])).run([Key::Down]);
        assert_eq!(verdict, Verdict::Cancelled);
    }
}
