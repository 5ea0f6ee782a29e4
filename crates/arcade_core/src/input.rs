use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::dispatch::EventKey;

/// Platform key code. The values follow the AWT virtual-key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const SPACE: KeyCode = KeyCode(32);
    pub const LEFT: KeyCode = KeyCode(37);
    pub const UP: KeyCode = KeyCode(38);
    pub const RIGHT: KeyCode = KeyCode(39);
    pub const DOWN: KeyCode = KeyCode(40);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn pressed(code: KeyCode) -> Self {
        Self {
            code,
            state: KeyState::Pressed,
        }
    }

    pub fn released(code: KeyCode) -> Self {
        Self {
            code,
            state: KeyState::Released,
        }
    }
}

/// Buffers key events between ticks.
///
/// Every press enqueues its key (repeats re-apply the same action). The
/// release that leaves no key held enqueues [`EventKey::NoInput`]. Releasing
/// a key that is not held is ignored.
#[derive(Debug, Default)]
pub struct InputQueue {
    held: HashSet<KeyCode>,
    pending: VecDeque<EventKey>,
}

impl InputQueue {
    pub fn push(&mut self, event: KeyEvent) {
        match event.state {
            KeyState::Pressed => {
                self.held.insert(event.code);
                self.pending.push_back(EventKey::Key(event.code));
            }
            KeyState::Released => {
                if self.held.remove(&event.code) && self.held.is_empty() {
                    self.pending.push_back(EventKey::NoInput);
                }
            }
        }
    }

    pub fn drain(&mut self) -> Vec<EventKey> {
        self.pending.drain(..).collect()
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.held.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_enqueues_key_and_last_release_enqueues_no_input() {
        let mut queue = InputQueue::default();
        queue.push(KeyEvent::pressed(KeyCode::LEFT));
        queue.push(KeyEvent::pressed(KeyCode::SPACE));
        queue.push(KeyEvent::released(KeyCode::LEFT));
        assert!(queue.is_held(KeyCode::SPACE));
        queue.push(KeyEvent::released(KeyCode::SPACE));

        assert_eq!(
            queue.drain(),
            vec![
                EventKey::Key(KeyCode::LEFT),
                EventKey::Key(KeyCode::SPACE),
                EventKey::NoInput,
            ]
        );
        assert_eq!(queue.held_count(), 0);
        assert_eq!(queue.pending_len(), 0);
    }

    #[test]
    fn stray_release_does_not_emit_no_input() {
        let mut queue = InputQueue::default();
        queue.push(KeyEvent::released(KeyCode::UP));
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn key_repeat_counts_as_one_held_key() {
        let mut queue = InputQueue::default();
        queue.push(KeyEvent::pressed(KeyCode::RIGHT));
        queue.push(KeyEvent::pressed(KeyCode::RIGHT));
        queue.push(KeyEvent::released(KeyCode::RIGHT));

        let drained = queue.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained.last(), Some(&EventKey::NoInput));
    }
}
