use arcade_core::{KeyCode, KeyEvent};

/// Deterministic stand-in for a player at the keyboard.
///
/// Every `period` ticks it turns around (releasing the old direction before
/// pressing the new one) and squeezes the trigger. Every third turn it taps
/// the jump key and lets it go on the following tick.
#[derive(Debug, Clone)]
pub(crate) struct Autopilot {
    period: u64,
    heading: Option<KeyCode>,
    tap_release: Option<(u64, KeyCode)>,
}

impl Autopilot {
    pub(crate) fn new(period: u64) -> Self {
        Self {
            period: period.max(1),
            heading: None,
            tap_release: None,
        }
    }

    /// Key events to inject before simulating `tick`.
    pub(crate) fn events_for(&mut self, tick: u64) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        if let Some((due, code)) = self.tap_release {
            if tick >= due {
                events.push(KeyEvent::released(code));
                self.tap_release = None;
            }
        }
        if tick % self.period != 0 {
            return events;
        }

        let turn = tick / self.period;
        let next = if turn % 2 == 0 {
            KeyCode::LEFT
        } else {
            KeyCode::RIGHT
        };
        if let Some(previous) = self.heading.replace(next) {
            events.push(KeyEvent::released(previous));
        }
        events.push(KeyEvent::pressed(next));
        events.push(KeyEvent::pressed(KeyCode::SPACE));
        events.push(KeyEvent::released(KeyCode::SPACE));
        if turn % 3 == 2 {
            events.push(KeyEvent::pressed(KeyCode::UP));
            self.tap_release = Some((tick + 1, KeyCode::UP));
        }
        events
    }
}
