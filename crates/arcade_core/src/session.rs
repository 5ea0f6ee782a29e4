/// Per-run state handed explicitly into every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    player_name: String,
    score: u64,
    ticks: u64,
}

impl Session {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            ..Self::default()
        }
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(u64::from(points));
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn award_accumulates() {
        let mut session = Session::new("ada");
        session.award(10);
        session.award(25);
        assert_eq!(session.score(), 35);
        assert_eq!(session.player_name(), "ada");
        assert_eq!(session.ticks(), 0);
    }
}
