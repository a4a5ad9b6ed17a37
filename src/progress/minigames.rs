//! Minigame result log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::history::push_capped;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameResult {
    pub id: String,
    /// Minigame identifier, e.g. "word-match"
    pub game: String,
    pub score: u32,
    pub max_score: u32,
    pub played_at: DateTime<Utc>,
}

impl MinigameResult {
    /// Score as a fraction of the maximum (0.0 - 1.0)
    pub fn accuracy(&self) -> f64 {
        if self.max_score == 0 {
            0.0
        } else {
            (f64::from(self.score) / f64::from(self.max_score)).min(1.0)
        }
    }
}

/// Append a result, keeping at most `limit` entries (oldest dropped first).
pub fn record_minigame_result(
    results: &mut Vec<MinigameResult>,
    result: MinigameResult,
    limit: usize,
) {
    push_capped(results, result, limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn result(n: u32, start: DateTime<Utc>) -> MinigameResult {
        MinigameResult {
            id: format!("game-{}", n),
            game: "word-match".to_string(),
            score: n,
            max_score: 100,
            played_at: start + Duration::minutes(i64::from(n)),
        }
    }

    #[test]
    fn test_log_capped_at_fifty() {
        let start = Utc::now();
        let mut results = Vec::new();
        for n in 1..=55 {
            record_minigame_result(&mut results, result(n, start), 50);
        }

        assert_eq!(results.len(), 50);
        assert_eq!(results[0].id, "game-6");
        assert_eq!(results[49].id, "game-55");
    }

    #[test]
    fn test_accuracy_bounds() {
        let start = Utc::now();
        let mut r = result(40, start);
        assert!((r.accuracy() - 0.4).abs() < 1e-9);
        r.max_score = 0;
        assert_eq!(r.accuracy(), 0.0);
        r.max_score = 10;
        assert_eq!(r.accuracy(), 1.0);
    }
}
