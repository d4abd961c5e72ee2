use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::repository::Table;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: Option<i32>,
    /// Percentage (0-100) needed to pass
    pub passing_score: Option<f64>,
    pub is_published: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exam {
    /// Published and inside its availability window
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_published
            && self.starts_at.map_or(true, |start| now >= start)
            && self.ends_at.map_or(true, |end| now <= end)
    }
}

impl Table for Exam {
    const TABLE: &'static str = "exams";
    const NAME: &'static str = "Exam";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn exam(published: bool, starts: Option<i64>, ends: Option<i64>) -> Exam {
        let now = Utc::now();
        Exam {
            id: Uuid::new_v4(),
            title: "Algebra".into(),
            description: None,
            duration_minutes: None,
            passing_score: None,
            is_published: published,
            starts_at: starts.map(|h| now + Duration::hours(h)),
            ends_at: ends.map(|h| now + Duration::hours(h)),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn open_only_when_published_and_in_window() {
        let now = Utc::now();
        assert!(exam(true, None, None).is_open_at(now));
        assert!(!exam(false, None, None).is_open_at(now));
        assert!(exam(true, Some(-1), Some(1)).is_open_at(now));
        assert!(!exam(true, Some(1), None).is_open_at(now));
        assert!(!exam(true, None, Some(-1)).is_open_at(now));
    }
}
