use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

use crate::model::{ProgressId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown content type: {0}")]
pub struct UnknownContentType(pub String);

/// Kind of activity a progress point was earned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentType {
    Article,
    Meditation,
    Feed,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Meditation => "meditation",
            ContentType::Feed => "feed",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(Self::Article),
            "meditation" => Ok(Self::Meditation),
            "feed" => Ok(Self::Feed),
            other => Err(UnknownContentType(other.to_owned())),
        }
    }
}

/// A "this user made progress" event sent to the progress tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub user_id: UserId,
    pub content_type: ContentType,
    pub points_collected: u32,
}

impl ProgressEvent {
    /// One point for finishing an article quiz, regardless of score.
    #[must_use]
    pub fn quiz_completed(user_id: UserId) -> Self {
        Self {
            user_id,
            content_type: ContentType::Article,
            points_collected: 1,
        }
    }
}

/// A recorded progress event as returned by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub id: ProgressId,
    pub user_id: UserId,
    pub content_type: ContentType,
    pub points_collected: u32,
    pub date: DateTime<Utc>,
}

/// Daily objectives: one of each content type within the last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyObjectives {
    pub read_article: bool,
    pub meditated: bool,
    pub posted_on_feed: bool,
}

impl DailyObjectives {
    #[must_use]
    pub fn all_met(&self) -> bool {
        self.read_article && self.meditated && self.posted_on_feed
    }
}

/// Aggregated view over a user's progress entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSummary {
    pub total_points: u64,
    pub article_points: u64,
    pub meditation_points: u64,
    pub feed_points: u64,
    pub objectives: DailyObjectives,
    /// Consecutive calendar days (UTC) with at least one entry, ending today or yesterday.
    pub streak_days: u32,
}

impl ProgressSummary {
    #[must_use]
    pub fn from_entries(entries: &[ProgressEntry], now: DateTime<Utc>) -> Self {
        let mut summary = Self::default();
        let day_ago = now - Duration::days(1);
        let mut active_days = BTreeSet::new();

        for entry in entries {
            let points = u64::from(entry.points_collected);
            summary.total_points = summary.total_points.saturating_add(points);
            match entry.content_type {
                ContentType::Article => summary.article_points += points,
                ContentType::Meditation => summary.meditation_points += points,
                ContentType::Feed => summary.feed_points += points,
            }

            if entry.date >= day_ago && entry.date <= now {
                match entry.content_type {
                    ContentType::Article => summary.objectives.read_article = true,
                    ContentType::Meditation => summary.objectives.meditated = true,
                    ContentType::Feed => summary.objectives.posted_on_feed = true,
                }
            }

            active_days.insert(entry.date.date_naive());
        }

        summary.streak_days = streak_ending(&active_days, now.date_naive());
        summary
    }
}

fn streak_ending(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let start = if active_days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if active_days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0_u32;
    let mut day = Some(start);
    while let Some(d) = day {
        if !active_days.contains(&d) {
            break;
        }
        streak = streak.saturating_add(1);
        day = d.pred_opt();
    }
    streak
}
