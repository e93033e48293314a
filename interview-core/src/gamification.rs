use chrono::{DateTime, Utc};
use interview_types::LevelProgress;

pub const BADGE_FIRST_STEPS: &str = "First Steps";
pub const BADGE_SHARP_THINKER: &str = "Sharp Thinker";
pub const BADGE_CONSISTENCY_CHAMP: &str = "Consistency Champ";
pub const BADGE_LEVEL_GRINDER: &str = "Level Grinder";

const XP_PER_LEVEL: i32 = 100;

/// The gamification fields of a user, read before completion.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub streak_count: i32,
    pub longest_streak: i32,
    pub xp: i32,
    pub badges: Vec<String>,
    pub last_interview_date: Option<DateTime<Utc>>,
}

/// The same fields after completion, plus the XP delta awarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub streak_count: i32,
    pub longest_streak: i32,
    pub xp: i32,
    pub level: i32,
    pub xp_gain: i32,
    pub badges: Vec<String>,
    pub last_interview_date: DateTime<Utc>,
}

pub struct GamificationEngine;

impl GamificationEngine {
    /// Apply one completed session to a user's progress. Pure: the caller
    /// persists the returned fields.
    pub fn apply_completion(
        snapshot: &ProgressSnapshot,
        now: DateTime<Utc>,
        avg_score: f64,
        answered_count: usize,
    ) -> ProgressUpdate {
        let streak_count = Self::next_streak(snapshot.streak_count, snapshot.last_interview_date, now);
        let longest_streak = snapshot.longest_streak.max(streak_count);

        let xp_gain = Self::xp_gain(avg_score, answered_count);
        let xp = snapshot.xp + xp_gain;
        let level = Self::level_for_xp(xp);

        let mut badges = snapshot.badges.clone();
        let mut grant = |badge: &str| {
            if !badges.iter().any(|b| b == badge) {
                badges.push(badge.to_string());
            }
        };
        grant(BADGE_FIRST_STEPS);
        if avg_score >= 8.0 {
            grant(BADGE_SHARP_THINKER);
        }
        if streak_count >= 3 {
            grant(BADGE_CONSISTENCY_CHAMP);
        }
        if level >= 5 {
            grant(BADGE_LEVEL_GRINDER);
        }

        ProgressUpdate {
            streak_count,
            longest_streak,
            xp,
            level,
            xp_gain,
            badges,
            last_interview_date: now,
        }
    }

    /// Streaks move at calendar-day granularity: consecutive days extend,
    /// a gap resets, a second completion on the same day changes nothing.
    fn next_streak(
        current: i32,
        last_interview_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> i32 {
        let Some(previous) = last_interview_date else {
            return 1;
        };

        let days_since_last = (now.date_naive() - previous.date_naive()).num_days();
        if days_since_last == 1 {
            current + 1
        } else if days_since_last > 1 {
            1
        } else {
            current
        }
    }

    /// Every completed session is worth at least 10 XP.
    fn xp_gain(avg_score: f64, answered_count: usize) -> i32 {
        let earned = (avg_score * 10.0).round() as i32 + answered_count as i32 * 5;
        earned.max(10)
    }

    fn level_for_xp(xp: i32) -> i32 {
        (xp / XP_PER_LEVEL + 1).max(1)
    }

    pub fn level_progress(xp: i32, level: i32) -> LevelProgress {
        let current_level_base = (level - 1) * XP_PER_LEVEL;
        let current_level_xp = (xp - current_level_base).max(0);
        let progress_percent =
            (((current_level_xp as f64 / XP_PER_LEVEL as f64) * 100.0).round() as i32).min(100);
        LevelProgress {
            current_level_xp,
            xp_for_next: XP_PER_LEVEL,
            progress_percent,
        }
    }
}
