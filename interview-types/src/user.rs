use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::IndustryMode;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub experience_level: String,
    pub industry_mode: IndustryMode,
    pub streak_count: i32,
    pub longest_streak: i32,
    pub last_interview_date: Option<String>, // ISO 8601 string
    pub xp: i32,
    pub level: i32,
    pub badges: Vec<String>,
    pub settings: UserSettings,
    pub created_at: String, // ISO 8601 string for simplicity
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserSettings {
    pub notifications: bool,
    pub dark_mode: bool,
    pub preferred_question_count: u32,
    pub notification_email: Option<String>,
}

impl UserSettings {
    pub const MIN_QUESTION_COUNT: u32 = 3;
    pub const MAX_QUESTION_COUNT: u32 = 7;

    /// Destination for summary/test emails: override address first, account email otherwise.
    pub fn resolve_notification_email<'a>(&'a self, account_email: &'a str) -> &'a str {
        match self.notification_email.as_deref() {
            Some(email) if !email.trim().is_empty() => email,
            _ => account_email,
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            dark_mode: true,
            preferred_question_count: 3,
            notification_email: None,
        }
    }
}
