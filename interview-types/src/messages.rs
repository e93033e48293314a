use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{IndustryMode, Interview, InterviewMode, User};

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub experience_level: Option<String>,
    pub industry_mode: Option<IndustryMode>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GoogleLoginRequest {
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateProfileRequest {
    pub role: Option<String>,
    pub experience_level: Option<String>,
    pub industry_mode: Option<IndustryMode>,
    pub settings: Option<SettingsPatch>,
}

/// Partial settings update; absent fields keep their stored values.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettingsPatch {
    pub notifications: Option<bool>,
    pub dark_mode: Option<bool>,
    pub preferred_question_count: Option<u32>,
    pub notification_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TestEmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StartInterviewRequest {
    pub role: Option<String>,
    pub experience_level: Option<String>,
    pub industry_mode: Option<IndustryMode>,
    pub question_count: Option<u32>,
    pub interview_mode: Option<InterviewMode>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AnswerRequest {
    pub question_id: Option<Uuid>,
    pub answer_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinishRequest {
    pub ended_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GamificationSummary {
    pub xp_gain: i32,
    pub streak_count: i32,
    pub longest_streak: i32,
    pub level: i32,
    pub xp: i32,
    pub badges: Vec<String>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinishResponse {
    pub interview: Interview,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamification: Option<GamificationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LevelProgress {
    pub current_level_xp: i32,
    pub xp_for_next: i32,
    pub progress_percent: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    pub total_interviews: usize,
    pub average_score: f64,
    pub strongest_role: String,
    pub weakest_role: String,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummaryResponse {
    pub user: User,
    pub level_progress: LevelProgress,
    pub stats: DashboardStats,
    pub recent_interviews: Vec<Interview>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TranscriptionResponse {
    pub text: String,
}
