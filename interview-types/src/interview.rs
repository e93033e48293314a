use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum IndustryMode {
    #[serde(rename = "Product company")]
    ProductCompany,
    #[serde(rename = "Service company")]
    ServiceCompany,
    Startup,
    #[serde(rename = "MNC")]
    Mnc,
}

impl IndustryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndustryMode::ProductCompany => "Product company",
            IndustryMode::ServiceCompany => "Service company",
            IndustryMode::Startup => "Startup",
            IndustryMode::Mnc => "MNC",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Product company" => Some(IndustryMode::ProductCompany),
            "Service company" => Some(IndustryMode::ServiceCompany),
            "Startup" => Some(IndustryMode::Startup),
            "MNC" => Some(IndustryMode::Mnc),
            _ => None,
        }
    }
}

impl Default for IndustryMode {
    fn default() -> Self {
        IndustryMode::ProductCompany
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InterviewMode {
    Timed,
    Untimed,
}

impl InterviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewMode::Timed => "timed",
            InterviewMode::Untimed => "untimed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "timed" => Some(InterviewMode::Timed),
            "untimed" => Some(InterviewMode::Untimed),
            _ => None,
        }
    }
}

impl Default for InterviewMode {
    fn default() -> Self {
        InterviewMode::Timed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum InterviewStatus {
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::InProgress => "in-progress",
            InterviewStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in-progress" => Some(InterviewStatus::InProgress),
            "completed" => Some(InterviewStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EndedReason {
    Manual,
    Timeout,
    Abandoned,
}

impl EndedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndedReason::Manual => "manual",
            EndedReason::Timeout => "timeout",
            EndedReason::Abandoned => "abandoned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(EndedReason::Manual),
            "timeout" => Some(EndedReason::Timeout),
            "abandoned" => Some(EndedReason::Abandoned),
            _ => None,
        }
    }

    /// Unrecognized or absent reasons fall back to a manual finish.
    pub fn parse_or_manual(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(EndedReason::Manual)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    pub user_answer: String,
    pub score: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement: String,
}

impl Question {
    pub fn unanswered(question_text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_text,
            user_answer: String::new(),
            score: 0.0,
            feedback: String::new(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            improvement: String::new(),
        }
    }

    pub fn is_answered(&self) -> bool {
        !self.user_answer.trim().is_empty()
    }

    /// Reset every evaluation field to its unanswered default.
    /// Timed-mode answers stay in this state until the interview finishes.
    pub fn clear_evaluation(&mut self) {
        self.score = 0.0;
        self.feedback.clear();
        self.strengths.clear();
        self.weaknesses.clear();
        self.improvement.clear();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OverallFeedback {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub improvement_plan: String,
}

impl OverallFeedback {
    /// The fixed completion template. Not model-derived.
    pub fn completion_template() -> Self {
        Self {
            strengths: vec!["Communication".to_string()],
            weaknesses: vec!["Review fundamental topics".to_string()],
            improvement_plan: "Keep practicing daily.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Interview {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub experience_level: String,
    pub industry_mode: IndustryMode,
    pub interview_mode: InterviewMode,
    pub per_question_time_seconds: i32,
    pub score: f64,
    pub status: InterviewStatus,
    pub ended_reason: Option<EndedReason>,
    pub completed_at: Option<String>, // ISO 8601 string
    pub questions: Vec<Question>,
    pub overall_feedback: OverallFeedback,
    /// Bumped on every write; saves are rejected when the stored value moved.
    pub revision: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl Interview {
    pub fn is_completed(&self) -> bool {
        self.status == InterviewStatus::Completed
    }

    pub fn question_mut(&mut self, question_id: Uuid) -> Option<&mut Question> {
        self.questions.iter_mut().find(|q| q.id == question_id)
    }
}
