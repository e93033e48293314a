use chrono::{DateTime, Utc};
use interview_types::{EndedReason, Interview};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
}

/// Plaintext session summary sent after completion.
pub fn build_summary_email(
    interview: &Interview,
    avg_score: f64,
    ended_reason: EndedReason,
) -> EmailContent {
    let answered_count = interview
        .questions
        .iter()
        .filter(|q| !q.user_answer.is_empty())
        .count();

    let ended_line = match ended_reason {
        EndedReason::Manual => "Your interview was submitted.".to_string(),
        other => format!("Your interview was ended ({}).", other.as_str()),
    };

    let mut lines = vec![
        ended_line,
        format!("Role: {}", interview.role),
        format!("Experience: {}", interview.experience_level),
        format!("Industry: {}", interview.industry_mode.as_str()),
        format!("Mode: {}", interview.interview_mode.as_str()),
        format!(
            "Attempted Questions: {}/{}",
            answered_count,
            interview.questions.len()
        ),
        format!("Final Score: {avg_score:.1}/10"),
        String::new(),
        "Per-question analysis:".to_string(),
    ];

    for (index, question) in interview.questions.iter().enumerate() {
        let answer_status = if question.user_answer.trim().is_empty() {
            "Not answered"
        } else {
            "Answered"
        };
        let feedback = if question.feedback.trim().is_empty() {
            "No feedback available."
        } else {
            question.feedback.as_str()
        };
        lines.push(format!(
            "{}. {}\nStatus: {}\nScore: {:.1}/10\nFeedback: {}",
            index + 1,
            question.question_text,
            answer_status,
            question.score,
            feedback
        ));
    }

    EmailContent {
        subject: format!(
            "InterviewPilot Test Summary - {} ({avg_score:.1}/10)",
            interview.role
        ),
        text: lines.join("\n"),
    }
}

/// Body for the settings-page test notification.
pub fn build_test_email(now: DateTime<Utc>) -> EmailContent {
    EmailContent {
        subject: "InterviewPilot notifications test".to_string(),
        text: format!(
            "This is a test notification from InterviewPilot sent at {}.",
            now.to_rfc2822()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_types::{
        IndustryMode, InterviewMode, InterviewStatus, OverallFeedback, Question,
    };
    use uuid::Uuid;

    fn interview_with_questions(questions: Vec<Question>) -> Interview {
        Interview {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: "Backend".to_string(),
            experience_level: "1-3 years".to_string(),
            industry_mode: IndustryMode::Startup,
            interview_mode: InterviewMode::Timed,
            per_question_time_seconds: 210,
            score: 0.0,
            status: InterviewStatus::Completed,
            ended_reason: Some(EndedReason::Timeout),
            completed_at: None,
            questions,
            overall_feedback: OverallFeedback::completion_template(),
            revision: 1,
            created_at: "2024-03-10T09:00:00Z".to_string(),
            updated_at: "2024-03-10T09:30:00Z".to_string(),
        }
    }

    #[test]
    fn test_summary_subject_and_header_lines() {
        let mut answered = Question::unanswered("Describe a REST API.".to_string());
        answered.user_answer = "Stateless resources over HTTP.".to_string();
        answered.score = 7.0;
        answered.feedback = "Solid".to_string();
        let skipped = Question::unanswered("Explain CAP.".to_string());

        let interview = interview_with_questions(vec![answered, skipped]);
        let email = build_summary_email(&interview, 7.0, EndedReason::Timeout);

        assert_eq!(email.subject, "InterviewPilot Test Summary - Backend (7.0/10)");
        assert!(email.text.starts_with("Your interview was ended (timeout)."));
        assert!(email.text.contains("Attempted Questions: 1/2"));
        assert!(email.text.contains("Final Score: 7.0/10"));
        assert!(email.text.contains("1. Describe a REST API.\nStatus: Answered"));
        assert!(email.text.contains("2. Explain CAP.\nStatus: Not answered"));
        assert!(email.text.contains("Feedback: No feedback available."));
    }

    #[test]
    fn test_manual_finish_reads_as_submitted() {
        let interview = interview_with_questions(vec![]);
        let email = build_summary_email(&interview, 0.0, EndedReason::Manual);
        assert!(email.text.starts_with("Your interview was submitted."));
    }
}
