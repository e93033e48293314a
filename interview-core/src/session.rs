use interview_types::{InterviewMode, Question};

pub const MIN_QUESTION_COUNT: u32 = 3;
pub const MAX_QUESTION_COUNT: u32 = 7;

const MIN_QUESTION_SECONDS: i32 = 120;
const MAX_QUESTION_SECONDS: i32 = 420;

/// Resolve the question count for a new session: an explicit request wins,
/// otherwise the user's preferred count, otherwise 3; always clamped to [3,7].
pub fn resolve_question_count(requested: Option<u32>, preferred_count: u32) -> u32 {
    let fallback = if preferred_count > 0 { preferred_count } else { 3 };
    let count = requested.filter(|c| *c > 0).unwrap_or(fallback);
    count.clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT)
}

/// Per-question countdown budget in seconds. Untimed sessions carry no budget.
///
/// Base duration is keyed by experience level, adjusted for question load
/// (long sessions get a little less per question, short ones a little more),
/// then clamped to [120, 420].
pub fn per_question_time_seconds(
    mode: InterviewMode,
    experience_level: &str,
    total_questions: u32,
) -> i32 {
    match mode {
        InterviewMode::Untimed => 0,
        InterviewMode::Timed => {
            let base = match experience_level {
                "Fresher" => 150,
                "1-3 years" => 210,
                "3-5 years" => 300,
                "5+ years" => 360,
                _ => 210,
            };
            let load_adjustment = if total_questions >= 6 {
                -20
            } else if total_questions <= 4 {
                15
            } else {
                0
            };
            (base + load_adjustment).clamp(MIN_QUESTION_SECONDS, MAX_QUESTION_SECONDS)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub average: f64,
    pub answered: usize,
}

/// Mean score over questions that carry an answer. No answers is a defined
/// zero case, not a division error.
pub fn aggregate_score(questions: &[Question]) -> ScoreSummary {
    let answered: Vec<&Question> = questions
        .iter()
        .filter(|q| !q.user_answer.is_empty())
        .collect();

    if answered.is_empty() {
        return ScoreSummary {
            average: 0.0,
            answered: 0,
        };
    }

    let total: f64 = answered.iter().map(|q| q.score).sum();
    ScoreSummary {
        average: total / answered.len() as f64,
        answered: answered.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answer: &str, score: f64) -> Question {
        let mut q = Question::unanswered("Explain indexing strategies.".to_string());
        q.user_answer = answer.to_string();
        q.score = score;
        q
    }

    #[test]
    fn test_question_count_clamping() {
        // Explicit requests are clamped into [3,7]
        assert_eq!(resolve_question_count(Some(8), 3), 7);
        assert_eq!(resolve_question_count(Some(1), 3), 3);
        assert_eq!(resolve_question_count(Some(5), 3), 5);

        // Absent request falls back to the preference, still clamped
        assert_eq!(resolve_question_count(None, 6), 6);
        assert_eq!(resolve_question_count(None, 9), 7);
        assert_eq!(resolve_question_count(None, 0), 3);

        // A zero request is treated as absent
        assert_eq!(resolve_question_count(Some(0), 4), 4);
    }

    #[test]
    fn test_time_budget_by_experience() {
        assert_eq!(
            per_question_time_seconds(InterviewMode::Timed, "Fresher", 5),
            150
        );
        assert_eq!(
            per_question_time_seconds(InterviewMode::Timed, "1-3 years", 5),
            210
        );
        assert_eq!(
            per_question_time_seconds(InterviewMode::Timed, "3-5 years", 5),
            300
        );
        assert_eq!(
            per_question_time_seconds(InterviewMode::Timed, "5+ years", 5),
            360
        );
        // Unknown levels use the mid-tier fallback
        assert_eq!(
            per_question_time_seconds(InterviewMode::Timed, "Principal", 5),
            210
        );
    }

    #[test]
    fn test_time_budget_load_adjustment() {
        // Six or more questions shave 20 seconds each
        assert_eq!(
            per_question_time_seconds(InterviewMode::Timed, "Fresher", 6),
            130
        );
        // Four or fewer add 15
        assert_eq!(
            per_question_time_seconds(InterviewMode::Timed, "Fresher", 3),
            165
        );
        // Clamped at the floor even for short-budget levels
        assert_eq!(
            per_question_time_seconds(InterviewMode::Timed, "Fresher", 7),
            130
        );
    }

    #[test]
    fn test_untimed_has_no_budget() {
        assert_eq!(
            per_question_time_seconds(InterviewMode::Untimed, "5+ years", 5),
            0
        );
    }

    #[test]
    fn test_aggregate_score_mean_over_answered() {
        let questions = vec![
            question("Use b-tree indexes.", 8.0),
            question("", 0.0),
            question("Depends on cardinality.", 6.0),
        ];
        let summary = aggregate_score(&questions);
        assert_eq!(summary.answered, 2);
        assert!((summary.average - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregate_score_no_answers_is_zero() {
        let questions = vec![question("", 0.0), question("", 0.0)];
        let summary = aggregate_score(&questions);
        assert_eq!(summary.answered, 0);
        assert_eq!(summary.average, 0.0);
    }
}
