use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use interview_core::{
    GamificationEngine, ProgressSnapshot, aggregate_score, build_summary_email,
    per_question_time_seconds, resolve_question_count,
};
use interview_persistence::repositories::{
    InterviewRepository, NewInterview, SaveOutcome, UserRepository,
};
use interview_types::{
    EndedReason, GamificationSummary, IndustryMode, Interview, InterviewMode, InterviewStatus,
    OverallFeedback, Question, User,
};

use crate::email::Mailer;
use crate::oracle::{OracleError, QuestionOracle};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Interview not found")]
    InterviewNotFound,
    #[error("Question not found")]
    QuestionNotFound,
    #[error("Not authorized")]
    NotOwner,
    #[error("Interview already completed")]
    AlreadyCompleted,
    #[error("Failed to generate interview questions")]
    Generation,
    #[error("Failed to evaluate answer")]
    Evaluation,
    #[error("Interview was updated concurrently")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Validated inputs for a new session.
#[derive(Debug, Clone)]
pub struct StartParams {
    pub role: String,
    pub experience_level: String,
    pub industry_mode: Option<IndustryMode>,
    pub question_count: Option<u32>,
    pub interview_mode: Option<InterviewMode>,
}

#[derive(Debug)]
pub enum FinishOutcome {
    /// Finish on a completed interview is a no-op returning the stored record.
    AlreadyCompleted(Interview),
    Completed {
        interview: Interview,
        gamification: GamificationSummary,
    },
}

/// Orchestrates the interview lifecycle: creation, per-question answering,
/// timed-mode deferred scoring, completion with gamification and the
/// summary email.
pub struct SessionService {
    interviews: Arc<InterviewRepository>,
    users: Arc<UserRepository>,
    oracle: Arc<dyn QuestionOracle>,
    mailer: Arc<dyn Mailer>,
}

impl SessionService {
    pub fn new(
        interviews: Arc<InterviewRepository>,
        users: Arc<UserRepository>,
        oracle: Arc<dyn QuestionOracle>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            interviews,
            users,
            oracle,
            mailer,
        }
    }

    pub async fn start(&self, user: &User, params: StartParams) -> Result<Interview, SessionError> {
        let total_questions = resolve_question_count(
            params.question_count,
            user.settings.preferred_question_count,
        );
        let industry_mode = params.industry_mode.unwrap_or(user.industry_mode);
        let interview_mode = params.interview_mode.unwrap_or_default();
        let per_question_seconds = per_question_time_seconds(
            interview_mode,
            &params.experience_level,
            total_questions,
        );

        let question_texts = self
            .oracle
            .generate_questions(
                &format!("{} ({})", params.role, industry_mode.as_str()),
                &params.experience_level,
                total_questions,
            )
            .await
            .map_err(|e| {
                tracing::error!("Question generation failed: {}", e);
                SessionError::Generation
            })?;

        let questions: Vec<Question> =
            question_texts.into_iter().map(Question::unanswered).collect();

        let interview = self
            .interviews
            .create_interview(NewInterview {
                user_id: user.id,
                role: params.role,
                experience_level: params.experience_level,
                industry_mode,
                interview_mode,
                per_question_time_seconds: per_question_seconds,
                questions,
            })
            .await?;

        Ok(interview)
    }

    pub async fn submit_answer(
        &self,
        user: &User,
        interview_id: Uuid,
        question_id: Uuid,
        answer_text: String,
    ) -> Result<Question, SessionError> {
        let mut interview = self.owned_interview(user, interview_id).await?;
        if interview.is_completed() {
            return Err(SessionError::AlreadyCompleted);
        }

        let index = interview
            .questions
            .iter()
            .position(|q| q.id == question_id)
            .ok_or(SessionError::QuestionNotFound)?;
        interview.questions[index].user_answer = answer_text;

        match interview.interview_mode {
            InterviewMode::Timed => {
                // Scoring is deferred to finish; the answer is stored bare.
                interview.questions[index].clear_evaluation();
            }
            InterviewMode::Untimed => {
                let question_text = interview.questions[index].question_text.clone();
                let user_answer = interview.questions[index].user_answer.clone();

                let evaluation = self
                    .oracle
                    .evaluate_answer(&question_text, &user_answer)
                    .await
                    .map_err(|e: OracleError| {
                        tracing::error!("Answer evaluation failed: {}", e);
                        SessionError::Evaluation
                    })?;

                let question = &mut interview.questions[index];
                question.score = evaluation.score;
                question.feedback = evaluation.feedback;
                question.strengths = evaluation.strengths;
                question.weaknesses = evaluation.weaknesses;
                question.improvement = evaluation.improvement;
            }
        }

        let saved = self.save_interview(&interview).await?;
        saved
            .questions
            .into_iter()
            .find(|q| q.id == question_id)
            .ok_or(SessionError::QuestionNotFound)
    }

    pub async fn finish(
        &self,
        user: &User,
        interview_id: Uuid,
        ended_reason: EndedReason,
    ) -> Result<FinishOutcome, SessionError> {
        let mut interview = self.owned_interview(user, interview_id).await?;
        if interview.is_completed() {
            return Ok(FinishOutcome::AlreadyCompleted(interview));
        }

        let now = Utc::now();

        // Timed sessions run all deferred analysis here, in question order.
        if interview.interview_mode == InterviewMode::Timed {
            for question in interview.questions.iter_mut() {
                if !question.is_answered() {
                    continue;
                }
                let evaluation = match self
                    .oracle
                    .evaluate_answer(&question.question_text, &question.user_answer)
                    .await
                {
                    Ok(evaluation) => evaluation,
                    Err(e) => {
                        // Completion must not strand the session; degrade to
                        // the neutral payload and keep going.
                        tracing::warn!("Deferred evaluation failed, using fallback: {}", e);
                        crate::oracle::Evaluation::fallback()
                    }
                };
                question.score = evaluation.score;
                question.feedback = evaluation.feedback;
                question.strengths = evaluation.strengths;
                question.weaknesses = evaluation.weaknesses;
                question.improvement = evaluation.improvement;
            }
        }

        let summary = aggregate_score(&interview.questions);
        interview.score = summary.average;
        interview.status = InterviewStatus::Completed;
        interview.completed_at = Some(now.to_rfc3339());
        interview.ended_reason = Some(ended_reason);
        interview.overall_feedback = OverallFeedback::completion_template();

        let interview = self.save_interview(&interview).await?;

        let snapshot = ProgressSnapshot {
            streak_count: user.streak_count,
            longest_streak: user.longest_streak,
            xp: user.xp,
            badges: user.badges.clone(),
            last_interview_date: user
                .last_interview_date
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|d| d.with_timezone(&Utc)),
        };
        let update =
            GamificationEngine::apply_completion(&snapshot, now, summary.average, summary.answered);
        self.users.apply_progress(user.id, &update).await?;

        let gamification = GamificationSummary {
            xp_gain: update.xp_gain,
            streak_count: update.streak_count,
            longest_streak: update.longest_streak,
            level: update.level,
            xp: update.xp,
            badges: update.badges.clone(),
        };

        self.send_summary_email(user, &interview, summary.average, ended_reason)
            .await;

        Ok(FinishOutcome::Completed {
            interview,
            gamification,
        })
    }

    /// Force-complete every stale in-progress session of this user. This is
    /// the authoritative abandonment path; the client's keepalive finish is
    /// best-effort only.
    pub async fn sweep_abandoned(&self, user: &User) -> Result<u64, SessionError> {
        let swept = self.interviews.abandon_in_progress(user.id).await?;
        if swept > 0 {
            tracing::info!("Swept {} abandoned interview(s) for user {}", swept, user.id);
        }
        Ok(swept)
    }

    /// Sweep stale sessions, then list.
    pub async fn list_interviews(
        &self,
        user: &User,
        status: Option<InterviewStatus>,
        limit: u64,
    ) -> Result<Vec<Interview>, SessionError> {
        self.sweep_abandoned(user).await?;

        let interviews = self
            .interviews
            .list_for_user(user.id, status, Some(limit))
            .await?;
        Ok(interviews)
    }

    pub async fn fetch(&self, user: &User, interview_id: Uuid) -> Result<Interview, SessionError> {
        self.owned_interview(user, interview_id).await
    }

    async fn owned_interview(
        &self,
        user: &User,
        interview_id: Uuid,
    ) -> Result<Interview, SessionError> {
        let interview = self
            .interviews
            .find_by_id(interview_id)
            .await?
            .ok_or(SessionError::InterviewNotFound)?;

        if interview.user_id != user.id {
            return Err(SessionError::NotOwner);
        }
        Ok(interview)
    }

    async fn save_interview(&self, interview: &Interview) -> Result<Interview, SessionError> {
        match self.interviews.save(interview).await? {
            SaveOutcome::Saved(saved) => Ok(saved),
            SaveOutcome::RevisionConflict => Err(SessionError::Conflict),
        }
    }

    /// Email failures never fail the finish operation.
    async fn send_summary_email(
        &self,
        user: &User,
        interview: &Interview,
        avg_score: f64,
        ended_reason: EndedReason,
    ) {
        if !user.settings.notifications {
            return;
        }
        let to = user.settings.resolve_notification_email(&user.email);
        if to.is_empty() {
            return;
        }

        let email = build_summary_email(interview, avg_score, ended_reason);
        if let Err(e) = self.mailer.send(to, &email.subject, &email.text).await {
            tracing::error!("Failed to send interview summary email: {}", e);
        }
    }
}
