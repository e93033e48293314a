use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::{interviews, prelude::*};
use interview_types::{
    EndedReason, IndustryMode, Interview, InterviewMode, InterviewStatus, OverallFeedback,
    Question,
};

pub struct InterviewRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub user_id: Uuid,
    pub role: String,
    pub experience_level: String,
    pub industry_mode: IndustryMode,
    pub interview_mode: InterviewMode,
    pub per_question_time_seconds: i32,
    pub questions: Vec<Question>,
}

/// Result of a revision-checked save.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved(Interview),
    /// Another write landed between this caller's read and its save.
    RevisionConflict,
}

impl InterviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_interview(model: interviews::Model) -> Interview {
        let questions: Vec<Question> =
            serde_json::from_value(model.questions).unwrap_or_default();
        let overall_feedback: OverallFeedback =
            serde_json::from_value(model.overall_feedback).unwrap_or_default();

        Interview {
            id: model.id,
            user_id: model.user_id,
            role: model.role,
            experience_level: model.experience_level,
            industry_mode: IndustryMode::parse(&model.industry_mode).unwrap_or_default(),
            interview_mode: InterviewMode::parse(&model.interview_mode).unwrap_or_default(),
            per_question_time_seconds: model.per_question_time_seconds,
            score: model.score,
            status: InterviewStatus::parse(&model.status)
                .unwrap_or(InterviewStatus::InProgress),
            ended_reason: model.ended_reason.as_deref().and_then(EndedReason::parse),
            completed_at: model.completed_at.map(|d| d.to_rfc3339()),
            questions,
            overall_feedback,
            revision: model.revision,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }

    pub async fn create_interview(&self, new_interview: NewInterview) -> Result<Interview> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let id = Uuid::new_v4();

        let interview_model = interviews::ActiveModel {
            id: sea_orm::ActiveValue::Set(id),
            user_id: sea_orm::ActiveValue::Set(new_interview.user_id),
            role: sea_orm::ActiveValue::Set(new_interview.role),
            experience_level: sea_orm::ActiveValue::Set(new_interview.experience_level),
            industry_mode: sea_orm::ActiveValue::Set(
                new_interview.industry_mode.as_str().to_string(),
            ),
            interview_mode: sea_orm::ActiveValue::Set(
                new_interview.interview_mode.as_str().to_string(),
            ),
            per_question_time_seconds: sea_orm::ActiveValue::Set(
                new_interview.per_question_time_seconds,
            ),
            score: sea_orm::ActiveValue::Set(0.0),
            status: sea_orm::ActiveValue::Set(InterviewStatus::InProgress.as_str().to_string()),
            ended_reason: sea_orm::ActiveValue::Set(None),
            completed_at: sea_orm::ActiveValue::Set(None),
            questions: sea_orm::ActiveValue::Set(serde_json::to_value(&new_interview.questions)?),
            overall_feedback: sea_orm::ActiveValue::Set(serde_json::to_value(
                OverallFeedback::default(),
            )?),
            revision: sea_orm::ActiveValue::Set(1),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
        };

        Interviews::insert(interview_model).exec(&self.db).await?;

        let created = Interviews::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created interview"))?;

        Ok(Self::model_to_interview(created))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Interview>> {
        let interview_model = Interviews::find_by_id(id).one(&self.db).await?;
        Ok(interview_model.map(Self::model_to_interview))
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<InterviewStatus>,
        limit: Option<u64>,
    ) -> Result<Vec<Interview>> {
        let mut query = Interviews::find()
            .filter(interviews::Column::UserId.eq(user_id))
            .order_by_desc(interviews::Column::UpdatedAt);

        if let Some(status) = status {
            query = query.filter(interviews::Column::Status.eq(status.as_str()));
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(Self::model_to_interview).collect())
    }

    /// Lazy reconciliation: every in-progress interview of this user is
    /// force-completed as abandoned. Returns the number of rows swept.
    pub async fn abandon_in_progress(&self, user_id: Uuid) -> Result<u64> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

        let result = Interviews::update_many()
            .col_expr(
                interviews::Column::Status,
                Expr::value(InterviewStatus::Completed.as_str()),
            )
            .col_expr(
                interviews::Column::EndedReason,
                Expr::value(EndedReason::Abandoned.as_str()),
            )
            .col_expr(interviews::Column::CompletedAt, Expr::value(now))
            .col_expr(interviews::Column::UpdatedAt, Expr::value(now))
            .col_expr(
                interviews::Column::Revision,
                Expr::col(interviews::Column::Revision).add(1),
            )
            .filter(interviews::Column::UserId.eq(user_id))
            .filter(interviews::Column::Status.eq(InterviewStatus::InProgress.as_str()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Persist the mutable fields of an interview. The write only lands when
    /// the stored revision still matches the one this caller read; otherwise
    /// the racing writer wins and the caller gets `RevisionConflict`.
    pub async fn save(&self, interview: &Interview) -> Result<SaveOutcome> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let completed_at = interview
            .completed_at
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok());

        let result = Interviews::update_many()
            .col_expr(interviews::Column::Score, Expr::value(interview.score))
            .col_expr(
                interviews::Column::Status,
                Expr::value(interview.status.as_str()),
            )
            .col_expr(
                interviews::Column::EndedReason,
                Expr::value(interview.ended_reason.map(|r| r.as_str())),
            )
            .col_expr(interviews::Column::CompletedAt, Expr::value(completed_at))
            .col_expr(
                interviews::Column::Questions,
                Expr::value(serde_json::to_value(&interview.questions)?),
            )
            .col_expr(
                interviews::Column::OverallFeedback,
                Expr::value(serde_json::to_value(&interview.overall_feedback)?),
            )
            .col_expr(
                interviews::Column::Revision,
                Expr::value(interview.revision + 1),
            )
            .col_expr(interviews::Column::UpdatedAt, Expr::value(now))
            .filter(interviews::Column::Id.eq(interview.id))
            .filter(interviews::Column::Revision.eq(interview.revision))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(SaveOutcome::RevisionConflict);
        }

        let saved = Interviews::find_by_id(interview.id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Saved interview disappeared"))?;

        Ok(SaveOutcome::Saved(Self::model_to_interview(saved)))
    }
}
