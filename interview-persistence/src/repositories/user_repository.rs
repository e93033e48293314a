use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::{prelude::*, users};
use interview_core::ProgressUpdate;
use interview_types::{IndustryMode, User, UserSettings};

pub struct UserRepository {
    db: DatabaseConnection,
}

/// Registration payload; the password is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub experience_level: String,
    pub industry_mode: IndustryMode,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_user(model: users::Model) -> User {
        let badges: Vec<String> = serde_json::from_value(model.badges).unwrap_or_default();
        let settings: UserSettings =
            serde_json::from_value(model.settings).unwrap_or_default();

        User {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            experience_level: model.experience_level,
            industry_mode: IndustryMode::parse(&model.industry_mode).unwrap_or_default(),
            streak_count: model.streak_count,
            longest_streak: model.longest_streak,
            last_interview_date: model.last_interview_date.map(|d| d.to_rfc3339()),
            xp: model.xp,
            level: model.level,
            badges,
            settings,
            created_at: model.created_at.to_rfc3339(),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user_model = Users::find_by_id(id).one(&self.db).await?;
        Ok(user_model.map(Self::model_to_user))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user_model = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(user_model.map(Self::model_to_user))
    }

    /// Login lookup: the profile plus the stored credential hash.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        let user_model = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(user_model.map(|model| {
            let hash = model.password_hash.clone();
            (Self::model_to_user(model), hash)
        }))
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();
        let id = Uuid::new_v4();

        let user_model = users::ActiveModel {
            id: sea_orm::ActiveValue::Set(id),
            email: sea_orm::ActiveValue::Set(new_user.email),
            name: sea_orm::ActiveValue::Set(new_user.name),
            password_hash: sea_orm::ActiveValue::Set(new_user.password_hash),
            role: sea_orm::ActiveValue::Set(new_user.role),
            experience_level: sea_orm::ActiveValue::Set(new_user.experience_level),
            industry_mode: sea_orm::ActiveValue::Set(new_user.industry_mode.as_str().to_string()),
            streak_count: sea_orm::ActiveValue::Set(0),
            longest_streak: sea_orm::ActiveValue::Set(0),
            last_interview_date: sea_orm::ActiveValue::Set(None),
            xp: sea_orm::ActiveValue::Set(0),
            level: sea_orm::ActiveValue::Set(1),
            badges: sea_orm::ActiveValue::Set(serde_json::json!([])),
            settings: sea_orm::ActiveValue::Set(serde_json::to_value(UserSettings::default())?),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
        };

        Users::insert(user_model).exec(&self.db).await?;

        // Fetch the created user
        let created_user = Users::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created user"))?;

        Ok(Self::model_to_user(created_user))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        role: Option<String>,
        experience_level: Option<String>,
        industry_mode: Option<IndustryMode>,
        settings: Option<UserSettings>,
    ) -> Result<User> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found"))?;

        let mut active: users::ActiveModel = user.into();
        if let Some(role) = role {
            active.role = sea_orm::ActiveValue::Set(role);
        }
        if let Some(experience_level) = experience_level {
            active.experience_level = sea_orm::ActiveValue::Set(experience_level);
        }
        if let Some(industry_mode) = industry_mode {
            active.industry_mode = sea_orm::ActiveValue::Set(industry_mode.as_str().to_string());
        }
        if let Some(settings) = settings {
            active.settings = sea_orm::ActiveValue::Set(serde_json::to_value(settings)?);
        }
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());

        let updated = Users::update(active).exec(&self.db).await?;
        Ok(Self::model_to_user(updated))
    }

    /// Write back one completed session's gamification outcome.
    pub async fn apply_progress(&self, user_id: Uuid, update: &ProgressUpdate) -> Result<()> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found"))?;

        let mut active: users::ActiveModel = user.into();
        active.streak_count = sea_orm::ActiveValue::Set(update.streak_count);
        active.longest_streak = sea_orm::ActiveValue::Set(update.longest_streak);
        active.last_interview_date =
            sea_orm::ActiveValue::Set(Some(update.last_interview_date.into()));
        active.xp = sea_orm::ActiveValue::Set(update.xp);
        active.level = sea_orm::ActiveValue::Set(update.level);
        active.badges = sea_orm::ActiveValue::Set(serde_json::to_value(&update.badges)?);
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().into());

        Users::update(active).exec(&self.db).await?;
        Ok(())
    }
}
