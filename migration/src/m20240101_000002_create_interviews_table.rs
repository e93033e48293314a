use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Interviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Interviews::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Interviews::UserId).uuid().not_null())
                    .col(ColumnDef::new(Interviews::Role).string().not_null())
                    .col(
                        ColumnDef::new(Interviews::ExperienceLevel)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Interviews::IndustryMode)
                            .string()
                            .not_null()
                            .default("Product company"),
                    )
                    .col(
                        ColumnDef::new(Interviews::InterviewMode)
                            .string()
                            .not_null()
                            .default("timed"),
                    )
                    .col(
                        ColumnDef::new(Interviews::PerQuestionTimeSeconds)
                            .integer()
                            .not_null()
                            .default(180),
                    )
                    .col(
                        ColumnDef::new(Interviews::Score)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Interviews::Status)
                            .string()
                            .not_null()
                            .default("in-progress"),
                    )
                    .col(ColumnDef::new(Interviews::EndedReason).string().null())
                    .col(
                        ColumnDef::new(Interviews::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Interviews::Questions).json().not_null())
                    .col(
                        ColumnDef::new(Interviews::OverallFeedback)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Interviews::Revision)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Interviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Interviews::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_interviews_user_id")
                            .from(Interviews::Table, Interviews::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on user_id for per-user listings
        manager
            .create_index(
                Index::create()
                    .name("idx_interviews_user_id")
                    .table(Interviews::Table)
                    .col(Interviews::UserId)
                    .to_owned(),
            )
            .await?;

        // Create index on status for the abandoned-session sweep
        manager
            .create_index(
                Index::create()
                    .name("idx_interviews_status")
                    .table(Interviews::Table)
                    .col(Interviews::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Interviews::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Interviews {
    Table,
    Id,
    UserId,
    Role,
    ExperienceLevel,
    IndustryMode,
    InterviewMode,
    PerQuestionTimeSeconds,
    Score,
    Status,
    EndedReason,
    CompletedAt,
    Questions,
    OverallFeedback,
    Revision,
    CreatedAt,
    UpdatedAt,
}
