//! Create notification table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Notification::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notification::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notification::RecipientId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::RecipientType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notification::SenderId).string_len(32))
                    .col(ColumnDef::new(Notification::SenderType).string_len(16))
                    .col(
                        ColumnDef::new(Notification::NotificationType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::Priority)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::Title)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::Message)
                            .string_len(1000)
                            .not_null(),
                    )
                    // Weak references into the order domain; those tables are
                    // not owned by this service, so no foreign keys.
                    .col(ColumnDef::new(Notification::OrderId).string_len(32))
                    .col(ColumnDef::new(Notification::CommentId).string_len(32))
                    .col(ColumnDef::new(Notification::ProductId).string_len(32))
                    .col(ColumnDef::new(Notification::Data).json_binary())
                    .col(
                        ColumnDef::new(Notification::Channels)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notification::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Notification::ReadAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Notification::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Notification::MaxAttempts)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(Notification::LastAttemptAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Notification::NextAttemptAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Notification::ScheduledFor).timestamp_with_time_zone())
                    .col(ColumnDef::new(Notification::ExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Notification::ProcessingUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Notification::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (recipient_id, recipient_type) (for per-recipient listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_recipient")
                    .table(Notification::Table)
                    .col(Notification::RecipientId)
                    .col(Notification::RecipientType)
                    .to_owned(),
            )
            .await?;

        // Index: (recipient_id, is_read) (for unread count)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_recipient_is_read")
                    .table(Notification::Table)
                    .col(Notification::RecipientId)
                    .col(Notification::IsRead)
                    .to_owned(),
            )
            .await?;

        // Index: (status, next_attempt_at) (for the retry sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_status_next_attempt")
                    .table(Notification::Table)
                    .col(Notification::Status)
                    .col(Notification::NextAttemptAt)
                    .to_owned(),
            )
            .await?;

        // Index: (status, scheduled_for) (for the deferred-send sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_status_scheduled_for")
                    .table(Notification::Table)
                    .col(Notification::Status)
                    .col(Notification::ScheduledFor)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for pagination)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_created_at")
                    .table(Notification::Table)
                    .col(Notification::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: expires_at (for expiry cleanup)
        manager
            .create_index(
                Index::create()
                    .name("idx_notification_expires_at")
                    .table(Notification::Table)
                    .col(Notification::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Notification {
    Table,
    Id,
    RecipientId,
    RecipientType,
    SenderId,
    SenderType,
    NotificationType,
    Priority,
    Title,
    Message,
    OrderId,
    CommentId,
    ProductId,
    Data,
    Channels,
    Status,
    IsRead,
    ReadAt,
    Attempts,
    MaxAttempts,
    LastAttemptAt,
    NextAttemptAt,
    ScheduledFor,
    ExpiresAt,
    ProcessingUntil,
    CreatedAt,
}
