//! Create recipient table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Recipient::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Recipient::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Recipient::RecipientType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Recipient::DisplayName)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Recipient::Email).string_len(254))
                    .col(ColumnDef::new(Recipient::Phone).string_len(32))
                    .col(
                        ColumnDef::new(Recipient::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Recipient::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (recipient_type, is_active) (for active-admin fan-out)
        manager
            .create_index(
                Index::create()
                    .name("idx_recipient_type_is_active")
                    .table(Recipient::Table)
                    .col(Recipient::RecipientType)
                    .col(Recipient::IsActive)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Recipient::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Recipient {
    Table,
    Id,
    RecipientType,
    DisplayName,
    Email,
    Phone,
    IsActive,
    CreatedAt,
}
