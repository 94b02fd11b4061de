//! Initial schema: users and chirps

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::HashedPassword, 255).not_null())
                    .col(boolean(User::IsChirpyRed).not_null().default(false))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(User::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create chirps table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Chirp::Table)
                    .if_not_exists()
                    .col(uuid(Chirp::Id).primary_key())
                    .col(text(Chirp::Body).not_null())
                    .col(uuid(Chirp::UserId).not_null())
                    .col(
                        timestamp_with_time_zone(Chirp::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Chirp::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chirps_user_id")
                            .from(Chirp::Table, Chirp::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_chirps_user_id")
                    .table(Chirp::Table)
                    .col(Chirp::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_chirps_created_at")
                    .table(Chirp::Table)
                    .col(Chirp::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chirp::Table).if_exists().to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(User::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    HashedPassword,
    IsChirpyRed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Chirp {
    #[sea_orm(iden = "chirps")]
    Table,
    Id,
    Body,
    UserId,
    CreatedAt,
    UpdatedAt,
}
