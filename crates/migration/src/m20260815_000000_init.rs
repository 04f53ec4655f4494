//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for Oraculum:
//!
//! - `users`: authentication, role, credit balance
//! - `readers`: reader availability profile and weekly schedule
//! - `readings`: booking records with escrowed credits and lifecycle status

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Password,
    Role,
    Credits,
}

#[derive(Iden)]
enum Readers {
    Table,
    UserId,
    Status,
    InstantBooking,
    TimeZone,
    Schedule,
}

#[derive(Iden)]
enum Readings {
    Table,
    Id,
    ClientId,
    ReaderId,
    Topic,
    Question,
    Kind,
    BasePrice,
    DurationMinutes,
    TimeSpanLabel,
    Multiplier,
    FinalPrice,
    Credits,
    Status,
    ScheduledAt,
    TimeZone,
    ReadingLink,
    Review,
    DisputeReason,
    DisputeStatus,
    DisputeAdminResponse,
    CreatedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(
                        ColumnDef::new(Users::Credits)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Readers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Readers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Readers::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Readers::Status).string().not_null())
                    .col(
                        ColumnDef::new(Readers::InstantBooking)
                            .boolean()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Readers::TimeZone).string().not_null())
                    .col(ColumnDef::new(Readers::Schedule).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-readers-user_id")
                            .from(Readers::Table, Readers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Readings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Readings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Readings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Readings::ClientId).string().not_null())
                    .col(ColumnDef::new(Readings::ReaderId).string().not_null())
                    .col(ColumnDef::new(Readings::Topic).string().not_null())
                    .col(ColumnDef::new(Readings::Question).string())
                    .col(ColumnDef::new(Readings::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Readings::BasePrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Readings::DurationMinutes)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Readings::TimeSpanLabel)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Readings::Multiplier).double().not_null())
                    .col(
                        ColumnDef::new(Readings::FinalPrice)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Readings::Credits).big_integer().not_null())
                    .col(ColumnDef::new(Readings::Status).string().not_null())
                    .col(ColumnDef::new(Readings::ScheduledAt).timestamp())
                    .col(ColumnDef::new(Readings::TimeZone).string().not_null())
                    .col(ColumnDef::new(Readings::ReadingLink).string())
                    .col(ColumnDef::new(Readings::Review).string())
                    .col(ColumnDef::new(Readings::DisputeReason).string())
                    .col(ColumnDef::new(Readings::DisputeStatus).string())
                    .col(ColumnDef::new(Readings::DisputeAdminResponse).string())
                    .col(ColumnDef::new(Readings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Readings::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-readings-client_id")
                            .from(Readings::Table, Readings::ClientId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-readings-reader_id")
                            .from(Readings::Table, Readings::ReaderId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-readings-client_id")
                    .table(Readings::Table)
                    .col(Readings::ClientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-readings-reader_id-status")
                    .table(Readings::Table)
                    .col(Readings::ReaderId)
                    .col(Readings::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Readings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Readers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
