//! Initial schema migration - creates all tables from scratch.
//!
//! - `profiles`: registered accounts, bearer token and verified phone
//! - `transaction_participants`: people taking part in shared transactions
//! - `settlement_participants`: sender and receiver of settlements
//! - `subscriptions`: server copy of subscriptions
//! - `subscription_subscribers`: non-member subscribers keyed by phone hash
//! - `subscription_participants`: materialized subscriber shares
//! - `shared_reminders`: payment reminders addressed by phone hash
//!
//! Every ledger table carries a phone hash column next to a nullable owner
//! column; claims fill the owner in.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Profiles {
    Table,
    Id,
    DisplayName,
    ApiToken,
    Phone,
    PhoneHash,
    PendingPhone,
    PhoneStatus,
    Deleted,
    MergedInto,
    MergedAt,
    CreatedAt,
}

#[derive(Iden)]
enum TransactionParticipants {
    Table,
    Id,
    TransactionId,
    PhoneHash,
    ProfileId,
    DisplayName,
    AmountMinor,
    Currency,
}

#[derive(Iden)]
enum SettlementParticipants {
    Table,
    Id,
    SettlementId,
    Role,
    PhoneHash,
    ProfileId,
    AmountMinor,
    Currency,
}

#[derive(Iden)]
enum Subscriptions {
    Table,
    Id,
    OwnerProfileId,
    Name,
    Cycle,
    CustomCycleDays,
    CostMinor,
    Currency,
    IsShared,
    IsActive,
    IsArchived,
}

#[derive(Iden)]
enum SubscriptionSubscribers {
    Table,
    Id,
    SubscriptionId,
    DisplayName,
    PhoneHash,
    ShareMinor,
}

#[derive(Iden)]
enum SubscriptionParticipants {
    Table,
    Id,
    SubscriptionId,
    PhoneHash,
    ProfileId,
    DisplayName,
    ShareMinor,
}

#[derive(Iden)]
enum SharedReminders {
    Table,
    Id,
    CreatedBy,
    ToPhoneHash,
    ToProfileId,
    AmountMinor,
    Currency,
    Message,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Profiles
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profiles::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profiles::DisplayName).string().not_null())
                    .col(ColumnDef::new(Profiles::ApiToken).string().not_null())
                    .col(ColumnDef::new(Profiles::Phone).string())
                    .col(ColumnDef::new(Profiles::PhoneHash).string())
                    .col(ColumnDef::new(Profiles::PendingPhone).string())
                    .col(
                        ColumnDef::new(Profiles::PhoneStatus)
                            .string()
                            .not_null()
                            .default("unverified"),
                    )
                    .col(
                        ColumnDef::new(Profiles::Deleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Profiles::MergedInto).string())
                    .col(ColumnDef::new(Profiles::MergedAt).timestamp())
                    .col(ColumnDef::new(Profiles::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-profiles-api_token-unique")
                    .table(Profiles::Table)
                    .col(Profiles::ApiToken)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // At most one profile bears a phone hash; tombstones have it cleared.
        manager
            .create_index(
                Index::create()
                    .name("idx-profiles-phone_hash-unique")
                    .table(Profiles::Table)
                    .col(Profiles::PhoneHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Transaction participants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TransactionParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionParticipants::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionParticipants::TransactionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionParticipants::PhoneHash).string())
                    .col(ColumnDef::new(TransactionParticipants::ProfileId).string())
                    .col(
                        ColumnDef::new(TransactionParticipants::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionParticipants::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionParticipants::Currency)
                            .string()
                            .not_null()
                            .default("CHF"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_participants-profile_id")
                            .from(
                                TransactionParticipants::Table,
                                TransactionParticipants::ProfileId,
                            )
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_participants-phone_hash")
                    .table(TransactionParticipants::Table)
                    .col(TransactionParticipants::PhoneHash)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_participants-transaction_id")
                    .table(TransactionParticipants::Table)
                    .col(TransactionParticipants::TransactionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Settlement participants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SettlementParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SettlementParticipants::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SettlementParticipants::SettlementId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementParticipants::Role)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SettlementParticipants::PhoneHash).string())
                    .col(ColumnDef::new(SettlementParticipants::ProfileId).string())
                    .col(
                        ColumnDef::new(SettlementParticipants::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementParticipants::Currency)
                            .string()
                            .not_null()
                            .default("CHF"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlement_participants-profile_id")
                            .from(
                                SettlementParticipants::Table,
                                SettlementParticipants::ProfileId,
                            )
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlement_participants-phone_hash")
                    .table(SettlementParticipants::Table)
                    .col(SettlementParticipants::PhoneHash)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Subscriptions and their subscribers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::OwnerProfileId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Subscriptions::Name).string().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::Cycle)
                            .string()
                            .not_null()
                            .default("monthly"),
                    )
                    .col(ColumnDef::new(Subscriptions::CustomCycleDays).integer())
                    .col(
                        ColumnDef::new(Subscriptions::CostMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::Currency)
                            .string()
                            .not_null()
                            .default("CHF"),
                    )
                    .col(ColumnDef::new(Subscriptions::IsShared).boolean().not_null())
                    .col(ColumnDef::new(Subscriptions::IsActive).boolean().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::IsArchived)
                            .boolean()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-subscriptions-owner_profile_id")
                            .from(Subscriptions::Table, Subscriptions::OwnerProfileId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-subscriptions-owner_profile_id")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::OwnerProfileId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubscriptionSubscribers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubscriptionSubscribers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionSubscribers::SubscriptionId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionSubscribers::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SubscriptionSubscribers::PhoneHash).string())
                    .col(
                        ColumnDef::new(SubscriptionSubscribers::ShareMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-subscription_subscribers-subscription_id")
                            .from(
                                SubscriptionSubscribers::Table,
                                SubscriptionSubscribers::SubscriptionId,
                            )
                            .to(Subscriptions::Table, Subscriptions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-subscription_subscribers-subscription_id")
                    .table(SubscriptionSubscribers::Table)
                    .col(SubscriptionSubscribers::SubscriptionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Subscription participants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SubscriptionParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubscriptionParticipants::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionParticipants::SubscriptionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SubscriptionParticipants::PhoneHash).string())
                    .col(ColumnDef::new(SubscriptionParticipants::ProfileId).string())
                    .col(
                        ColumnDef::new(SubscriptionParticipants::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionParticipants::ShareMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-subscription_participants-subscription_id")
                            .from(
                                SubscriptionParticipants::Table,
                                SubscriptionParticipants::SubscriptionId,
                            )
                            .to(Subscriptions::Table, Subscriptions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-subscription_participants-profile_id")
                            .from(
                                SubscriptionParticipants::Table,
                                SubscriptionParticipants::ProfileId,
                            )
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-subscription_participants-phone_hash")
                    .table(SubscriptionParticipants::Table)
                    .col(SubscriptionParticipants::PhoneHash)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-subscription_participants-subscription_id-phone_hash")
                    .table(SubscriptionParticipants::Table)
                    .col(SubscriptionParticipants::SubscriptionId)
                    .col(SubscriptionParticipants::PhoneHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Shared reminders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SharedReminders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SharedReminders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SharedReminders::CreatedBy).string().not_null())
                    .col(ColumnDef::new(SharedReminders::ToPhoneHash).string())
                    .col(ColumnDef::new(SharedReminders::ToProfileId).string())
                    .col(
                        ColumnDef::new(SharedReminders::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SharedReminders::Currency)
                            .string()
                            .not_null()
                            .default("CHF"),
                    )
                    .col(ColumnDef::new(SharedReminders::Message).string())
                    .col(
                        ColumnDef::new(SharedReminders::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shared_reminders-created_by")
                            .from(SharedReminders::Table, SharedReminders::CreatedBy)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shared_reminders-to_profile_id")
                            .from(SharedReminders::Table, SharedReminders::ToProfileId)
                            .to(Profiles::Table, Profiles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shared_reminders-to_phone_hash")
                    .table(SharedReminders::Table)
                    .col(SharedReminders::ToPhoneHash)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(SharedReminders::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(SubscriptionParticipants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(SubscriptionSubscribers::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(SettlementParticipants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(TransactionParticipants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        Ok(())
    }
}
