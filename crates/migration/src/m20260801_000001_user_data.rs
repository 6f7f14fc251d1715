//! Creates the `user_data` table: one row per synced user holding the
//! whole transaction list and rate table as JSON blobs. The sync contract
//! is whole-blob overwrite, so there is nothing more granular to model.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum UserData {
    Table,
    UserId,
    Transactions,
    Rates,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserData::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserData::Transactions).text().not_null())
                    .col(ColumnDef::new(UserData::Rates).text().not_null())
                    .col(ColumnDef::new(UserData::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserData::Table).to_owned())
            .await
    }
}
