use crate::{Now, UuidV4};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .col(
                        ColumnDef::new(Rooms::Id)
                            .uuid()
                            .not_null()
                            .default(Func::cust(UuidV4))
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rooms::CustomerId).string().not_null())
                    .col(ColumnDef::new(Rooms::AdminId).string())
                    .col(
                        ColumnDef::new(Rooms::Status)
                            .string()
                            .not_null()
                            .default("waiting"),
                    )
                    .col(
                        ColumnDef::new(Rooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Func::cust(Now)),
                    )
                    .to_owned(),
            )
            .await?;

        // this index should speed up looking up the most recent open room for a customer
        manager
            .create_index(
                Index::create()
                    .table(Rooms::Table)
                    .name(Indexes::RoomsCustomerIdCreatedAtIdx.to_string())
                    .col(Rooms::CustomerId)
                    .col(Rooms::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .table(Rooms::Table)
                    .name(Indexes::RoomsCustomerIdCreatedAtIdx.to_string())
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Indexes {
    RoomsCustomerIdCreatedAtIdx,
}

#[derive(DeriveIden)]
pub enum Rooms {
    Table,
    Id,
    CustomerId,
    AdminId,
    Status,
    CreatedAt,
}
