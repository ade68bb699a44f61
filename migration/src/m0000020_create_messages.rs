use crate::m0000010_create_rooms::Rooms;
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
                    .table(Messages::Table)
                    .col(
                        ColumnDef::new(Messages::Id)
                            .uuid()
                            .not_null()
                            .default(Func::cust(UuidV4))
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Messages::RoomId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from_col(Messages::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .col(ColumnDef::new(Messages::SenderId).string().not_null())
                    .col(ColumnDef::new(Messages::Content).text().not_null())
                    .col(
                        ColumnDef::new(Messages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Func::cust(Now)),
                    )
                    .to_owned(),
            )
            .await?;

        // ordered history and latest-message lookups are both served by this one
        manager
            .create_index(
                Index::create()
                    .table(Messages::Table)
                    .name(Indexes::MessagesRoomIdCreatedAtIdx.to_string())
                    .col(Messages::RoomId)
                    .col(Messages::CreatedAt)
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
                    .table(Messages::Table)
                    .name(Indexes::MessagesRoomIdCreatedAtIdx.to_string())
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Messages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Indexes {
    MessagesRoomIdCreatedAtIdx,
}

#[derive(DeriveIden)]
pub enum Messages {
    Table,
    Id,
    RoomId,
    SenderId,
    Content,
    CreatedAt,
}
