use crate::idens;
use model::entities::{follow, prelude::Follow};
use sea_orm::ConnectionTrait;
use sea_orm_migration::prelude::*;

const INDEX_NAME: &str = "follows_unique_pair";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Edges created before the index existed may contain duplicates and self-follows
        db.execute_unprepared("DELETE FROM follows WHERE user_id = author_id")
            .await?;
        db.execute_unprepared(
            "DELETE FROM follows WHERE id NOT IN \
             (SELECT MIN(id) FROM follows GROUP BY user_id, author_id)",
        )
        .await?;

        manager
            .create_index(
                Index::create()
                    .name(INDEX_NAME)
                    .table(idens::table::<Follow>())
                    .col(idens::column(follow::Column::UserId))
                    .col(idens::column(follow::Column::AuthorId))
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(INDEX_NAME)
                    .table(idens::table::<Follow>())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
