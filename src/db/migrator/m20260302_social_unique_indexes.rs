use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_user_post ON likes(user_id, post_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_follows_pair ON follows(follower_id, followed_id)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_posts_user_created ON posts(user_id, created_at)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_comments_post")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_posts_user_created")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_follows_pair")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_likes_user_post")
            .await?;

        Ok(())
    }
}
