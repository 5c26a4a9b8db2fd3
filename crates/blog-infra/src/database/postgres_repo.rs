//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use blog_core::domain::{
    Comment, NewComment, NewPost, NewPostLike, NewUser, Post, PostLike, User,
};
use blog_core::error::RepoError;
use blog_core::ports::{CommentRepository, PostLikeRepository, PostRepository, UserRepository};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_like::{self, Entity as PostLikeEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL post like repository.
pub type PostgresPostLikeRepository = PostgresBaseRepository<PostLikeEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(new_user)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(new_post)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .order_by_asc(post::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn update(&self, updated: Post) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(updated)
            .update(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel::from(new_comment)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostLikeRepository for PostgresPostLikeRepository {
    async fn create(&self, like: NewPostLike) -> Result<PostLike, RepoError> {
        // A single INSERT; the unique index settles concurrent duplicates.
        let model = post_like::ActiveModel::from(like)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn find_by_user_and_post(
        &self,
        user_id: Uuid,
        post_id: i64,
    ) -> Result<Option<PostLike>, RepoError> {
        let result = PostLikeEntity::find()
            .filter(post_like::Column::UserId.eq(user_id))
            .filter(post_like::Column::PostId.eq(post_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn count_for_post(&self, post_id: i64) -> Result<u64, RepoError> {
        PostLikeEntity::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}
