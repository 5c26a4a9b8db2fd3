use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, NewComment, NewPost, NewPostLike, NewUser, Post, PostLike, User,
};
use crate::error::RepoError;

/// Generic repository trait defining the operations every entity supports.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Delete an entity by its ID. Dependent rows are removed with it.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Persist a new user. Fails with `Duplicate` if the username is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// All posts, oldest first.
    async fn list(&self) -> Result<Vec<Post>, RepoError>;

    /// Overwrite the stored fields of an existing post.
    async fn update(&self, post: Post) -> Result<Post, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, i64> {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError>;
}

/// Post like repository.
#[async_trait]
pub trait PostLikeRepository: BaseRepository<PostLike, i64> {
    /// Insert a like. A second like for the same `(user, post)` pair fails
    /// with `Duplicate` no matter how the calls interleave.
    async fn create(&self, like: NewPostLike) -> Result<PostLike, RepoError>;

    async fn find_by_user_and_post(
        &self,
        user_id: Uuid,
        post_id: i64,
    ) -> Result<Option<PostLike>, RepoError>;

    async fn count_for_post(&self, post_id: i64) -> Result<u64, RepoError>;
}
