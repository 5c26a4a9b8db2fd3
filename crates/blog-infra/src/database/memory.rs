//! In-memory storage - used when no database is configured, and in tests.
//!
//! All tables live behind one async `RwLock`, so every write (including the
//! constraint checks that precede it) is a single critical section. The store
//! enforces the same rules as the PostgreSQL schema: foreign keys, the
//! `(user, post)` uniqueness of likes, unique usernames and cascading deletes.
//! Data is lost on process restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blog_core::domain::{
    Comment, NewComment, NewPost, NewPostLike, NewUser, Post, PostLike, User,
};
use blog_core::error::RepoError;
use blog_core::ports::{
    BaseRepository, CommentRepository, PostLikeRepository, PostRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    likes: BTreeMap<i64, PostLike>,
    post_seq: i64,
    comment_seq: i64,
    like_seq: i64,
}

impl Tables {
    fn require_user(&self, id: Uuid) -> Result<(), RepoError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::Constraint(format!("user {id} does not exist")))
        }
    }

    fn require_post(&self, id: i64) -> Result<(), RepoError> {
        if self.posts.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::Constraint(format!("post {id} does not exist")))
        }
    }

    fn remove_post(&mut self, id: i64) -> Option<Post> {
        let post = self.posts.remove(&id)?;
        self.comments.retain(|_, c| c.post_id != id);
        self.likes.retain(|_, l| l.post_id != id);
        Some(post)
    }

    fn remove_user(&mut self, id: Uuid) -> Option<User> {
        let user = self.users.remove(&id)?;
        let owned: Vec<i64> = self
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            self.remove_post(post_id);
        }
        self.comments.retain(|_, c| c.author_id != id);
        self.likes.retain(|_, l| l.user_id != id);
        Some(user)
    }
}

/// Repository implementation over process memory.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.remove_user(id).map(drop).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == new_user.username) {
            return Err(RepoError::Duplicate(format!(
                "username '{}' is taken",
                new_user.username
            )));
        }
        if tables.users.contains_key(&new_user.id) {
            return Err(RepoError::Duplicate(format!("user {}", new_user.id)));
        }

        let user = User::from(new_user);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.remove_post(id).map(drop).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(new_post.author_id)?;

        tables.post_seq += 1;
        let post = Post {
            id: tables.post_seq,
            title: new_post.title,
            content: new_post.content,
            author_id: new_post.author_id,
            published_date: new_post.published_date,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn list(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.tables.read().await.posts.values().cloned().collect())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(post.author_id)?;

        let stored = tables.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        *stored = post.clone();
        Ok(post)
    }
}

#[async_trait]
impl BaseRepository<Comment, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.comments.remove(&id).map(drop).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(new_comment.author_id)?;
        tables.require_post(new_comment.post_id)?;

        tables.comment_seq += 1;
        let comment = Comment {
            id: tables.comment_seq,
            author_id: new_comment.author_id,
            text: new_comment.text,
            created_at: new_comment.created_at,
            post_id: new_comment.post_id,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseRepository<PostLike, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<PostLike>, RepoError> {
        Ok(self.tables.read().await.likes.get(&id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.likes.remove(&id).map(drop).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostLikeRepository for InMemoryStore {
    async fn create(&self, like: NewPostLike) -> Result<PostLike, RepoError> {
        let mut tables = self.tables.write().await;
        tables.require_user(like.user_id)?;
        tables.require_post(like.post_id)?;

        let duplicate = tables
            .likes
            .values()
            .any(|l| l.user_id == like.user_id && l.post_id == like.post_id);
        if duplicate {
            return Err(RepoError::Duplicate(format!(
                "user {} already likes post {}",
                like.user_id, like.post_id
            )));
        }

        tables.like_seq += 1;
        let like = PostLike {
            id: tables.like_seq,
            user_id: like.user_id,
            post_id: like.post_id,
        };
        tables.likes.insert(like.id, like.clone());
        Ok(like)
    }

    async fn find_by_user_and_post(
        &self,
        user_id: Uuid,
        post_id: i64,
    ) -> Result<Option<PostLike>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .values()
            .find(|l| l.user_id == user_id && l.post_id == post_id)
            .cloned())
    }

    async fn count_for_post(&self, post_id: i64) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.likes.values().filter(|l| l.post_id == post_id).count() as u64)
    }
}
