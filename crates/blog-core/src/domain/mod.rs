//! Domain entities - the core business objects.

mod comment;
mod like;
mod post;
mod user;

pub use comment::{Comment, NewComment};
pub use like::{NewPostLike, PostLike};
pub use post::{NewPost, Post, PostChanges, TITLE_MAX_LEN};
pub use user::{NewUser, User};
