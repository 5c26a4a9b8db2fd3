//! # Blog Core
//!
//! The domain layer of the blog backend.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! entities, repository ports and the ownership policy applied to posts.

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;

pub use error::{DomainError, RepoError};
pub use policy::Access;
