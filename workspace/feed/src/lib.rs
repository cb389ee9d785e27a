//! Domain operations of the blog on top of the ORM: paginated feeds,
//! post authoring, comments, follow bookkeeping and the lookups the
//! request handlers need.

pub mod comments;
pub mod error;
pub mod follows;
pub mod groups;
pub mod pagination;
pub mod posts;
pub mod users;

#[cfg(test)]
pub mod testing;

pub use error::{FeedError, Result};
pub use pagination::{PAGE_SIZE, PageRequest};
