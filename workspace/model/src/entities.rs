//! Root of the SeaORM entity modules for the blog: users, groups,
//! posts, comments and follow edges.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::comment::Entity as Comment;
    pub use super::follow::Entity as Follow;
    pub use super::group::Entity as Group;
    pub use super::post::Entity as Post;
    pub use super::user::Entity as User;
}
