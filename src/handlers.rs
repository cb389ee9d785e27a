pub mod auth;
pub mod comments;
pub mod follows;
pub mod groups;
pub mod health;
pub mod posts;
pub mod profiles;
