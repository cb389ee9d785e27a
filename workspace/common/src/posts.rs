use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AuthorDto {
    pub id: i32,
    pub username: String,
}

/// Group response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct GroupDto {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Post response model with its author and group resolved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PostDto {
    pub id: i32,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: AuthorDto,
    pub group: Option<GroupDto>,
    /// URL of the attached image, e.g. `/media/posts/small.gif`
    pub image: Option<String>,
}

/// Comment response model.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CommentDto {
    pub id: i32,
    pub post_id: i32,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: AuthorDto,
}
