//! Common transport-layer types shared between the server and its clients.
//! Handlers serialize these shapes and tests deserialize them back, so the
//! JSON layout is defined in one place.

mod forms;
mod page;
mod posts;

pub use forms::{Choice, FieldKind, FormDescriptor, FormField};
pub use page::Page;
pub use posts::{AuthorDto, CommentDto, GroupDto, PostDto};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// URL prefix under which uploaded media files are served.
pub const MEDIA_URL: &str = "/media/";

/// Generic API response wrapper used by every page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_layout() {
        let response = ApiResponse::ok(vec![1, 2, 3], "Numbers retrieved successfully");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(value["message"], "Numbers retrieved successfully");
        assert_eq!(value["success"], true);
    }
}
