use crate::schemas::ApiDoc;
use utoipa::OpenApi;
use utoipa::openapi::{PathItemType, RefOr, schema::Schema};

fn object_properties(name: &str) -> Vec<String> {
    let openapi = ApiDoc::openapi();
    let components = openapi.components.expect("components are missing");
    match components.schemas.get(name) {
        Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
        _ => panic!("{} should be an object schema", name),
    }
}

#[test]
fn test_openapi_schema_generation() {
    let openapi = ApiDoc::openapi();

    let components = openapi.components.as_ref().unwrap();
    for name in ["ErrorResponse", "HealthResponse", "PostDto", "ImageUpload", "PostForm"] {
        assert!(components.schemas.contains_key(name), "missing schema {}", name);
    }
    assert!(components.security_schemes.contains_key("bearer_auth"));

    assert!(serde_json::to_string(&openapi).is_ok());
}

#[test]
fn test_error_response_schema_structure() {
    let properties = object_properties("ErrorResponse");

    for field in ["error", "code", "success"] {
        assert!(properties.contains(&field.to_string()));
    }
}

#[test]
fn test_post_schema_structure() {
    let properties = object_properties("PostDto");

    for field in ["id", "text", "pub_date", "author", "group", "image"] {
        assert!(properties.contains(&field.to_string()), "PostDto lacks {}", field);
    }
}

#[test]
fn test_openapi_paths() {
    let openapi = ApiDoc::openapi();
    let expected = [
        ("/health", PathItemType::Get),
        ("/", PathItemType::Get),
        ("/group/{slug}/", PathItemType::Get),
        ("/groups/", PathItemType::Get),
        ("/profile/{username}/", PathItemType::Get),
        ("/posts/{post_id}/", PathItemType::Get),
        ("/create/", PathItemType::Get),
        ("/create/", PathItemType::Post),
        ("/posts/{post_id}/edit/", PathItemType::Get),
        ("/posts/{post_id}/edit/", PathItemType::Post),
        ("/posts/{post_id}/comment/", PathItemType::Post),
        ("/profile/{username}/follow/", PathItemType::Get),
        ("/profile/{username}/unfollow/", PathItemType::Get),
        ("/follow/", PathItemType::Get),
        ("/auth/signup/", PathItemType::Post),
        ("/auth/login/", PathItemType::Get),
        ("/auth/login/", PathItemType::Post),
    ];

    for (path, method) in expected {
        let item = openapi
            .paths
            .paths
            .get(path)
            .unwrap_or_else(|| panic!("missing path {}", path));
        assert!(item.operations.contains_key(&method), "missing operation on {}", path);
    }
}

#[test]
fn test_error_responses_reference_schema_by_name() {
    let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

    assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
    assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
}

#[test]
fn test_page_errors_reference_error_response() {
    let openapi = serde_json::to_value(ApiDoc::openapi()).unwrap();
    let expected = "#/components/schemas/ErrorResponse";

    let cases = [
        ("/group/{slug}/", "get", "404"),
        ("/profile/{username}/", "get", "404"),
        ("/profile/{username}/follow/", "get", "404"),
        ("/posts/{post_id}/comment/", "post", "404"),
        ("/follow/", "get", "500"),
    ];
    for (path, method, status) in cases {
        let schema_ref = &openapi["paths"][path][method]["responses"][status]["content"]
            ["application/json"]["schema"]["$ref"];
        assert_eq!(schema_ref, expected, "{} {} {}", method, path, status);
    }
}
