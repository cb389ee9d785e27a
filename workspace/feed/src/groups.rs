use crate::error::{FeedError, Result};
use common::GroupDto;
use model::entities::group;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, instrument};

pub fn group_dto(model: group::Model) -> GroupDto {
    GroupDto {
        id: model.id,
        title: model.title,
        slug: model.slug,
        description: model.description,
    }
}

/// Fields of a group to be created.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A slug is non-empty and made of ASCII letters, digits, hyphens and underscores.
pub fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FeedError::validation(
            "slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
        ))
    }
}

#[instrument(skip(db))]
pub async fn create_group(db: &DatabaseConnection, new_group: NewGroup) -> Result<group::Model> {
    let title = new_group.title.trim();
    if title.is_empty() {
        return Err(FeedError::validation("title", "This field is required."));
    }
    if title.chars().count() > group::TITLE_MAX_LENGTH {
        return Err(FeedError::validation(
            "title",
            format!(
                "Ensure this value has at most {} characters.",
                group::TITLE_MAX_LENGTH
            ),
        ));
    }
    validate_slug(&new_group.slug)?;

    let created = group::ActiveModel {
        title: Set(title.to_string()),
        slug: Set(new_group.slug),
        description: Set(new_group.description),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| FeedError::from_insert(err, "slug", "Group with this slug already exists."))?;

    info!("Group created with ID: {}, slug: {}", created.id, created.slug);
    Ok(created)
}

#[instrument(skip(db))]
pub async fn find_by_slug(db: &DatabaseConnection, slug: &str) -> Result<group::Model> {
    group::Entity::find()
        .filter(group::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| FeedError::not_found("Group", slug))
}

/// All groups, alphabetically by title.
#[instrument(skip(db))]
pub async fn list_groups(db: &DatabaseConnection) -> Result<Vec<group::Model>> {
    Ok(group::Entity::find()
        .order_by_asc(group::Column::Title)
        .order_by_asc(group::Column::Id)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::setup_db;

    fn new_group(title: &str, slug: &str) -> NewGroup {
        NewGroup {
            title: title.to_string(),
            slug: slug.to_string(),
            description: "Test description".to_string(),
        }
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("test_slug").is_ok());
        assert!(validate_slug("test-slug-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("with space").is_err());
        assert!(validate_slug("Тестовый").is_err());
    }

    #[tokio::test]
    async fn test_create_and_find_group() {
        let db = setup_db().await;

        let created = create_group(&db, new_group("Test group", "test_slug"))
            .await
            .unwrap();
        let found = find_by_slug(&db, "test_slug").await.unwrap();

        assert_eq!(found, created);
        assert_eq!(group_dto(found).title, "Test group");
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = setup_db().await;
        create_group(&db, new_group("First", "same")).await.unwrap();

        let err = create_group(&db, new_group("Second", "same")).await.unwrap_err();
        assert!(matches!(err, FeedError::Validation { field: "slug", .. }));
    }

    #[tokio::test]
    async fn test_title_length_limit() {
        let db = setup_db().await;

        let err = create_group(&db, new_group(&"x".repeat(201), "long"))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation { field: "title", .. }));

        assert!(create_group(&db, new_group(&"x".repeat(200), "long")).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_groups_sorted_by_title() {
        let db = setup_db().await;
        create_group(&db, new_group("Zebras", "zebras")).await.unwrap();
        create_group(&db, new_group("Apples", "apples")).await.unwrap();

        let groups = list_groups(&db).await.unwrap();
        let titles: Vec<_> = groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Apples", "Zebras"]);
    }

    #[tokio::test]
    async fn test_missing_group() {
        let db = setup_db().await;

        let err = find_by_slug(&db, "nope").await.unwrap_err();
        assert!(matches!(err, FeedError::NotFound { entity: "Group", .. }));
    }
}
