//! Post feeds and authoring.
//!
//! Every feed is ordered newest first (`pub_date`, then `id` for posts
//! sharing a timestamp) and split into pages of [`PAGE_SIZE`] records.

use crate::error::{FeedError, Result};
use crate::groups::group_dto;
use crate::pagination::{self, PageRequest};
use crate::users::author_dto;
use chrono::Utc;
use common::{MEDIA_URL, Page, PostDto};
use model::entities::{follow, group, post, user};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, trace};

/// Number of characters of the text used as the title of the detail page.
pub const TITLE_LENGTH: usize = 30;

/// A post with its author and group loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post: post::Model,
    pub author: user::Model,
    pub group: Option<group::Model>,
}

impl PostView {
    /// The first 30 characters of the text.
    pub fn title(&self) -> String {
        self.post.text.chars().take(TITLE_LENGTH).collect()
    }
}

impl From<PostView> for PostDto {
    fn from(view: PostView) -> Self {
        Self {
            id: view.post.id,
            text: view.post.text,
            pub_date: view.post.pub_date,
            author: author_dto(view.author),
            group: view.group.map(group_dto),
            image: view.post.image.map(|path| format!("{}{}", MEDIA_URL, path)),
        }
    }
}

/// Values submitted through the post form when creating a post.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub text: String,
    pub group_id: Option<i32>,
    /// Media path of an already stored image
    pub image: Option<String>,
}

/// Values submitted through the post form when editing a post.
/// A missing image keeps the current one.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i32>,
    pub image: Option<String>,
}

fn newest_first() -> Select<post::Entity> {
    post::Entity::find()
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id)
}

/// Load authors and groups for a batch of posts with one query each.
async fn hydrate(db: &DatabaseConnection, posts: Vec<post::Model>) -> Result<Vec<PostView>> {
    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let author_ids: HashSet<i32> = posts.iter().map(|p| p.author_id).collect();
    let group_ids: HashSet<i32> = posts.iter().filter_map(|p| p.group_id).collect();
    trace!(
        "Hydrating {} posts ({} authors, {} groups)",
        posts.len(),
        author_ids.len(),
        group_ids.len()
    );

    let authors: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let groups: HashMap<i32, group::Model> = if group_ids.is_empty() {
        HashMap::new()
    } else {
        group::Entity::find()
            .filter(group::Column::Id.is_in(group_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect()
    };

    posts
        .into_iter()
        .map(|post| {
            let author = authors
                .get(&post.author_id)
                .cloned()
                .ok_or_else(|| FeedError::not_found("User", post.author_id))?;
            let group = post.group_id.and_then(|id| groups.get(&id).cloned());
            Ok(PostView {
                post,
                author,
                group,
            })
        })
        .collect()
}

async fn paginate_views(
    db: &DatabaseConnection,
    select: Select<post::Entity>,
    request: PageRequest,
) -> Result<Page<PostView>> {
    let mut page = pagination::paginate(db, select, request).await?;
    let posts = std::mem::take(&mut page.items);
    let views = hydrate(db, posts).await?;
    Ok(page.with_items(views))
}

/// Every post, newest first.
#[instrument(skip(db))]
pub async fn latest_posts(db: &DatabaseConnection, request: PageRequest) -> Result<Page<PostView>> {
    paginate_views(db, newest_first(), request).await
}

/// Posts published into one group.
#[instrument(skip(db))]
pub async fn group_posts(
    db: &DatabaseConnection,
    group_id: i32,
    request: PageRequest,
) -> Result<Page<PostView>> {
    let select = newest_first().filter(post::Column::GroupId.eq(group_id));
    paginate_views(db, select, request).await
}

/// Posts written by one author.
#[instrument(skip(db))]
pub async fn author_posts(
    db: &DatabaseConnection,
    author_id: i32,
    request: PageRequest,
) -> Result<Page<PostView>> {
    let select = newest_first().filter(post::Column::AuthorId.eq(author_id));
    paginate_views(db, select, request).await
}

/// Posts of every author `user_id` follows.
#[instrument(skip(db))]
pub async fn followed_posts(
    db: &DatabaseConnection,
    user_id: i32,
    request: PageRequest,
) -> Result<Page<PostView>> {
    let followed_authors = Query::select()
        .column(follow::Column::AuthorId)
        .from(follow::Entity)
        .and_where(follow::Column::UserId.eq(user_id))
        .to_owned();

    let select = newest_first().filter(post::Column::AuthorId.in_subquery(followed_authors));
    paginate_views(db, select, request).await
}

#[instrument(skip(db))]
pub async fn count_by_author(db: &DatabaseConnection, author_id: i32) -> Result<u64> {
    Ok(post::Entity::find()
        .filter(post::Column::AuthorId.eq(author_id))
        .count(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn find_post(db: &DatabaseConnection, post_id: i32) -> Result<post::Model> {
    post::Entity::find_by_id(post_id)
        .one(db)
        .await?
        .ok_or_else(|| FeedError::not_found("Post", post_id))
}

/// Load one post with its author and group.
#[instrument(skip(db))]
pub async fn find_post_view(db: &DatabaseConnection, post_id: i32) -> Result<PostView> {
    let post = find_post(db, post_id).await?;
    hydrate(db, vec![post])
        .await?
        .pop()
        .ok_or_else(|| FeedError::not_found("Post", post_id))
}

fn clean_text(text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FeedError::validation("text", "This field is required."));
    }
    Ok(text.to_string())
}

async fn check_group(db: &DatabaseConnection, group_id: Option<i32>) -> Result<()> {
    if let Some(group_id) = group_id {
        let exists = group::Entity::find_by_id(group_id).one(db).await?.is_some();
        if !exists {
            debug!("Rejecting unknown group ID: {}", group_id);
            return Err(FeedError::validation(
                "group",
                "Select a valid choice. That choice is not one of the available choices.",
            ));
        }
    }
    Ok(())
}

/// Validate the form values and publish a new post by `author_id`.
#[instrument(skip(db, new_post), fields(group_id = ?new_post.group_id))]
pub async fn create_post(
    db: &DatabaseConnection,
    author_id: i32,
    new_post: NewPost,
) -> Result<post::Model> {
    let text = clean_text(&new_post.text)?;
    check_group(db, new_post.group_id).await?;

    let created = post::ActiveModel {
        text: Set(text),
        pub_date: Set(Utc::now()),
        author_id: Set(author_id),
        group_id: Set(new_post.group_id),
        image: Set(new_post.image),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Post created with ID: {} by author {}", created.id, author_id);
    Ok(created)
}

/// Validate the form values and apply them to `post`. Author and
/// publication date never change.
#[instrument(skip(db, post, changes), fields(post_id = post.id))]
pub async fn update_post(
    db: &DatabaseConnection,
    post: post::Model,
    changes: PostChanges,
) -> Result<post::Model> {
    let text = clean_text(&changes.text)?;
    check_group(db, changes.group_id).await?;

    let mut active: post::ActiveModel = post.into();
    active.text = Set(text);
    active.group_id = Set(changes.group_id);
    if let Some(image) = changes.image {
        active.image = Set(Some(image));
    }

    let updated = active.update(db).await?;
    info!("Post with ID {} updated", updated.id);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::follows;
    use crate::pagination::PAGE_SIZE;
    use crate::testing::{create_group, create_post as insert_post, create_user, setup_db};

    #[tokio::test]
    async fn test_latest_posts_newest_first() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let first = insert_post(&db, &author, None, "First").await;
        let second = insert_post(&db, &author, None, "Second").await;

        let page = latest_posts(&db, PageRequest::First).await.unwrap();

        let ids: Vec<i32> = page.items.iter().map(|v| v.post.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(page.items[0].author.username, "auth");
    }

    #[tokio::test]
    async fn test_feeds_paginate_by_ten() {
        let db = setup_db().await;
        let author = create_user(&db, "User1").await;
        let group = create_group(&db, "Test group", "test_slug").await;
        for i in 0..15 {
            insert_post(&db, &author, Some(&group), &format!("Test post {}", i)).await;
        }

        let index = latest_posts(&db, PageRequest::First).await.unwrap();
        let by_group = group_posts(&db, group.id, PageRequest::First).await.unwrap();
        let by_author = author_posts(&db, author.id, PageRequest::First).await.unwrap();
        for page in [&index, &by_group, &by_author] {
            assert_eq!(page.len(), PAGE_SIZE as usize);
            assert_eq!(page.count, 15);
        }

        let second = latest_posts(&db, PageRequest::Number(2)).await.unwrap();
        assert_eq!(second.len(), 5);
    }

    #[tokio::test]
    async fn test_post_lands_only_in_its_group_and_profile() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let other = create_user(&db, "auth_user_2").await;
        let group = create_group(&db, "Test group", "test_slug").await;
        let group2 = create_group(&db, "Test group 2", "test_slug_2").await;
        let post = insert_post(&db, &author, Some(&group), "Test post").await;

        let in_group = group_posts(&db, group.id, PageRequest::First).await.unwrap();
        assert_eq!(in_group.items[0].post.id, post.id);
        assert_eq!(in_group.items[0].group.as_ref().unwrap().title, "Test group");

        let other_group = group_posts(&db, group2.id, PageRequest::First).await.unwrap();
        assert!(other_group.is_empty());

        let other_profile = author_posts(&db, other.id, PageRequest::First).await.unwrap();
        assert!(other_profile.is_empty());
    }

    #[tokio::test]
    async fn test_followed_posts_only_show_followed_authors() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let stranger = create_user(&db, "stranger").await;
        let reader = create_user(&db, "reader").await;
        let followed = insert_post(&db, &author, None, "Followed").await;
        insert_post(&db, &stranger, None, "Not followed").await;

        let empty = followed_posts(&db, reader.id, PageRequest::First).await.unwrap();
        assert!(empty.is_empty());

        follows::follow(&db, reader.id, author.id).await.unwrap();

        let feed = followed_posts(&db, reader.id, PageRequest::First).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.items[0].post.id, followed.id);

        // The author's own feed does not include the reader's subscriptions
        let author_feed = followed_posts(&db, author.id, PageRequest::First).await.unwrap();
        assert!(author_feed.is_empty());
    }

    #[tokio::test]
    async fn test_create_post_validates_form() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let group = create_group(&db, "Test group", "test_slug").await;

        let blank = NewPost {
            text: "   ".to_string(),
            ..Default::default()
        };
        let err = create_post(&db, author.id, blank).await.unwrap_err();
        assert!(matches!(err, FeedError::Validation { field: "text", .. }));

        let unknown_group = NewPost {
            text: "Text".to_string(),
            group_id: Some(group.id + 100),
            image: None,
        };
        let err = create_post(&db, author.id, unknown_group).await.unwrap_err();
        assert!(matches!(err, FeedError::Validation { field: "group", .. }));

        let valid = NewPost {
            text: "Test text".to_string(),
            group_id: Some(group.id),
            image: Some("posts/small.gif".to_string()),
        };
        let created = create_post(&db, author.id, valid).await.unwrap();
        assert_eq!(created.author_id, author.id);
        assert_eq!(created.group_id, Some(group.id));
        assert_eq!(created.image.as_deref(), Some("posts/small.gif"));
        assert_eq!(count_by_author(&db, author.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_post_keeps_image_when_none_given() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let group = create_group(&db, "Test group", "test_slug").await;
        let post = create_post(
            &db,
            author.id,
            NewPost {
                text: "Original".to_string(),
                group_id: None,
                image: Some("posts/small.gif".to_string()),
            },
        )
        .await
        .unwrap();

        let updated = update_post(
            &db,
            post.clone(),
            PostChanges {
                text: "Edited text".to_string(),
                group_id: Some(group.id),
                image: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.id, post.id);
        assert_eq!(updated.text, "Edited text");
        assert_eq!(updated.group_id, Some(group.id));
        assert_eq!(updated.image, post.image);
        assert_eq!(updated.pub_date, post.pub_date);
    }

    #[tokio::test]
    async fn test_post_view_and_dto() {
        let db = setup_db().await;
        let author = create_user(&db, "auth").await;
        let text = "A post whose text is comfortably longer than thirty characters";
        let post = create_post(
            &db,
            author.id,
            NewPost {
                text: text.to_string(),
                group_id: None,
                image: Some("posts/small.gif".to_string()),
            },
        )
        .await
        .unwrap();

        let view = find_post_view(&db, post.id).await.unwrap();
        assert_eq!(view.title(), "A post whose text is comfortab");
        assert_eq!(view.title().chars().count(), TITLE_LENGTH);

        let dto = PostDto::from(view);
        assert_eq!(dto.author.username, "auth");
        assert_eq!(dto.group, None);
        assert_eq!(dto.image.as_deref(), Some("/media/posts/small.gif"));

        let err = find_post(&db, post.id + 1).await.unwrap_err();
        assert!(matches!(err, FeedError::NotFound { entity: "Post", .. }));
    }
}
