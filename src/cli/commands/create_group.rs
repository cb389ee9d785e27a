use anyhow::Result;
use feed::groups::{self, NewGroup};
use tracing::{error, info, trace};

use super::initdb::connect_creating;

pub async fn create_group(
    database_url: &str,
    title: &str,
    slug: &str,
    description: &str,
) -> Result<()> {
    trace!("Entering create_group function");

    let db = connect_creating(database_url).await?;
    let new_group = NewGroup {
        title: title.to_string(),
        slug: slug.to_string(),
        description: description.to_string(),
    };

    match groups::create_group(&db, new_group).await {
        Ok(group) => {
            info!("Group '{}' created with ID: {}, slug: {}", group, group.id, group.slug);
            Ok(())
        }
        Err(e) => {
            error!("Failed to create group '{}': {}", slug, e);
            Err(e.into())
        }
    }
}
