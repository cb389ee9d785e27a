use common::Page;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select};
use tracing::{debug, instrument};

/// Number of records shown on one page of every feed.
pub const PAGE_SIZE: u64 = 10;

/// The page a client asked for, before it is checked against the size of
/// the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRequest {
    /// No page or an unparseable one was given
    #[default]
    First,
    Number(i64),
}

impl PageRequest {
    /// Parse the raw `page` query value. Anything that is not an integer
    /// falls back to the first page.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).and_then(|value| value.parse::<i64>().ok()) {
            Some(number) => PageRequest::Number(number),
            None => PageRequest::First,
        }
    }

    /// Resolve against the number of available pages. Numbers outside
    /// `1..=num_pages` land on the last page.
    pub fn resolve(self, num_pages: u64) -> u64 {
        let num_pages = num_pages.max(1);
        match self {
            PageRequest::First => 1,
            PageRequest::Number(n) if n >= 1 && (n as u64) <= num_pages => n as u64,
            PageRequest::Number(_) => num_pages,
        }
    }
}

/// Fetch one page of `select` using the default page size.
pub async fn paginate<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    request: PageRequest,
) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    paginate_by(db, select, request, PAGE_SIZE).await
}

/// Fetch one page of `select`, `per_page` records at a time.
///
/// The result set is counted first so that out-of-range requests can be
/// redirected to the last page; an empty result set still has one page.
#[instrument(skip(db, select))]
pub async fn paginate_by<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    request: PageRequest,
    per_page: u64,
) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let paginator = select.paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let num_pages = totals.number_of_pages.max(1);
    let number = request.resolve(num_pages);

    debug!(
        "Resolved page {} of {} ({} records)",
        number, num_pages, totals.number_of_items
    );

    let items = paginator.fetch_page(number - 1).await?;

    Ok(Page {
        items,
        number,
        num_pages,
        count: totals.number_of_items,
        per_page,
        has_next: number < num_pages,
        has_previous: number > 1,
    })
}
