//! Drains the paginated upstream grids into complete listings.

use tracing::debug;

use super::{Channel, EpgEvent, EpgSource, GridPage, UpstreamError};

/// Entries requested per upstream page.
pub const PAGE_SIZE: usize = 500;

/// Fetch every event from the source, page by page.
pub async fn fetch_all_events(source: &dyn EpgSource) -> Result<Vec<EpgEvent>, UpstreamError> {
    let mut all = Vec::new();
    let mut offset = 0;

    loop {
        let page = source.events_page(offset, PAGE_SIZE).await?;
        debug!(offset, received = page.entries.len(), total = page.total, "Fetched event page");
        if is_last_page(&mut all, page) {
            break;
        }
        offset += PAGE_SIZE;
    }

    Ok(all)
}

/// Fetch every channel from the source, page by page.
pub async fn fetch_all_channels(source: &dyn EpgSource) -> Result<Vec<Channel>, UpstreamError> {
    let mut all = Vec::new();
    let mut offset = 0;

    loop {
        let page = source.channels_page(offset, PAGE_SIZE).await?;
        debug!(offset, received = page.entries.len(), total = page.total, "Fetched channel page");
        if is_last_page(&mut all, page) {
            break;
        }
        offset += PAGE_SIZE;
    }

    Ok(all)
}

/// Append a page and report whether paging should stop.
fn is_last_page<T>(all: &mut Vec<T>, page: GridPage<T>) -> bool {
    let short = page.entries.len() < PAGE_SIZE;
    all.extend(page.entries);
    short || all.len() >= page.total
}
