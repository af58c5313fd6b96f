//! Listing driver: walks the remote catalog one page at a time.
//!
//! Pages are requested on demand, never prefetched, so at most one unfiltered
//! page is held in memory. After each page a continue predicate decides
//! whether the next page is requested at all; the page that trips the
//! predicate is still yielded.

use tracing::debug;

use crate::catalog::{AccessToken, CatalogError, MediaPage, MediaSummary, RemoteCatalog};

enum Cursor {
    Start,
    Next(String),
    Done,
}

pub struct ListingDriver<'a, P> {
    catalog: &'a dyn RemoteCatalog,
    token: &'a AccessToken,
    keep_going: P,
    cursor: Cursor,
    pages_fetched: u64,
}

impl<'a, P> ListingDriver<'a, P>
where
    P: Fn(&[MediaSummary]) -> bool,
{
    pub fn new(catalog: &'a dyn RemoteCatalog, token: &'a AccessToken, keep_going: P) -> Self {
        Self {
            catalog,
            token,
            keep_going,
            cursor: Cursor::Start,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page, or `None` once the listing is exhausted or the
    /// predicate stopped it. An error leaves the driver unusable for the run.
    pub async fn next_page(&mut self) -> Result<Option<Vec<MediaSummary>>, CatalogError> {
        let cursor = match &self.cursor {
            Cursor::Done => return Ok(None),
            Cursor::Start => None,
            Cursor::Next(c) => Some(c.as_str()),
        };

        let listed = self.catalog.list_page(self.token, cursor).await;
        let MediaPage { items, next_cursor } = match listed {
            Ok(page) => page,
            Err(e) => {
                self.cursor = Cursor::Done;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        self.cursor = match next_cursor {
            Some(next) if (self.keep_going)(items.as_slice()) => Cursor::Next(next),
            Some(_) => {
                debug!(
                    page = self.pages_fetched,
                    "Page has nothing new, not requesting further pages"
                );
                Cursor::Done
            }
            None => Cursor::Done,
        };

        Ok(Some(items))
    }

    /// Pages successfully fetched so far.
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }
}
