//! The feed assembler: turns a scope selection and a page number into one
//! paginated, time-ordered page of posts with their authors and groups.

pub mod page;

use crate::datastore::{postfilters::PostFilters, structs::PostDetail, Client};
use crate::fault::{Cause, Describe, Fallible, PublicError};
use crate::feed::page::{count_pages, offset, Page};
use anyhow::anyhow;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which posts populate a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Every post on the site.
    All,
    /// Posts tagged with the group addressed by this slug.
    ByGroup(String),
    /// Posts written by the author with this username.
    ByAuthor(String),
    /// Posts by every author this user follows.
    FollowedBy(Uuid),
}

/// Assembles listing pages against any datastore. Read-only.
#[derive(Clone)]
pub struct Assembler<DS> {
    ds: DS,
    page_size: u32,
}

impl<DS: Client> Assembler<DS> {
    pub fn new(ds: DS) -> Self {
        Self::with_page_size(ds, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(ds: DS, page_size: u32) -> Self {
        assert!(page_size > 0, "page size must be at least 1");
        Self { ds, page_size }
    }

    /// One page of the listing selected by `scope`, newest post first.
    ///
    /// Page numbers are 1-based and forgiving: 0 reads as page 1, and a number
    /// past the end returns the last page. Unknown scope targets (group slug,
    /// username) fail with a NotFound cause.
    pub async fn get_page(&self, scope: Scope, page_number: u32) -> Fallible<Page<PostDetail>> {
        let resolved = self.resolve(scope).await?;
        guard!(let Some(filters) = resolved else {
            // Following nobody means an empty feed, not an error.
            return Ok(Page::empty());
        });

        let number = page_number.max(1);
        let (items, total) = self
            .ds
            .find_posts(
                filters.clone(),
                self.page_size,
                offset(number, self.page_size),
            )
            .await?;

        let last = count_pages(total, self.page_size);
        if number > last && total > 0 {
            // Past the end: refetch and serve the last page instead.
            let (items, _) = self
                .ds
                .find_posts(filters, self.page_size, offset(last, self.page_size))
                .await?;
            return Ok(Page::assemble(items, last, total, self.page_size));
        }
        Ok(Page::assemble(items, number, total, self.page_size))
    }

    /// Resolve a scope into datastore filters, or `None` when the scope is
    /// already known to select nothing.
    async fn resolve(&self, scope: Scope) -> Fallible<Option<PostFilters>> {
        let filters = match scope {
            Scope::All => PostFilters::default(),
            Scope::ByGroup(slug) => {
                let group = self.ds.find_group(slug.clone()).await?.ok_or_else(|| {
                    anyhow!("no group with slug {:?}", slug).describe(PublicError {
                        cause: Cause::NotFound,
                        text: "No such group",
                    })
                })?;
                PostFilters {
                    group_id: Some(group.id),
                    ..Default::default()
                }
            }
            Scope::ByAuthor(username) => {
                let author = self.ds.find_user(username.clone()).await?.ok_or_else(|| {
                    anyhow!("no user named {:?}", username).describe(PublicError {
                        cause: Cause::NotFound,
                        text: "No such user",
                    })
                })?;
                PostFilters {
                    author_id: Some(author.id),
                    ..Default::default()
                }
            }
            Scope::FollowedBy(user_id) => {
                let authors = self.ds.following(user_id).await?;
                if authors.is_empty() {
                    return Ok(None);
                }
                PostFilters {
                    author_in: Some(authors),
                    ..Default::default()
                }
            }
        };
        Ok(Some(filters))
    }
}
