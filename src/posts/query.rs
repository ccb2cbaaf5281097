use serde::Serialize;
use spdlog::debug;

use crate::error::{PostError, Result};
use crate::filter::PostFilter;
use crate::hooks::THE_CONTENT;
use crate::paginator::Paginator;
use crate::post::Post;

use super::{Period, Posts, QueryKind, Route};

/// What a query resolved to, for building pagination links and headings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryContext {
    pub kind: QueryKind,
    pub page: u32,
    pub page_size: u32,
    /// Rows across all pages. Only set by listings.
    pub total: Option<u64>,
    pub taxonomy_path: Option<String>,
    pub period: Option<Period>,
}

impl QueryContext {
    pub fn page_count(&self) -> u32 {
        match self.total {
            Some(total) => Paginator::new(self.page, self.page_size).page_count(total),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub posts: Vec<Post>,
    pub context: QueryContext,
}

impl Posts {
    /// Finds posts for `filter`. An `Err` means the request was rejected or
    /// failed, which is different from `Ok` with no posts.
    pub fn query(&self, filter: &PostFilter) -> Result<QueryResult> {
        filter.validate(self.dates.as_ref())?;

        let route = Route::select(filter);
        let paginator = Paginator::new(route.page(filter.pageno), self.page_size);
        debug!("Query routed to {:?}, page {}", route, paginator.page());

        let mut context = QueryContext {
            kind: route.kind(),
            page: paginator.page(),
            page_size: paginator.page_size(),
            total: None,
            taxonomy_path: None,
            period: None,
        };

        let cutoff = filter.modified();
        let posts = match route {
            Route::ById { id } => self.query_by_id(id, cutoff)?,
            Route::BySlugInTaxonomy { ref tax, ref slug } => {
                let taxonomy = self.resolve_taxonomy(tax)?;
                self.query_by_slug(taxonomy, slug, cutoff)?
            }
            Route::ByPageSlug { ref slug } => self.query_by_page(slug, cutoff)?,
            Route::ByTaxonomySubtree { ref tax } => {
                let taxonomy = self.resolve_taxonomy(tax)?;
                context.taxonomy_path = self.taxonomy.path_of(taxonomy);

                let descendants = self.taxonomy.descendants_of(taxonomy);
                let page = self.query_by_tax(taxonomy, &descendants, &paginator)?;
                context.total = Some(page.total);
                page.posts
            }
            Route::ByDateRange { period } => {
                context.period = period;
                let page = self.query_by_date(period, &paginator)?;
                context.total = Some(page.total);
                page.posts
            }
            Route::Feed => {
                let page = self.query_by_date(None, &paginator)?;
                context.total = Some(page.total);
                page.posts
            }
            Route::Home => vec![],
        };

        Ok(QueryResult {
            posts: self.post_process(posts),
            context,
        })
    }

    fn resolve_taxonomy(&self, path: &str) -> Result<i64> {
        self.taxonomy.resolve(path)
            .ok_or_else(|| PostError::not_found("taxonomy not found"))
    }

    /// Converts timestamps back to local time and runs the content hooks.
    fn post_process(&self, mut posts: Vec<Post>) -> Vec<Post> {
        for post in posts.iter_mut() {
            if let Some(date) = self.dates.utc_to_local(&post.date) {
                post.date = date;
            }
            if let Some(modified) = self.dates.utc_to_local(&post.modified) {
                post.modified = modified;
            }
            post.content = self.hooks.apply(THE_CONTENT, &post.content);
        }
        posts
    }
}
