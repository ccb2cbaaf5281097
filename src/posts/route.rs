use serde::Serialize;

use crate::filter::PostFilter;

/// A year, optionally narrowed to one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub year: i32,
    pub month: Option<u32>,
}

/// Tag reported to the caller describing which kind of listing was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Post,
    Page,
    Tax,
    Date,
    Feed,
    Home,
}

/// The lookup strategy chosen for a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    ById { id: i64 },
    BySlugInTaxonomy { tax: String, slug: String },
    ByPageSlug { slug: String },
    ByTaxonomySubtree { tax: String },
    ByDateRange { period: Option<Period> },
    /// Latest posts, always the first page
    Feed,
    Home,
}

impl Route {
    /// Picks the strategy from which fields are present. First match wins:
    /// id, slug with tax, slug alone, tax alone, year, page number, feed.
    /// The filter is expected to be validated already.
    pub fn select(filter: &PostFilter) -> Route {
        if let Some(id) = filter.id {
            return Route::ById { id };
        }

        match (filter.slug(), filter.tax()) {
            (Some(slug), Some(tax)) => return Route::BySlugInTaxonomy {
                tax: tax.to_string(),
                slug: slug.to_string(),
            },
            (Some(slug), None) => return Route::ByPageSlug { slug: slug.to_string() },
            (None, Some(tax)) => return Route::ByTaxonomySubtree { tax: tax.to_string() },
            (None, None) => {}
        }

        if let Some(yy) = filter.yy {
            let period = Period {
                year: yy.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
                month: filter.mm.map(|mm| mm as u32),
            };
            return Route::ByDateRange { period: Some(period) };
        }

        if filter.pageno.is_some() {
            return Route::ByDateRange { period: None };
        }

        if filter.feed {
            return Route::Feed;
        }

        Route::Home
    }

    pub fn kind(&self) -> QueryKind {
        match self {
            Route::ById { .. } | Route::BySlugInTaxonomy { .. } => QueryKind::Post,
            Route::ByPageSlug { .. } => QueryKind::Page,
            Route::ByTaxonomySubtree { .. } => QueryKind::Tax,
            Route::ByDateRange { .. } => QueryKind::Date,
            Route::Feed => QueryKind::Feed,
            Route::Home => QueryKind::Home,
        }
    }

    /// Page the strategy will serve for the requested page number.
    pub fn page(&self, pageno: Option<i64>) -> u32 {
        match self {
            Route::Feed => 1,
            _ => pageno.unwrap_or(1).clamp(1, u32::MAX as i64) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(filter: PostFilter) -> Route {
        Route::select(&filter)
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(select(PostFilter { id: Some(5), ..Default::default() }), Route::ById { id: 5 });
        assert_eq!(select(PostFilter {
            tax: Some("a/b".to_string()),
            slug: Some("x".to_string()),
            ..Default::default()
        }), Route::BySlugInTaxonomy { tax: "a/b".to_string(), slug: "x".to_string() });
        assert_eq!(select(PostFilter { slug: Some("x".to_string()), ..Default::default() }),
                   Route::ByPageSlug { slug: "x".to_string() });
        assert_eq!(select(PostFilter { tax: Some("a/b".to_string()), ..Default::default() }),
                   Route::ByTaxonomySubtree { tax: "a/b".to_string() });
        assert_eq!(select(PostFilter { yy: Some(2024), ..Default::default() }),
                   Route::ByDateRange { period: Some(Period { year: 2024, month: None }) });
        assert_eq!(select(PostFilter { pageno: Some(3), ..Default::default() }),
                   Route::ByDateRange { period: None });
        assert_eq!(select(PostFilter { feed: true, ..Default::default() }), Route::Feed);
        assert_eq!(select(PostFilter::default()), Route::Home);
    }

    #[test]
    fn test_earlier_fields_win() {
        let everything = PostFilter {
            id: Some(5),
            tax: Some("a".to_string()),
            slug: Some("x".to_string()),
            yy: Some(2023),
            mm: Some(5),
            pageno: Some(2),
            modified: None,
            feed: true,
        };
        assert_eq!(select(everything.clone()), Route::ById { id: 5 });
        assert_eq!(select(PostFilter { id: None, ..everything.clone() }).kind(), QueryKind::Post);
        assert_eq!(select(PostFilter { id: None, slug: None, ..everything.clone() }).kind(), QueryKind::Tax);
        assert_eq!(select(PostFilter { id: None, slug: None, tax: None, ..everything.clone() }),
                   Route::ByDateRange { period: Some(Period { year: 2023, month: Some(5) }) });
        assert_eq!(select(PostFilter { id: None, slug: None, tax: None, yy: None, ..everything.clone() }),
                   Route::ByDateRange { period: None });
        assert_eq!(select(PostFilter { feed: true, mm: Some(5), ..Default::default() }), Route::Feed);
    }

    #[test]
    fn test_year_saturates() {
        assert_eq!(select(PostFilter { yy: Some(i64::MAX), ..Default::default() }),
                   Route::ByDateRange { period: Some(Period { year: i32::MAX, month: None }) });
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let filter = PostFilter {
            tax: Some("".to_string()),
            slug: Some("".to_string()),
            ..Default::default()
        };
        assert_eq!(select(filter), Route::Home);
    }

    #[test]
    fn test_kind_and_page() {
        assert_eq!(Route::ByPageSlug { slug: "x".to_string() }.kind(), QueryKind::Page);
        assert_eq!(Route::Home.kind(), QueryKind::Home);
        assert_eq!(Route::Feed.page(Some(4)), 1);
        assert_eq!(Route::ByDateRange { period: None }.page(Some(4)), 4);
        assert_eq!(Route::ByDateRange { period: None }.page(None), 1);
        assert_eq!(Route::ById { id: 1 }.page(Some(0)), 1);
        assert_eq!(Route::ByDateRange { period: None }.page(Some(5_000_000_000)), u32::MAX);
    }
}
