use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use spdlog::trace;

use crate::config::Config;
use crate::dates::{period_bounds, DateUtil, LocalTime};
use crate::error::{PostError, Result};
use crate::hooks::{markdown_to_html, Hooks, THE_CONTENT};
use crate::options::Options;
use crate::storage::{placeholders, Database};
use crate::taxonomy::{TaxonomyResolver, TaxonomyTree};

pub use query::{QueryContext, QueryResult};
pub use route::{Period, QueryKind, Route};
pub use write::{NewPost, PostUpdate};

mod query;
mod retrieve;
mod route;
mod write;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Reads and writes posts. Timestamps go in and come out in local time and
/// are kept in UTC in the database.
pub struct Posts {
    db: Database,
    taxonomy: Box<dyn TaxonomyResolver>,
    dates: Box<dyn DateUtil>,
    hooks: Hooks,
    page_size: u32,
}

impl Posts {
    pub fn new(db: Database, taxonomy: Box<dyn TaxonomyResolver>, dates: Box<dyn DateUtil>) -> Posts {
        Posts {
            db,
            taxonomy,
            dates,
            hooks: Hooks::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Opens the configured database, creating the tables if needed. The
    /// `posts_per_page` option wins over the configured page size.
    pub fn open(config: &Config) -> Result<Posts> {
        let db = Database::open(&config.database.path)?;
        db.migrate()?;

        let dates = LocalTime::from_offset_str(&config.time.utc_offset)
            .map_err(PostError::Validation)?;
        let tree = TaxonomyTree::load(&db)?;
        let page_size = Options::new(&db).posts_per_page()?
            .unwrap_or(config.defaults.page_size);

        let mut hooks = Hooks::new();
        if config.defaults.render_markdown {
            hooks.add(THE_CONTENT, markdown_to_html);
        }

        Ok(Posts::new(db, Box::new(tree), Box::new(dates))
            .with_page_size(page_size)
            .with_hooks(hooks))
    }

    pub fn with_page_size(mut self, page_size: u32) -> Posts {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Posts {
        self.hooks = hooks;
        self
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Swaps the taxonomy snapshot, e.g. after taxonomies were added.
    pub fn set_taxonomy(&mut self, taxonomy: Box<dyn TaxonomyResolver>) {
        self.taxonomy = taxonomy;
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn exists(&self, id: i64) -> Result<bool> {
        if id <= 0 {
            return Ok(false);
        }
        let found = self.db.conn()
            .query_row("SELECT id FROM posts WHERE id=?1", params![id], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn title_of(&self, id: i64) -> Result<Option<String>> {
        if id <= 0 {
            return Ok(None);
        }
        let title = self.db.conn()
            .query_row("SELECT title FROM posts WHERE id=?1", params![id], |row| row.get(0))
            .optional()?;
        Ok(title)
    }

    /// Number of posts filed directly under any of `ids`.
    pub fn count_by_taxonomies(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!("SELECT count(id) FROM posts WHERE taxonomy IN ({})", placeholders(ids.len()));
        self.count(&sql, ids.iter().map(|&id| Value::Integer(id)).collect())
    }

    /// Number of posts dated inside `period`, or of all posts when `None`.
    pub fn count_by_date(&self, period: Option<Period>) -> Result<u64> {
        let mut sql = "SELECT count(id) FROM posts".to_string();
        let mut args = vec![];
        push_period(&mut sql, &mut args, period);
        self.count(&sql, args)
    }

    fn count(&self, sql: &str, args: Vec<Value>) -> Result<u64> {
        trace!("{}", sql);
        let total: i64 = self.db.conn().query_row(sql, params_from_iter(args), |row| row.get(0))?;
        Ok(total.max(0) as u64)
    }
}

/// Appends the date range of `period` as the WHERE clause. Years before 1970
/// mean no filter, and a month outside 1..=12 widens the range to the year.
/// Years without a storable date match nothing.
fn push_period(sql: &mut String, args: &mut Vec<Value>, period: Option<Period>) {
    let Some(period) = period.filter(|p| p.year >= 1970) else {
        return;
    };
    let month = period.month.filter(|m| (1..=12).contains(m));
    match period_bounds(period.year, month) {
        Some((start, end)) => {
            sql.push_str(" WHERE date BETWEEN ? AND ?");
            args.push(Value::Text(start));
            args.push(Value::Text(end));
        }
        None => sql.push_str(" WHERE 0"),
    }
}

#[cfg(test)]
mod tests {
    use crate::test_data::{seeded_posts, sample_post};

    use super::*;

    #[test]
    fn test_exists_and_title() {
        let posts = seeded_posts();
        let id = posts.insert(sample_post("Hello", "hello", "2024-01-02 10:00:00", 1)).unwrap();

        assert!(posts.exists(id).unwrap());
        assert!(!posts.exists(id + 100).unwrap());
        assert!(!posts.exists(0).unwrap());
        assert!(!posts.exists(-1).unwrap());

        assert_eq!(posts.title_of(id).unwrap(), Some("Hello".to_string()));
        assert_eq!(posts.title_of(id + 100).unwrap(), None);
    }

    #[test]
    fn test_count_by_taxonomies() {
        let posts = seeded_posts();
        posts.insert(sample_post("A", "a", "2024-01-02 10:00:00", 3)).unwrap();
        posts.insert(sample_post("B", "b", "2024-01-03 10:00:00", 7)).unwrap();
        posts.insert(sample_post("C", "c", "2024-01-04 10:00:00", 9)).unwrap();
        posts.insert(sample_post("D", "d", "2024-01-05 10:00:00", 5)).unwrap();

        assert_eq!(posts.count_by_taxonomies(&[3, 7, 9]).unwrap(), 3);
        assert_eq!(posts.count_by_taxonomies(&[7]).unwrap(), 1);
        assert_eq!(posts.count_by_taxonomies(&[42]).unwrap(), 0);
        assert_eq!(posts.count_by_taxonomies(&[]).unwrap(), 0);
    }

    #[test]
    fn test_count_by_date() {
        let posts = seeded_posts();
        posts.insert(sample_post("A", "a", "2023-05-02 10:00:00", 1)).unwrap();
        posts.insert(sample_post("B", "b", "2023-05-31 23:00:00", 1)).unwrap();
        posts.insert(sample_post("C", "c", "2023-06-01 10:00:00", 1)).unwrap();
        posts.insert(sample_post("D", "d", "2024-05-01 10:00:00", 1)).unwrap();

        let may = Period { year: 2023, month: Some(5) };
        assert_eq!(posts.count_by_date(Some(may)).unwrap(), 2);
        assert_eq!(posts.count_by_date(Some(Period { year: 2023, month: None })).unwrap(), 3);
        assert_eq!(posts.count_by_date(Some(Period { year: 2022, month: None })).unwrap(), 0);
        assert_eq!(posts.count_by_date(None).unwrap(), 4);
        assert_eq!(posts.count_by_date(Some(Period { year: 10000, month: None })).unwrap(), 0);
        assert_eq!(posts.count_by_date(Some(Period { year: i32::MAX, month: Some(5) })).unwrap(), 0);
    }

    #[test]
    fn test_open_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = crate::config::parse_config(&format!(r##"
[database]
path = "{}"

[defaults]
page_size = 4
render_markdown = true

[time]
utc_offset = "+02:00"
"##, dir.path().join("blog.db").display())).unwrap();

        {
            let posts = Posts::open(&cfg).unwrap();
            assert_eq!(posts.page_size(), 4);
            Options::new(posts.db()).set(crate::options::POSTS_PER_PAGE, "7").unwrap();
        }

        let posts = Posts::open(&cfg).unwrap();
        assert_eq!(posts.page_size(), 7);
        assert_eq!(posts.hooks.count(THE_CONTENT), 1);
    }

    #[test]
    fn test_set_taxonomy_after_add() {
        let mut posts = seeded_posts();
        let zig = crate::taxonomy::add_taxonomy(posts.db(), "Zig", "zig", 3).unwrap();
        let comptime = sample_post("Comptime", "comptime", "2024-01-02 10:00:00", zig);
        assert_eq!(posts.insert(comptime.clone()), Err(PostError::validation("taxonomy not found")));

        let filter = crate::PostFilter::from_query_str("tax=tech/zig").unwrap();
        assert_eq!(posts.query(&filter), Err(PostError::not_found("taxonomy not found")));

        posts.set_taxonomy(Box::new(TaxonomyTree::load(posts.db()).unwrap()));
        posts.insert(comptime).unwrap();
        let result = posts.query(&filter).unwrap();
        assert_eq!(result.posts.len(), 1);
        assert_eq!(result.context.taxonomy_path.as_deref(), Some("tech/zig"));
    }
}
