use rusqlite::params_from_iter;
use rusqlite::types::Value;
use spdlog::trace;

use crate::error::{PostError, Result};
use crate::paginator::Paginator;
use crate::post::{Post, PostType};
use crate::storage::placeholders;

use super::{push_period, Period, Posts};

/// Rows of one page plus the total across all pages.
pub(super) struct Page {
    pub posts: Vec<Post>,
    pub total: u64,
}

impl Posts {
    pub(super) fn query_by_id(&self, id: i64, cutoff: Option<&str>) -> Result<Vec<Post>> {
        let mut sql = format!("SELECT {} FROM posts WHERE id = ?", Post::COLUMNS);
        let mut args = vec![Value::Integer(id)];
        self.push_cutoff(&mut sql, &mut args, cutoff)?;
        sql.push_str(" LIMIT 1");
        self.fetch(&sql, args)
    }

    pub(super) fn query_by_slug(&self, taxonomy: i64, slug: &str, cutoff: Option<&str>) -> Result<Vec<Post>> {
        let mut sql = format!("SELECT {} FROM posts WHERE taxonomy = ? AND slug = ?", Post::COLUMNS);
        let mut args = vec![Value::Integer(taxonomy), Value::Text(slug.to_string())];
        self.push_cutoff(&mut sql, &mut args, cutoff)?;
        self.fetch(&sql, args)
    }

    pub(super) fn query_by_page(&self, slug: &str, cutoff: Option<&str>) -> Result<Vec<Post>> {
        let mut sql = format!("SELECT {} FROM posts WHERE type = ? AND slug = ?", Post::COLUMNS);
        let mut args = vec![Value::Text(PostType::Page.to_string()), Value::Text(slug.to_string())];
        self.push_cutoff(&mut sql, &mut args, cutoff)?;
        self.fetch(&sql, args)
    }

    /// Posts filed under `root` or any of its `descendants`, newest first.
    pub(super) fn query_by_tax(&self, root: i64, descendants: &[i64], paginator: &Paginator) -> Result<Page> {
        let mut ids = vec![root];
        ids.extend_from_slice(descendants);

        let mut sql = format!("SELECT {} FROM posts WHERE taxonomy IN ({})", Post::COLUMNS, placeholders(ids.len()));
        let mut args: Vec<Value> = ids.iter().map(|&id| Value::Integer(id)).collect();
        push_page(&mut sql, &mut args, paginator);

        let posts = self.fetch(&sql, args)?;
        // Not in the same transaction as the page, so it can drift under concurrent writes
        let total = self.count_by_taxonomies(&ids)?;
        Ok(Page { posts, total })
    }

    /// Posts dated inside `period` (all posts when `None`), newest first.
    pub(super) fn query_by_date(&self, period: Option<Period>, paginator: &Paginator) -> Result<Page> {
        let mut sql = format!("SELECT {} FROM posts", Post::COLUMNS);
        let mut args = vec![];
        push_period(&mut sql, &mut args, period);
        push_page(&mut sql, &mut args, paginator);

        let posts = self.fetch(&sql, args)?;
        let total = self.count_by_date(period)?;
        Ok(Page { posts, total })
    }

    /// Keeps only rows modified after the local `cutoff`.
    fn push_cutoff(&self, sql: &mut String, args: &mut Vec<Value>, cutoff: Option<&str>) -> Result<()> {
        if let Some(cutoff) = cutoff {
            let cutoff = self.dates.local_to_utc(cutoff)
                .ok_or_else(|| PostError::rejected("invalid modified cutoff"))?;
            sql.push_str(" AND modified > ?");
            args.push(Value::Text(cutoff));
        }
        Ok(())
    }

    fn fetch(&self, sql: &str, args: Vec<Value>) -> Result<Vec<Post>> {
        trace!("{}", sql);
        let mut stmt = self.db.conn().prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(args), Post::from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

/// Newest first, then the page window.
fn push_page(sql: &mut String, args: &mut Vec<Value>, paginator: &Paginator) {
    sql.push_str(" ORDER BY date DESC LIMIT ? OFFSET ?");
    args.push(Value::Integer(paginator.page_size() as i64));
    args.push(Value::Integer(i64::try_from(paginator.offset()).unwrap_or(i64::MAX)));
}
