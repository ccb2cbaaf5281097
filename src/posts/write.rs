use rusqlite::params;
use serde::Deserialize;
use spdlog::debug;

use crate::error::{PostError, Result};
use crate::post::PostType;
use crate::slug::is_valid_slug;

use super::Posts;

pub const DEFAULT_TAXONOMY: i64 = 1;
pub const DEFAULT_STATUS: &str = "public";

/// Fields of a new post. Timestamps are local time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewPost {
    /// Defaults to now
    pub date: Option<String>,
    /// Defaults to `date`
    pub modified: Option<String>,
    pub title: String,
    pub content: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    /// Defaults to 1
    pub taxonomy: Option<i64>,
    /// Defaults to `public`
    pub status: Option<String>,
    /// Defaults to 1
    pub comment_status: Option<i64>,
    pub password: Option<String>,
}

/// Fields rewritten by [`Posts::update`]. A missing `date` keeps the stored one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PostUpdate {
    pub date: Option<String>,
    /// Defaults to now
    pub modified: Option<String>,
    pub title: String,
    pub content: String,
    pub slug: String,
    /// Defaults to 1
    pub taxonomy: Option<i64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Posts {
    /// Stores a new post and returns its id.
    pub fn insert(&self, new_post: NewPost) -> Result<i64> {
        let date = non_empty(new_post.date).unwrap_or_else(|| self.dates.now_local());
        let taxonomy = new_post.taxonomy.unwrap_or(DEFAULT_TAXONOMY);
        let status = non_empty(new_post.status).unwrap_or_else(|| DEFAULT_STATUS.to_string());

        self.validate(&new_post.title, &new_post.content, &new_post.slug, taxonomy)?;

        let modified = non_empty(new_post.modified).unwrap_or_else(|| date.clone());
        let date = self.to_utc(&date)?;
        let modified = self.to_utc(&modified)?;

        self.db.conn().execute(
            "INSERT INTO posts (date, modified, title, content, slug, type, taxonomy, status, comment_status, password)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                date,
                modified,
                new_post.title,
                new_post.content,
                new_post.slug,
                new_post.post_type,
                taxonomy,
                status,
                new_post.comment_status.unwrap_or(1),
                new_post.password.unwrap_or_default(),
            ])?;

        let id = self.db.conn().last_insert_rowid();
        debug!("Inserted post {} ({})", id, new_post.slug);
        Ok(id)
    }

    /// Rewrites an existing post. The post must exist before anything else
    /// is checked.
    pub fn update(&self, id: i64, changes: PostUpdate) -> Result<()> {
        if !self.exists(id)? {
            return Err(PostError::not_found("post not found"));
        }

        let taxonomy = changes.taxonomy.unwrap_or(DEFAULT_TAXONOMY);
        self.validate(&changes.title, &changes.content, &changes.slug, taxonomy)?;

        let modified = non_empty(changes.modified).unwrap_or_else(|| self.dates.now_local());
        let date = non_empty(changes.date);
        if let Some(ref date) = date {
            if !self.dates.is_valid_local_datetime(date) {
                return Err(PostError::validation("invalid datetime"));
            }
        }
        let modified = self.to_utc(&modified)?;

        let conn = self.db.conn();
        match date {
            Some(date) => {
                let date = self.to_utc(&date)?;
                conn.execute(
                    "UPDATE posts SET date=?1, modified=?2, title=?3, content=?4, slug=?5, taxonomy=?6 WHERE id=?7",
                    params![date, modified, changes.title, changes.content, changes.slug, taxonomy, id])?;
            }
            None => {
                conn.execute(
                    "UPDATE posts SET modified=?1, title=?2, content=?3, slug=?4, taxonomy=?5 WHERE id=?6",
                    params![modified, changes.title, changes.content, changes.slug, taxonomy, id])?;
            }
        }

        debug!("Updated post {}", id);
        Ok(())
    }

    /// Field rules shared by insert and update, reported in this order.
    fn validate(&self, title: &str, content: &str, slug: &str, taxonomy: i64) -> Result<()> {
        if title.is_empty() {
            return Err(PostError::validation("title required"));
        }
        if content.is_empty() {
            return Err(PostError::validation("content required"));
        }
        if !is_valid_slug(slug) {
            return Err(PostError::validation("invalid slug"));
        }
        if taxonomy <= 0 || !self.taxonomy.exists(taxonomy) {
            return Err(PostError::validation("taxonomy not found"));
        }
        Ok(())
    }

    fn to_utc(&self, local: &str) -> Result<String> {
        self.dates.local_to_utc(local)
            .ok_or_else(|| PostError::validation("invalid datetime"))
    }
}
