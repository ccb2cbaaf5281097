use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use serde::Serialize;
use spdlog::debug;

use crate::error::{PostError, Result};
use crate::storage::{placeholders, Database};

/// Alias value of a tag that stands on its own.
pub const NO_ALIAS: i64 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    /// Id of the tag this one is a synonym of, or [`NO_ALIAS`]
    pub alias: i64,
}

/// Free-form labels attached to posts through the `post_tags` table.
pub struct Tags<'a> {
    db: &'a Database,
}

/// Escapes the LIKE wildcards so the pattern matches literally.
fn like_escape(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl<'a> Tags<'a> {
    pub fn new(db: &'a Database) -> Self {
        Tags { db }
    }

    /// Stores a new tag and returns its id. `alias` must be [`NO_ALIAS`] or an
    /// existing tag.
    pub fn add(&self, name: &str, alias: i64) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PostError::validation("name required"));
        }
        if self.has(name)? {
            return Err(PostError::validation("tag already exists"));
        }
        if alias != NO_ALIAS && !self.exists(alias)? {
            return Err(PostError::not_found("tag not found"));
        }

        let conn = self.db.conn();
        conn.execute("INSERT INTO tags (name, alias) VALUES (?1, ?2)", params![name, alias])?;
        let id = conn.last_insert_rowid();
        debug!("Added tag {} ({})", id, name);
        Ok(id)
    }

    /// Tags whose name contains `pattern`, ordered by id.
    pub fn search(&self, pattern: &str) -> Result<Vec<Tag>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, name, alias FROM tags WHERE name LIKE ?1 ESCAPE '\\' ORDER BY id")?;
        let rows = stmt.query_map(params![format!("%{}%", like_escape(pattern))], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                alias: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn id_of(&self, name: &str) -> Result<Option<i64>> {
        let id = self.db.conn()
            .query_row("SELECT id FROM tags WHERE name=?1 LIMIT 1", params![name.trim()], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        Ok(self.id_of(name)?.is_some())
    }

    fn exists(&self, id: i64) -> Result<bool> {
        let found = self.db.conn()
            .query_row("SELECT id FROM tags WHERE id=?1", params![id], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Names of the tags on a post, in the order they were attached.
    pub fn names_of_post(&self, post_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT tags.name FROM post_tags JOIN tags ON post_tags.tag_id = tags.id
             WHERE post_tags.post_id = ?1 ORDER BY post_tags.id")?;
        let rows = stmt.query_map(params![post_id], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Ids of the tags on a post. With `with_aliases` the list also holds the
    /// tags those are aliases of and the tags that are aliases of them.
    pub fn ids_of_post(&self, post_id: i64, with_aliases: bool) -> Result<Vec<i64>> {
        let mut stmt = self.db.conn()
            .prepare("SELECT tag_id FROM post_tags WHERE post_id=?1 ORDER BY id")?;
        let rows = stmt.query_map(params![post_id], |row| row.get(0))?;
        let ids = rows.collect::<std::result::Result<Vec<i64>, _>>()?;

        if with_aliases {
            return self.expand_aliases(ids);
        }
        Ok(ids)
    }

    fn expand_aliases(&self, ids: Vec<i64>) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(ids);
        }

        let marks = placeholders(ids.len());
        let args = || ids.iter().map(|&id| Value::Integer(id)).collect::<Vec<_>>();
        let conn = self.db.conn();

        let mut stmt = conn.prepare(&format!("SELECT alias FROM tags WHERE id IN ({}) AND alias > 0 ORDER BY id", marks))?;
        let targets = stmt.query_map(params_from_iter(args()), |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;

        let mut stmt = conn.prepare(&format!("SELECT id FROM tags WHERE alias IN ({}) ORDER BY id", marks))?;
        let synonyms = stmt.query_map(params_from_iter(args()), |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;

        let mut expanded = ids;
        for id in targets.into_iter().chain(synonyms) {
            if !expanded.contains(&id) {
                expanded.push(id);
            }
        }
        Ok(expanded)
    }

    /// Tags a post. Returns false if the post already had the tag.
    pub fn attach(&self, post_id: i64, tag_id: i64) -> Result<bool> {
        let conn = self.db.conn();
        let posts: i64 = conn.query_row("SELECT count(id) FROM posts WHERE id=?1", params![post_id], |row| row.get(0))?;
        if posts == 0 {
            return Err(PostError::not_found("post not found"));
        }
        if !self.exists(tag_id)? {
            return Err(PostError::not_found("tag not found"));
        }

        let added = conn.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
            params![post_id, tag_id])?;
        Ok(added > 0)
    }

    /// Removes a tag from a post. Returns false if the post did not have it.
    pub fn detach(&self, post_id: i64, tag_id: i64) -> Result<bool> {
        let removed = self.db.conn().execute(
            "DELETE FROM post_tags WHERE post_id=?1 AND tag_id=?2",
            params![post_id, tag_id])?;
        Ok(removed > 0)
    }

    /// Makes the tags of a post match the comma separated `names`. Unknown
    /// names are created as new tags.
    pub fn set_for_post(&self, post_id: i64, names: &str) -> Result<()> {
        let wanted: Vec<&str> = names.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();
        let current = self.names_of_post(post_id)?;

        for name in current.iter().filter(|name| !wanted.contains(&name.as_str())) {
            if let Some(tag_id) = self.id_of(name)? {
                self.detach(post_id, tag_id)?;
            }
        }

        for name in wanted {
            if current.iter().any(|c| c == name) {
                continue;
            }
            let tag_id = match self.id_of(name)? {
                Some(id) => id,
                None => self.add(name, NO_ALIAS)?,
            };
            self.attach(post_id, tag_id)?;
        }

        Ok(())
    }
}
