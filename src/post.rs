use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Pages are looked up by slug alone, posts by slug inside a taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Post,
    Page,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Page => "page",
        }
    }
}

impl Display for PostType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(PostType::Post),
            "page" => Ok(PostType::Page),
            _ => Err(format!("Unknown post type {}", s)),
        }
    }
}

impl ToSql for PostType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PostType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        PostType::from_str(s).map_err(|e| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub date: String,
    pub modified: String,
    pub title: String,
    pub content: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub taxonomy: i64,
    pub status: String,
    pub comment_status: i64,
    pub password: String,
}

impl Post {
    pub(crate) const COLUMNS: &'static str =
        "id, date, modified, title, content, slug, type, taxonomy, status, comment_status, password";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
        Ok(Post {
            id: row.get(0)?,
            date: row.get(1)?,
            modified: row.get(2)?,
            title: row.get(3)?,
            content: row.get(4)?,
            slug: row.get(5)?,
            post_type: row.get(6)?,
            taxonomy: row.get(7)?,
            status: row.get(8)?,
            comment_status: row.get(9)?,
            password: row.get(10)?,
        })
    }
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "id={}, date={}, modified={}, type={}, taxonomy={}, slug={}\ntitle={}\ncontent:\n{}",
               self.id,
               self.date,
               self.modified,
               self.post_type,
               self.taxonomy,
               self.slug,
               self.title,
               self.content
        )
    }
}
