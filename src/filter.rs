use crate::dates::DateUtil;
use crate::error::{PostError, Result};

/// Request for [`Posts::query`](crate::posts::Posts::query). Which fields are
/// set decides how the posts are looked up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub id: Option<i64>,
    /// Taxonomy path, e.g. `tech/rust`
    pub tax: Option<String>,
    pub slug: Option<String>,
    pub yy: Option<i64>,
    pub mm: Option<i64>,
    pub pageno: Option<i64>,
    /// Local time. Only posts modified after it are returned.
    pub modified: Option<String>,
    pub feed: bool,
}

fn parse_int(key: &str, val: &str) -> Result<i64> {
    val.parse::<i64>()
        .map_err(|_| PostError::FilterRejected(format!("{} is not a number: {}", key, val)))
}

impl PostFilter {
    /// Builds a filter from a URL query string such as `tax=tech/rust&pageno=2`.
    /// Empty values are ignored. Unknown keys are ignored. `page` is accepted
    /// as an alias of `pageno`.
    pub fn from_query_str(buf: &str) -> Result<PostFilter> {
        let items: Vec<(String, String)> = serde_urlencoded::from_str(buf)
            .map_err(|e| PostError::FilterRejected(format!("malformed query string: {}", e)))?;

        let mut filter = PostFilter::default();
        for (key, val) in items {
            let val = val.trim();
            if val.is_empty() {
                continue;
            }

            match key.as_str() {
                "id" => filter.id = Some(parse_int(&key, val)?),
                "tax" => filter.tax = Some(val.to_string()),
                "slug" => filter.slug = Some(val.to_string()),
                "yy" => filter.yy = Some(parse_int(&key, val)?),
                "mm" => filter.mm = Some(parse_int(&key, val)?),
                "pageno" | "page" => filter.pageno = Some(parse_int(&key, val)?),
                "modified" => filter.modified = Some(val.to_string()),
                "feed" => filter.feed = !matches!(val, "0" | "false"),
                _ => {}
            }
        }

        Ok(filter)
    }

    /// Rejects the whole filter if any present field is out of range.
    pub fn validate(&self, dates: &dyn DateUtil) -> Result<()> {
        if let Some(modified) = self.modified() {
            if !dates.is_valid_local_datetime(modified) {
                return Err(PostError::rejected("invalid modified cutoff"));
            }
        }

        if matches!(self.id, Some(id) if id <= 0) {
            return Err(PostError::rejected("id must be positive"));
        }
        if matches!(self.yy, Some(yy) if yy < 1970) {
            return Err(PostError::rejected("year out of range"));
        }
        if matches!(self.mm, Some(mm) if !(1..=12).contains(&mm)) {
            return Err(PostError::rejected("month out of range"));
        }
        if matches!(self.pageno, Some(pageno) if pageno < 1) {
            return Err(PostError::rejected("page number out of range"));
        }

        Ok(())
    }

    pub fn tax(&self) -> Option<&str> {
        self.tax.as_deref().filter(|s| !s.is_empty())
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|s| !s.is_empty())
    }

    pub fn modified(&self) -> Option<&str> {
        self.modified.as_deref().filter(|s| !s.is_empty())
    }
}
