use rusqlite::params;

use crate::dates::{parse_date_time, LocalTime};
use crate::post::PostType;
use crate::posts::{NewPost, Posts};
use crate::storage::Database;
use crate::taxonomy::{Taxonomy, TaxonomyTree};

/// "Now" of the engine returned by [`seeded_posts`], in local time.
pub const FIXED_NOW: &str = "2024-06-01 12:00:00";

/// uncategorized(1), tech(3) > [rust(7) > async(11), go(9)], life(5)
pub fn sample_taxonomies() -> Vec<Taxonomy> {
    let tax = |id: i64, name: &str, slug: &str, parent: i64| Taxonomy {
        id,
        name: name.to_string(),
        slug: slug.to_string(),
        parent,
    };

    vec![
        tax(1, "Uncategorized", "uncategorized", 0),
        tax(3, "Tech", "tech", 0),
        tax(5, "Life", "life", 0),
        tax(7, "Rust", "rust", 3),
        tax(9, "Go", "go", 3),
        tax(11, "Async", "async", 7),
    ]
}

/// Engine over an in-memory database holding the sample taxonomies and no
/// posts. Local time is UTC+8.
pub fn seeded_posts() -> Posts {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    for t in sample_taxonomies() {
        db.conn().execute(
            "INSERT INTO taxonomies (id, name, slug, parent) VALUES (?1, ?2, ?3, ?4)",
            params![t.id, t.name, t.slug, t.parent]).unwrap();
    }

    let tree = TaxonomyTree::load(&db).unwrap();
    let dates = LocalTime::from_offset_str("+08:00").unwrap()
        .with_fixed_now(parse_date_time(FIXED_NOW).unwrap());

    Posts::new(db, Box::new(tree), Box::new(dates))
}

pub fn sample_post(title: &str, slug: &str, date: &str, taxonomy: i64) -> NewPost {
    NewPost {
        date: Some(date.to_string()),
        title: title.to_string(),
        content: "sample content".to_string(),
        slug: slug.to_string(),
        taxonomy: Some(taxonomy),
        ..Default::default()
    }
}

pub fn sample_page(title: &str, slug: &str, date: &str) -> NewPost {
    NewPost {
        post_type: PostType::Page,
        ..sample_post(title, slug, date, 1)
    }
}

/// Raw `(date, modified)` as stored, in UTC.
pub fn stored_row(posts: &Posts, id: i64) -> (String, String) {
    posts.db().conn()
        .query_row("SELECT date, modified FROM posts WHERE id=?1", params![id], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
}
