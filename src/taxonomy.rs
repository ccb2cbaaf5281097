use std::collections::{HashMap, HashSet};

use rusqlite::params;
use serde::Serialize;

use crate::error::{PostError, Result};
use crate::slug::is_valid_slug;
use crate::storage::Database;

/// Parent id used by top level taxonomies.
pub const ROOT_PARENT: i64 = 0;

/// Lookups over the category tree used by the post queries.
pub trait TaxonomyResolver {
    /// `tech/rust` -> id of `rust` under `tech`.
    fn resolve(&self, path: &str) -> Option<i64>;
    fn path_of(&self, id: i64) -> Option<String>;
    fn exists(&self, id: i64) -> bool;
    /// Every id below `id`, not including `id` itself.
    fn descendants_of(&self, id: i64) -> Vec<i64>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Taxonomy {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent: i64,
}

/// A taxonomy with its children nested below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyNode {
    #[serde(flatten)]
    pub taxonomy: Taxonomy,
    pub children: Vec<TaxonomyNode>,
}

/// In-memory snapshot of the `taxonomies` table.
pub struct TaxonomyTree {
    nodes: HashMap<i64, Taxonomy>,
    // parent id -> child ids, ordered by id
    children: HashMap<i64, Vec<i64>>,
}

impl TaxonomyTree {
    pub fn from_rows(rows: Vec<Taxonomy>) -> TaxonomyTree {
        let mut nodes = HashMap::new();
        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();

        for row in rows {
            children.entry(row.parent).or_default().push(row.id);
            nodes.insert(row.id, row);
        }
        for ids in children.values_mut() {
            ids.sort();
        }

        TaxonomyTree { nodes, children }
    }

    pub fn load(db: &Database) -> Result<TaxonomyTree> {
        let mut stmt = db.conn().prepare("SELECT id, name, slug, parent FROM taxonomies")?;
        let rows = stmt.query_map([], |row| {
            Ok(Taxonomy {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
                parent: row.get(3)?,
            })
        })?;
        let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(rows))
    }

    pub fn get(&self, id: i64) -> Option<&Taxonomy> {
        self.nodes.get(&id)
    }

    /// Direct children of `parent`. Use [`ROOT_PARENT`] for the top level.
    pub fn children(&self, parent: i64) -> Vec<&Taxonomy> {
        match self.children.get(&parent) {
            Some(ids) => ids.iter().filter_map(|id| self.nodes.get(id)).collect(),
            None => vec![],
        }
    }

    pub fn list(&self) -> Vec<&Taxonomy> {
        let mut all: Vec<&Taxonomy> = self.nodes.values().collect();
        all.sort_by_key(|t| t.id);
        all
    }

    /// Top level taxonomies with their subtrees. Rows whose parent is missing
    /// are not reachable from the top and are left out.
    pub fn tree(&self) -> Vec<TaxonomyNode> {
        self.subtree(ROOT_PARENT, &mut HashSet::new())
    }

    fn subtree(&self, parent: i64, visited: &mut HashSet<i64>) -> Vec<TaxonomyNode> {
        let mut nodes = vec![];
        for taxonomy in self.children(parent) {
            if !visited.insert(taxonomy.id) {
                continue;
            }
            nodes.push(TaxonomyNode {
                taxonomy: taxonomy.clone(),
                children: self.subtree(taxonomy.id, visited),
            });
        }
        nodes
    }

    fn child_by_slug(&self, parent: i64, slug: &str) -> Option<i64> {
        self.children(parent).into_iter()
            .find(|t| t.slug == slug)
            .map(|t| t.id)
    }
}

impl TaxonomyResolver for TaxonomyTree {
    fn resolve(&self, path: &str) -> Option<i64> {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        segments.peek()?;

        let mut current = ROOT_PARENT;
        for slug in segments {
            current = self.child_by_slug(current, slug)?;
        }
        Some(current)
    }

    fn path_of(&self, id: i64) -> Option<String> {
        let mut slugs = vec![];
        let mut current = self.nodes.get(&id)?;
        loop {
            slugs.push(current.slug.as_str());
            // A malformed table could hold a parent cycle
            if current.parent == ROOT_PARENT || slugs.len() > self.nodes.len() {
                break;
            }
            current = self.nodes.get(&current.parent)?;
        }
        slugs.reverse();
        Some(slugs.join("/"))
    }

    fn exists(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    fn descendants_of(&self, id: i64) -> Vec<i64> {
        let mut found = vec![];
        let mut visited = HashSet::from([id]);
        let mut pending = vec![id];

        while let Some(parent) = pending.pop() {
            if let Some(ids) = self.children.get(&parent) {
                for &child in ids.iter().rev() {
                    if visited.insert(child) {
                        found.push(child);
                        pending.push(child);
                    }
                }
            }
        }

        found.sort();
        found
    }
}

/// Stores a new taxonomy and returns its id. The slug must be unique among
/// its siblings so paths stay unambiguous.
pub fn add_taxonomy(db: &Database, name: &str, slug: &str, parent: i64) -> Result<i64> {
    if name.trim().is_empty() {
        return Err(PostError::validation("name required"));
    }
    if !is_valid_slug(slug) {
        return Err(PostError::validation("invalid slug"));
    }

    let conn = db.conn();
    if parent != ROOT_PARENT {
        let parents: i64 = conn.query_row(
            "SELECT count(id) FROM taxonomies WHERE id=?1", params![parent], |row| row.get(0))?;
        if parents == 0 {
            return Err(PostError::not_found("taxonomy not found"));
        }
    }

    let siblings: i64 = conn.query_row(
        "SELECT count(id) FROM taxonomies WHERE parent=?1 AND slug=?2",
        params![parent, slug],
        |row| row.get(0))?;
    if siblings > 0 {
        return Err(PostError::validation("slug already used"));
    }

    conn.execute(
        "INSERT INTO taxonomies (name, slug, parent) VALUES (?1, ?2, ?3)",
        params![name, slug, parent])?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use crate::test_data::sample_taxonomies;

    use super::*;

    #[test]
    fn test_resolve() {
        let tree = TaxonomyTree::from_rows(sample_taxonomies());
        assert_eq!(tree.resolve("uncategorized"), Some(1));
        assert_eq!(tree.resolve("tech"), Some(3));
        assert_eq!(tree.resolve("tech/rust"), Some(7));
        assert_eq!(tree.resolve("/tech/rust/"), Some(7));
        assert_eq!(tree.resolve("tech/rust/async"), Some(11));
        assert_eq!(tree.resolve("rust"), None);
        assert_eq!(tree.resolve("tech/python"), None);
        assert_eq!(tree.resolve(""), None);
        assert_eq!(tree.resolve("/"), None);
    }

    #[test]
    fn test_path_of() {
        let tree = TaxonomyTree::from_rows(sample_taxonomies());
        assert_eq!(tree.path_of(3), Some("tech".to_string()));
        assert_eq!(tree.path_of(11), Some("tech/rust/async".to_string()));
        assert_eq!(tree.path_of(42), None);
    }

    #[test]
    fn test_descendants() {
        let tree = TaxonomyTree::from_rows(sample_taxonomies());
        assert_eq!(tree.descendants_of(3), vec![7, 9, 11]);
        assert_eq!(tree.descendants_of(7), vec![11]);
        assert!(tree.descendants_of(1).is_empty());
        assert!(tree.descendants_of(42).is_empty());
    }

    #[test]
    fn test_tree() {
        let tree = TaxonomyTree::from_rows(sample_taxonomies());
        let top = tree.tree();
        let ids = |nodes: &[TaxonomyNode]| nodes.iter().map(|n| n.taxonomy.id).collect::<Vec<_>>();

        assert_eq!(ids(&top), vec![1, 3, 5]);
        assert_eq!(ids(&top[1].children), vec![7, 9]);
        assert_eq!(ids(&top[1].children[0].children), vec![11]);
        assert!(top[1].children[1].children.is_empty());
        assert!(top[0].children.is_empty());

        let json = serde_json::to_value(&top[1]).unwrap();
        assert_eq!(json["slug"], "tech");
        assert_eq!(json["children"][0]["slug"], "rust");
    }

    #[test]
    fn test_tree_skips_unreachable_rows() {
        let tree = TaxonomyTree::from_rows(vec![
            Taxonomy { id: 1, name: "a".to_string(), slug: "a".to_string(), parent: 2 },
            Taxonomy { id: 2, name: "b".to_string(), slug: "b".to_string(), parent: 1 },
            Taxonomy { id: 3, name: "c".to_string(), slug: "c".to_string(), parent: ROOT_PARENT },
        ]);
        let top = tree.tree();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].taxonomy.id, 3);
    }

    #[test]
    fn test_cycle_does_not_loop() {
        let tree = TaxonomyTree::from_rows(vec![
            Taxonomy { id: 1, name: "a".to_string(), slug: "a".to_string(), parent: 2 },
            Taxonomy { id: 2, name: "b".to_string(), slug: "b".to_string(), parent: 1 },
        ]);
        assert_eq!(tree.descendants_of(1), vec![2]);
        assert!(tree.path_of(1).is_some());
    }

    #[test]
    fn test_add_taxonomy() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();

        let tech = add_taxonomy(&db, "Tech", "tech", ROOT_PARENT).unwrap();
        let rust = add_taxonomy(&db, "Rust", "rust", tech).unwrap();

        assert_eq!(add_taxonomy(&db, "Rust", "rust", tech), Err(PostError::validation("slug already used")));
        assert_eq!(add_taxonomy(&db, "Orphan", "orphan", 99), Err(PostError::not_found("taxonomy not found")));
        assert_eq!(add_taxonomy(&db, "Bad", "bad slug", ROOT_PARENT), Err(PostError::validation("invalid slug")));
        assert_eq!(add_taxonomy(&db, " ", "blank", ROOT_PARENT), Err(PostError::validation("name required")));

        let tree = TaxonomyTree::load(&db).unwrap();
        assert_eq!(tree.resolve("tech/rust"), Some(rust));
        assert_eq!(tree.children(ROOT_PARENT).len(), 1);
        assert_eq!(tree.list().len(), 2);
        assert_eq!(tree.get(rust).map(|t| t.name.as_str()), Some("Rust"));
    }
}
