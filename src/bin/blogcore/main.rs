use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use spdlog::{info, warn};

use blogcore::logger::configure_logger;
use blogcore::options::Options;
use blogcore::posts::Period;
use blogcore::slug::suggest_slug;
use blogcore::tags::{Tags, NO_ALIAS};
use blogcore::taxonomy::{add_taxonomy, TaxonomyResolver, TaxonomyTree, ROOT_PARENT};
use blogcore::{NewPost, PostFilter, PostType, PostUpdate, Posts};

use crate::config::{default_config_path, open_config};
use crate::config_data::write_sample_cfg;

mod config;
mod config_data;

const CFG_FILE_NAME: &str = "blogcore.toml";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config path
    #[arg(short, long)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Writes a sample configuration file
    SampleConfig {
        /// Destination. Defaults to the user configuration directory
        out: Option<PathBuf>,
    },
    /// Creates the database tables and the default category
    Init,
    /// Stores a new post or page
    Insert(InsertArgs),
    /// Rewrites an existing post
    Update(UpdateArgs),
    /// Runs a query string, e.g. `tax=tech/rust&pageno=2`
    Query {
        query: String,
    },
    /// Counts posts published in a year or month
    CountDate {
        year: i32,
        month: Option<u32>,
    },
    /// Counts posts filed under the given categories
    CountTax {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Prints the title of a post
    Title {
        id: i64,
    },
    /// Checks whether a post exists
    Exists {
        id: i64,
    },
    /// Manages categories
    #[command(subcommand)]
    Category(CategoryCmd),
    /// Manages stored options
    #[command(subcommand)]
    Option(OptionCmd),
    /// Manages tags and the tags of posts
    #[command(subcommand)]
    Tag(TagCmd),
    /// Suggests a slug for a title
    Slug {
        title: String,
    },
}

#[derive(ClapArgs, Debug)]
struct PostFields {
    /// Title of the post
    #[arg(short, long)]
    title: String,

    /// Slug of the post. Derived from the title if empty
    #[arg(short, long)]
    slug: Option<String>,

    /// Content of the post
    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,

    /// File holding the content of the post
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// Local publication time, `YYYY-MM-DD HH:MM:SS`
    #[arg(short, long)]
    date: Option<String>,

    /// Local modification time, `YYYY-MM-DD HH:MM:SS`
    #[arg(short, long)]
    modified: Option<String>,

    /// Category id
    #[arg(long)]
    taxonomy: Option<i64>,
}

impl PostFields {
    fn slug(&self) -> String {
        match self.slug {
            Some(ref slug) => slug.clone(),
            None => suggest_slug(&self.title),
        }
    }

    fn content(&self) -> Result<String> {
        if let Some(ref path) = self.content_file {
            return Ok(fs::read_to_string(path)?);
        }
        Ok(self.content.clone().unwrap_or_default())
    }
}

#[derive(ClapArgs, Debug)]
struct InsertArgs {
    #[command(flatten)]
    fields: PostFields,

    /// Stores a standalone page instead of a post
    #[arg(long)]
    page: bool,

    /// Visibility status
    #[arg(long)]
    status: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct UpdateArgs {
    /// Id of the post
    id: i64,

    #[command(flatten)]
    fields: PostFields,
}

#[derive(Subcommand, Debug)]
enum CategoryCmd {
    /// Adds a category
    Add {
        name: String,
        /// Slug of the category. Derived from the name if empty
        #[arg(short, long)]
        slug: Option<String>,
        /// Parent category id, 0 for a top level category
        #[arg(short, long, default_value_t = ROOT_PARENT)]
        parent: i64,
    },
    /// Lists all categories with their paths
    List {
        /// Nests each category under its parent
        #[arg(long)]
        tree: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TagCmd {
    /// Adds a tag
    Add {
        name: String,
        /// Id of the tag this one is a synonym of
        #[arg(short, long, default_value_t = NO_ALIAS)]
        alias: i64,
    },
    /// Finds tags whose name contains the pattern
    Search { pattern: String },
    /// Prints the id of a tag
    Id { name: String },
    /// Lists the tags of a post
    Post {
        post_id: i64,
        /// Also lists the aliases of those tags
        #[arg(long)]
        aliases: bool,
    },
    /// Tags a post
    Attach { post_id: i64, tag_id: i64 },
    /// Removes a tag from a post
    Detach { post_id: i64, tag_id: i64 },
    /// Replaces the tags of a post with a comma separated list of names
    Set { post_id: i64, names: String },
}

#[derive(Subcommand, Debug)]
enum OptionCmd {
    Get { name: String },
    Set { name: String, value: String },
    Del { name: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match &args.command {
        Command::SampleConfig { out } => {
            let Some(out) = out.clone().or_else(default_config_path) else {
                bail!("Could not find a configuration directory");
            };
            write_sample_cfg(&out)?;
            return print_json(&json!({ "path": out }));
        }
        Command::Slug { title } => {
            return print_json(&json!({ "slug": suggest_slug(title) }));
        }
        _ => {}
    }

    let config = match open_config(args.config_path.map(PathBuf::from)) {
        Ok(config) => config,
        Err(err) => bail!("{}. Please run blogcore --help", err),
    };

    if let Err(err) = configure_logger(&config) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let posts = Posts::open(&config)?;
    info!("Opened database {}", config.database.path.display());

    match args.command {
        Command::SampleConfig { .. } | Command::Slug { .. } => {}
        Command::Init => {
            let tree = TaxonomyTree::load(posts.db())?;
            if tree.list().is_empty() {
                let id = add_taxonomy(posts.db(), "Uncategorized", "uncategorized", ROOT_PARENT)?;
                info!("Created default category id={}", id);
            }
            print_json(&json!({ "initialized": true }))?;
        }
        Command::Insert(insert) => {
            let new_post = NewPost {
                date: insert.fields.date.clone(),
                modified: insert.fields.modified.clone(),
                title: insert.fields.title.clone(),
                content: insert.fields.content()?,
                slug: insert.fields.slug(),
                post_type: if insert.page { PostType::Page } else { PostType::Post },
                taxonomy: insert.fields.taxonomy,
                status: insert.status,
                ..Default::default()
            };
            let id = posts.insert(new_post)?;
            info!("Inserted post id={}", id);
            print_json(&json!({ "id": id }))?;
        }
        Command::Update(update) => {
            let changes = PostUpdate {
                date: update.fields.date.clone(),
                modified: update.fields.modified.clone(),
                title: update.fields.title.clone(),
                content: update.fields.content()?,
                slug: update.fields.slug(),
                taxonomy: update.fields.taxonomy,
            };
            posts.update(update.id, changes)?;
            info!("Updated post id={}", update.id);
            print_json(&json!({ "id": update.id }))?;
        }
        Command::Query { query } => {
            let filter = PostFilter::from_query_str(&query)?;
            let result = posts.query(&filter)?;
            let page_count = result.context.page_count();
            print_json(&json!({
                "posts": result.posts,
                "context": result.context,
                "page_count": page_count,
            }))?;
        }
        Command::CountDate { year, month } => {
            let total = posts.count_by_date(Some(Period { year, month }))?;
            print_json(&json!({ "total": total }))?;
        }
        Command::CountTax { ids } => {
            print_json(&json!({ "total": posts.count_by_taxonomies(&ids)? }))?;
        }
        Command::Title { id } => {
            print_json(&json!({ "id": id, "title": posts.title_of(id)? }))?;
        }
        Command::Exists { id } => {
            print_json(&json!({ "id": id, "exists": posts.exists(id)? }))?;
        }
        Command::Category(CategoryCmd::Add { name, slug, parent }) => {
            let slug = slug.unwrap_or_else(|| suggest_slug(&name));
            let id = add_taxonomy(posts.db(), &name, &slug, parent)?;
            info!("Added category id={} slug={}", id, slug);
            print_json(&json!({ "id": id, "slug": slug }))?;
        }
        Command::Category(CategoryCmd::List { tree: true }) => {
            print_json(&TaxonomyTree::load(posts.db())?.tree())?;
        }
        Command::Category(CategoryCmd::List { tree: false }) => {
            let tree = TaxonomyTree::load(posts.db())?;
            let list: Vec<_> = tree.list().into_iter()
                .map(|t| json!({
                    "id": t.id,
                    "name": t.name,
                    "slug": t.slug,
                    "parent": t.parent,
                    "path": tree.path_of(t.id),
                }))
                .collect();
            print_json(&list)?;
        }
        Command::Tag(cmd) => {
            let tags = Tags::new(posts.db());
            match cmd {
                TagCmd::Add { name, alias } => {
                    let id = tags.add(&name, alias)?;
                    info!("Added tag id={} name={}", id, name);
                    print_json(&json!({ "id": id, "name": name }))?;
                }
                TagCmd::Search { pattern } => print_json(&tags.search(&pattern)?)?,
                TagCmd::Id { name } => {
                    print_json(&json!({ "name": name, "id": tags.id_of(&name)? }))?;
                }
                TagCmd::Post { post_id, aliases } => {
                    print_json(&json!({
                        "post_id": post_id,
                        "names": tags.names_of_post(post_id)?,
                        "ids": tags.ids_of_post(post_id, aliases)?,
                    }))?;
                }
                TagCmd::Attach { post_id, tag_id } => {
                    print_json(&json!({ "post_id": post_id, "tag_id": tag_id, "attached": tags.attach(post_id, tag_id)? }))?;
                }
                TagCmd::Detach { post_id, tag_id } => {
                    print_json(&json!({ "post_id": post_id, "tag_id": tag_id, "detached": tags.detach(post_id, tag_id)? }))?;
                }
                TagCmd::Set { post_id, names } => {
                    if !posts.exists(post_id)? {
                        bail!("post not found");
                    }
                    tags.set_for_post(post_id, &names)?;
                    info!("Set tags of post id={}", post_id);
                    print_json(&json!({ "post_id": post_id, "names": tags.names_of_post(post_id)? }))?;
                }
            }
        }
        Command::Option(cmd) => {
            let options = Options::new(posts.db());
            match cmd {
                OptionCmd::Get { name } => {
                    print_json(&json!({ "name": name, "value": options.get(&name)? }))?;
                }
                OptionCmd::Set { name, value } => {
                    options.set(&name, &value)?;
                    print_json(&json!({ "name": name, "value": value }))?;
                }
                OptionCmd::Del { name } => {
                    print_json(&json!({ "name": name, "deleted": options.del(&name)? }))?;
                }
            }
        }
    }

    Ok(())
}
