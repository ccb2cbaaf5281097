use std::collections::HashMap;

use markdown::Options;

/// Hook applied to the content of every post returned by a query.
pub const THE_CONTENT: &str = "the_content";

pub type Transformer = Box<dyn Fn(&str) -> String>;

/// Named pipelines of content transformers.
#[derive(Default)]
pub struct Hooks {
    pipelines: HashMap<String, Vec<Transformer>>,
}

impl Hooks {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a transformer to the `name` pipeline.
    pub fn add<F>(&mut self, name: &str, transformer: F)
    where
        F: Fn(&str) -> String + 'static,
    {
        self.pipelines.entry(name.to_string())
            .or_default()
            .push(Box::new(transformer));
    }

    /// Runs `content` through every transformer of `name`, in the order
    /// they were added. Unknown names return the content unchanged.
    pub fn apply(&self, name: &str, content: &str) -> String {
        let Some(pipeline) = self.pipelines.get(name) else {
            return content.to_string();
        };

        pipeline.iter().fold(content.to_string(), |acc, transformer| transformer(&acc))
    }

    pub fn count(&self, name: &str) -> usize {
        self.pipelines.get(name).map_or(0, |p| p.len())
    }
}

/// GFM markdown to HTML. Content that fails to render is returned as is.
pub fn markdown_to_html(content: &str) -> String {
    match markdown::to_html_with_options(content, &Options::gfm()) {
        Ok(html) => html,
        Err(_) => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_hook() {
        let hooks = Hooks::new();
        assert_eq!(hooks.apply(THE_CONTENT, "text"), "text");
        assert_eq!(hooks.count(THE_CONTENT), 0);
    }

    #[test]
    fn test_registration_order() {
        let mut hooks = Hooks::new();
        hooks.add(THE_CONTENT, |c| format!("{}-a", c));
        hooks.add(THE_CONTENT, |c| format!("{}-b", c));
        hooks.add("other", |c| c.to_uppercase());

        assert_eq!(hooks.apply(THE_CONTENT, "x"), "x-a-b");
        assert_eq!(hooks.apply("other", "x"), "X");
        assert_eq!(hooks.count(THE_CONTENT), 2);
    }

    #[test]
    fn test_markdown() {
        assert_eq!(markdown_to_html("# Title"), "<h1>Title</h1>");
    }
}
