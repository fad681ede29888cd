//! Markdown to HTML through a small plugin pipeline.

mod plugin;
mod auto_heading;
mod wikilink;

pub use plugin::Plugin;
pub use auto_heading::AutoHeading;
pub use wikilink::{normalize_key, WikiLinkMap, WikiLinks};

use pulldown_cmark::{html, Options, Parser};

use crate::error::{Chainable, Result};

pub fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Renders `input` to HTML, running it through `plugins`.
pub fn render<P: Plugin>(input: &str, mut plugins: P) -> Result<String> {
    let input = plugins.preprocess(input)?;
    let mut output = String::with_capacity(input.len() + input.len() / 2);
    html::push_html(&mut output, plugins.remap(Parser::new_ext(&input, options())));
    plugins.finalize().chain(error!("markdown plugin failed"))?;
    Ok(output)
}

/// The pipeline used for note and landing page bodies.
pub fn render_note(input: &str, links: &WikiLinkMap) -> Result<String> {
    render(input, (WikiLinks::new(links), AutoHeading::default()))
}
