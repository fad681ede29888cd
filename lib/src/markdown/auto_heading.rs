use pulldown_cmark::{Event, Tag, TagEnd};
use rustc_hash::FxHashMap;

use super::Plugin;

/// Gives every heading without an explicit id a slug of its text. Repeated
/// slugs get `-1`, `-2`, ... suffixes.
#[derive(Default)]
pub struct AutoHeading {
    seen: FxHashMap<String, usize>,
}

impl AutoHeading {
    fn unique_id(&mut self, text: &str) -> String {
        let slug = crate::util::slugify(text);
        let count = self.seen.entry(slug.clone()).or_insert(0);
        *count += 1;
        match *count {
            1 => slug,
            n => format!("{slug}-{}", n - 1),
        }
    }
}

struct HeadingIds<'a, 'p, I> {
    plugin: &'p mut AutoHeading,
    /// The rest of a heading whose id was just assigned.
    buffered: std::vec::IntoIter<Event<'a>>,
    inner: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for HeadingIds<'a, '_, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.buffered.next() {
            return Some(event);
        }

        let (level, classes, attrs) = match self.inner.next()? {
            Event::Start(Tag::Heading { level, id: None, classes, attrs }) => (level, classes, attrs),
            event => return Some(event),
        };

        let mut text = String::new();
        let mut body = vec![];
        for event in self.inner.by_ref() {
            let end = matches!(event, Event::End(TagEnd::Heading(..)));
            if let Event::Text(s) | Event::Code(s) = &event {
                text.push_str(s);
            }

            body.push(event);
            if end {
                break;
            }
        }

        self.buffered = body.into_iter();
        let id = self.plugin.unique_id(&text);
        Some(Event::Start(Tag::Heading { level, id: Some(id.into()), classes, attrs }))
    }
}

impl Plugin for AutoHeading {
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        HeadingIds { plugin: self, buffered: vec![].into_iter(), inner: events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::render;

    #[test]
    fn headings_get_unique_ids() {
        let html = render("# Hello World\n\n## Hello World\n\n## Hello `World`\n\n# Own {#mine}", AutoHeading::default()).unwrap();
        assert!(html.contains(r#"<h1 id="hello-world">Hello World</h1>"#));
        assert!(html.contains(r#"<h2 id="hello-world-1">Hello World</h2>"#));
        assert!(html.contains(r#"<h2 id="hello-world-2">Hello <code>World</code></h2>"#));
        assert!(html.contains(r#"<h1 id="mine">Own</h1>"#));
    }
}
