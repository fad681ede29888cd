use std::collections::{BTreeMap, VecDeque};
use std::iter::Peekable;

use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::content::{Index, Note};
use crate::hash::digest;
use crate::util::{collapse_whitespace, PathExt};
use super::Plugin;

/// Lookup from normalized wikilink targets to note URLs.
///
/// Every public note is reachable by its relative path without extension. Its
/// file stem and declared title also resolve, but only when no other public
/// note shares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WikiLinkMap(BTreeMap<String, String>);

impl WikiLinkMap {
    pub fn build(notes: &Index<Note>) -> WikiLinkMap {
        let mut stems: FxHashMap<String, usize> = FxHashMap::default();
        let mut titles: FxHashMap<String, usize> = FxHashMap::default();
        for note in notes {
            *stems.entry(normalize_key(note.source.file_stem())).or_default() += 1;
            if !note.declared_title.is_empty() {
                *titles.entry(normalize_key(&note.declared_title)).or_default() += 1;
            }
        }

        let mut map = BTreeMap::new();
        for note in notes {
            let url = note.url();
            let path = note.source.rel.without_extension().to_posix();
            map.insert(normalize_key(&path), url.clone());

            let stem = normalize_key(note.source.file_stem());
            if stems.get(&stem) == Some(&1) {
                map.insert(stem, url.clone());
            }

            if !note.declared_title.is_empty() {
                let title = normalize_key(&note.declared_title);
                if titles.get(&title) == Some(&1) {
                    map.insert(title, url);
                }
            }
        }

        WikiLinkMap(map)
    }

    pub fn resolve(&self, target: &str) -> Option<&str> {
        self.0.get(&normalize_key(target)).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fingerprint of the whole map.
    pub fn hash(&self) -> String {
        digest(&serde_json::to_string_pretty(&self.0).unwrap_or_default())
    }
}

/// `[[Some Note.md#part|label]]` becomes `some note`.
pub fn normalize_key(value: &str) -> String {
    let mut target = value.trim();
    if let Some(inner) = target.strip_prefix("[[").and_then(|t| t.strip_suffix("]]")) {
        target = inner;
    }

    let target = target.split('|').next().unwrap_or_default();
    let target = target.split('#').next().unwrap_or_default();
    let target = target.strip_suffix(".md").unwrap_or(target);
    collapse_whitespace(target).to_lowercase()
}

fn split_wikilink(raw: &str) -> (&str, &str) {
    match raw.split_once('|') {
        Some((target, label)) => (target.trim(), label.trim()),
        None => (raw.trim(), ""),
    }
}

fn label_from_target(target: &str) -> &str {
    let label = target.trim();
    let label = label.split('#').next().unwrap_or_default();
    label.strip_suffix(".md").unwrap_or(label).trim()
}

/// Resolves `[[target]]`, `[[target|label]]`, and `[[target#heading]]` in
/// text. Links that don't resolve become their label as plain text. Code is
/// left untouched.
pub struct WikiLinks<'m> {
    map: &'m WikiLinkMap,
}

impl<'m> WikiLinks<'m> {
    pub fn new(map: &'m WikiLinkMap) -> Self {
        WikiLinks { map }
    }
}

struct WikiLinkIterator<'a, 'm, I: Iterator<Item = Event<'a>>> {
    inner: Peekable<I>,
    map: &'m WikiLinkMap,
    pending: VecDeque<Event<'a>>,
    code_depth: usize,
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for WikiLinkIterator<'a, '_, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        match self.inner.next()? {
            event @ Event::Start(Tag::CodeBlock(_)) => {
                self.code_depth += 1;
                Some(event)
            }
            event @ Event::End(TagEnd::CodeBlock) => {
                self.code_depth = self.code_depth.saturating_sub(1);
                Some(event)
            }
            Event::Text(text) if self.code_depth == 0 => {
                // The parser splits text at brackets, so gather the run first.
                if !matches!(self.inner.peek(), Some(Event::Text(_))) && !text.contains("[[") {
                    return Some(Event::Text(text));
                }

                let mut run = text.into_string();
                while let Some(Event::Text(next)) = self.inner.peek() {
                    run.push_str(next);
                    self.inner.next();
                }

                self.expand(&run);
                self.pending.pop_front()
            }
            event => Some(event),
        }
    }
}

impl<'a, I: Iterator<Item = Event<'a>>> WikiLinkIterator<'a, '_, I> {
    fn expand(&mut self, text: &str) {
        let mut rest = text;
        let mut plain = String::new();
        while let Some(start) = rest.find("[[") {
            let inner = &rest[start + 2..];
            let close = inner.find(']').filter(|&i| i > 0 && inner[i..].starts_with("]]"));
            let Some(close) = close else {
                plain.push_str(&rest[..start + 1]);
                rest = &rest[start + 1..];
                continue;
            };

            plain.push_str(&rest[..start]);
            let (target, label) = split_wikilink(&inner[..close]);
            let label = match label {
                "" => label_from_target(target),
                label => label,
            };

            match self.map.resolve(target) {
                Some(url) => {
                    if !plain.is_empty() {
                        self.pending.push_back(Event::Text(std::mem::take(&mut plain).into()));
                    }

                    self.pending.push_back(Event::Start(Tag::Link {
                        link_type: LinkType::Inline,
                        dest_url: CowStr::from(url.to_string()),
                        title: CowStr::Borrowed(""),
                        id: CowStr::Borrowed(""),
                    }));
                    self.pending.push_back(Event::Text(label.to_string().into()));
                    self.pending.push_back(Event::End(TagEnd::Link));
                }
                None => plain.push_str(label),
            }

            rest = &inner[close + 2..];
        }

        plain.push_str(rest);
        if !plain.is_empty() || self.pending.is_empty() {
            self.pending.push_back(Event::Text(plain.into()));
        }
    }
}

impl Plugin for WikiLinks<'_> {
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        WikiLinkIterator {
            inner: events.peekable(),
            map: self.map,
            pending: VecDeque::new(),
            code_depth: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::markdown::render;

    fn public_notes(files: &[(&str, &str)]) -> Index<Note> {
        let root = tempfile::tempdir().unwrap();
        for (rel, title) in files {
            let path = root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let title = match title.is_empty() {
                true => String::new(),
                false => format!("title: {title}\n"),
            };

            fs::write(path, format!("---\npublic: true\n{title}---\n")).unwrap();
        }

        Index::load(root.path()).unwrap()
    }

    #[test]
    fn key_normalization() {
        assert_eq!(normalize_key("[[Some  Note.md#Part|Label]]"), "some note");
        assert_eq!(normalize_key("  dir/Note  "), "dir/note");
        assert_eq!(normalize_key("plain"), "plain");
    }

    #[test]
    fn map_keys_require_uniqueness() {
        let notes = public_notes(&[
            ("a/index.md", "Alpha"),
            ("b/index.md", "Alpha"),
            ("c/Unique.md", ""),
            ("d/titled.md", "Bee Keeping"),
        ]);

        let map = WikiLinkMap::build(&notes);
        assert_eq!(map.resolve("a/index"), Some("/a/index"));
        assert_eq!(map.resolve("index"), None);
        assert_eq!(map.resolve("Alpha"), None);
        assert_eq!(map.resolve("unique.md"), Some("/c/Unique"));
        assert_eq!(map.resolve("bee   keeping"), Some("/d/titled"));
        assert_eq!(map.resolve("titled"), Some("/d/titled"));
        assert_eq!(map.len(), 7);
    }

    #[test]
    fn hash_changes_with_targets() {
        let one = WikiLinkMap::build(&public_notes(&[("x.md", "")]));
        let two = WikiLinkMap::build(&public_notes(&[("x.md", "Ex")]));
        assert_ne!(one.hash(), two.hash());
        assert_eq!(one.hash(), WikiLinkMap::build(&public_notes(&[("x.md", "")])).hash());
        assert!(WikiLinkMap::default().is_empty());
    }

    #[test]
    fn renders_links_and_labels() {
        let map = WikiLinkMap::build(&public_notes(&[("garden/Compost.md", "Compost Tea")]));
        let html = render(
            "See [[compost tea]], [[garden/Compost#making|how]], and [[Missing Note.md#x]].",
            WikiLinks::new(&map),
        ).unwrap();

        assert_eq!(html.trim(), concat!(
            r#"<p>See <a href="/garden/Compost">compost tea</a>, "#,
            r#"<a href="/garden/Compost">how</a>, and Missing Note.</p>"#,
        ));
    }

    #[test]
    fn code_is_left_alone() {
        let map = WikiLinkMap::build(&public_notes(&[("a.md", "")]));
        let html = render("```\n[[a]]\n```\n\n`[[a]]` [[a]]", WikiLinks::new(&map)).unwrap();
        assert!(html.contains("<pre><code>[[a]]\n</code></pre>"));
        assert!(html.contains(r#"<code>[[a]]</code> <a href="/a">a</a>"#));
    }

    #[test]
    fn unmatched_brackets_pass_through() {
        let map = WikiLinkMap::default();
        let html = render("a [[ b ]] [[]] [[c] d", WikiLinks::new(&map)).unwrap();
        assert_eq!(html.trim(), "<p>a b [[]] [[c] d</p>");
    }
}
