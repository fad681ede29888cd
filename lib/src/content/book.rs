use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::frontmatter;
use crate::hash::metadata_hash;
use crate::util::PathExt;
use crate::walk::SourceFile;
use super::{read_source, Content};

/// Image extensions tried, in order, for a book's cover.
pub const COVER_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Where covers are published, relative to the output root.
pub const COVER_DIR: &str = "books/covers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Reading,
    Finished,
    ToRead,
}

impl Status {
    /// Section order on the books page.
    pub const ORDER: [Status; 3] = [Status::Reading, Status::Finished, Status::ToRead];

    /// Lowercases and maps `_` to `-`. Anything unrecognized is `to-read`.
    pub fn parse(raw: &str) -> Status {
        match raw.trim().to_lowercase().replace('_', "-").as_str() {
            "reading" => Status::Reading,
            "finished" => Status::Finished,
            _ => Status::ToRead,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Reading => "reading",
            Status::Finished => "finished",
            Status::ToRead => "to-read",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Reading => "Currently reading",
            Status::Finished => "Finished",
            Status::ToRead => "To read",
        }
    }
}

/// A cover image found next to a book's source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub source: PathBuf,
    /// Path under the cover directory: the book's relative path with the
    /// image's extension.
    pub rel: String,
}

impl Cover {
    fn find(book: &SourceFile) -> Option<Cover> {
        COVER_EXTENSIONS.iter().find_map(|ext| {
            let source = book.path.with_extension(ext);
            source.is_file().then(|| Cover {
                rel: book.rel.with_extension(ext).to_posix(),
                source,
            })
        })
    }

    pub fn url(&self) -> String {
        format!("/{COVER_DIR}/{}", self.rel)
    }

    pub fn output_rel(&self) -> PathBuf {
        Path::new(COVER_DIR).join(&self.rel)
    }
}

#[derive(Debug, Clone)]
pub struct Book {
    pub source: SourceFile,
    pub title: String,
    pub author: String,
    pub year: String,
    /// 10 or 13 digits, or empty.
    pub isbn13: String,
    pub status: Status,
    pub created: String,
    pub started: String,
    pub finished: String,
    pub rating: String,
    pub cover: Option<Cover>,
    pub metadata_hash: String,
}

impl Book {
    pub fn cover_url(&self) -> String {
        self.cover.as_ref().map(|c| c.url()).unwrap_or_default()
    }

    pub fn initials(&self) -> String {
        initials(&self.title)
    }

    /// The date that orders this book within its status section.
    pub fn sort_date(&self) -> u32 {
        let date = match self.status {
            Status::Reading => &self.started,
            Status::Finished => &self.finished,
            Status::ToRead => &self.created,
        };

        date_sort_key(date)
    }
}

impl Content for Book {
    const EXTENSION: &'static str = "md";

    fn load(_: &Path, source: SourceFile) -> Result<Self> {
        let raw = read_source(&source.path)?;
        let meta = frontmatter::parse(&raw);
        let field = |key| meta.field(key).trim().to_string();

        let title = match meta.field("title").trim() {
            "" => source.file_stem().to_string(),
            title => title.to_string(),
        };

        let cover = Cover::find(&source);
        let mut book = Book {
            title,
            author: field("author"),
            year: field("year"),
            isbn13: normalize_isbn(meta.field("isbn13")),
            status: Status::parse(meta.field("status")),
            created: field("created"),
            started: field("started"),
            finished: field("finished"),
            rating: field("rating"),
            cover,
            source,
            metadata_hash: String::new(),
        };

        let cover_url = book.cover_url();
        book.metadata_hash = metadata_hash([
            book.title.as_str(),
            book.author.as_str(),
            book.year.as_str(),
            book.isbn13.as_str(),
            book.status.as_str(),
            book.created.as_str(),
            book.started.as_str(),
            book.finished.as_str(),
            book.rating.as_str(),
            cover_url.as_str(),
        ]);

        Ok(book)
    }

    fn source(&self) -> &SourceFile {
        &self.source
    }

    fn metadata_hash(&self) -> &str {
        &self.metadata_hash
    }
}

/// Keeps only digits; anything but 10 or 13 of them is no ISBN.
pub fn normalize_isbn(raw: &str) -> String {
    let digits = raw.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    match digits.len() {
        10 | 13 => digits,
        _ => String::new(),
    }
}

/// First letters of the first two words, or the first three characters of a
/// lone word, uppercased. Words are runs of ASCII letters and digits.
pub fn initials(title: &str) -> String {
    let mut words = title.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty());
    match (words.next(), words.next()) {
        (Some(first), Some(second)) => format!("{}{}", &first[..1], &second[..1]).to_uppercase(),
        (Some(only), None) => only[..only.len().min(3)].to_uppercase(),
        _ => String::new(),
    }
}

/// `YYYY-MM-DD` as the number `YYYYMMDD`; `0` if it isn't a valid date.
pub fn date_sort_key(value: &str) -> u32 {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| Some(u32::try_from(d.year()).ok()? * 10_000 + d.month() * 100 + d.day()))
        .unwrap_or(0)
}
