#![doc = svgbobdoc::transform!(
//! Incremental site generation for a personal knowledge base.
//!
//! # Overview
//!
//! Commonplace turns three directory trees into one static web site:
//!
//!   * **Notes**: markdown files. Only notes marked `public: true` in their
//!     front matter are published, each at `<path-without-extension>/`.
//!     Notes link to each other with `[[wikilinks]]`.
//!
//!   * **Recipes**: cooklang-style `.cook` files, published at
//!     `recipes/<slug>/`. Ingredients may refer to other recipes with
//!     `@./other{}`.
//!
//!   * **Books**: markdown files carrying only front matter, listed on one
//!     `books/` page, optionally with a same-stem cover image.
//!
//! Static files are mirrored into the output tree as they are.
//!
//! ```svgbob
//!  +-------+  +---------+  +-------+
//!  | notes |  | recipes |  | books |
//!  +---+---+  +----+----+  +---+---+
//!      |           |           |
//!      +-----------+-----------+         +-------------+
//!                  |                     | build cache |
//!                  v                     +------+------+
//!             +---------+                       |
//!             | indexes |---> prune ---> stale? <+
//!             +----+----+                   |
//!                  |                        v
//!                  +-------------------> render ---> output tree
//! ```
//!
//! ## Building
//!
//! A build, [`build::build()`], proceeds as follows:
//!
//! 1. Every content root is walked and indexed ([`content::Index`]).
//! 2. The build cache ([`cache::BuildCache`]) is loaded. Entries for content
//!    that disappeared (or was unpublished) are removed, and so are their
//!    outputs.
//! 3. The shared inputs are fingerprinted: the newest template, the
//!    navigation sidebar, and the wikilink targets. A change to any of them
//!    makes this a full build.
//! 4. Stale items and listing pages are rendered through the markdown
//!    pipeline and the templates; static files and covers are synced.
//! 5. The cache is saved for the next run, or deleted.
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod walk;
pub mod frontmatter;
pub mod hash;
pub mod recipe;
pub mod content;
pub mod cache;
pub mod nav;
pub mod markdown;
pub mod templating;
pub mod report;
pub mod assets;
pub mod layout;
pub mod build;

pub use build::{build, clean, Mode};
pub use layout::Layout;
pub use report::Report;
