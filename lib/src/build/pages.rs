use std::cmp::Reverse;
use std::fs;

use serde::Serialize;

use crate::content::{Book, Note, Recipe, Status};
use crate::error::{Chainable, Result};
use crate::frontmatter;
use crate::layout::Layout;
use crate::markdown;
use crate::nav::NavItem;
use crate::recipe::{link, parse_decimal, Cookware, IngredientView, StepView, Timer};
use crate::templating::MiniJinjaEngine;
use super::Site;

pub const BASE_TEMPLATE: &str = "base.html";
pub const RECIPE_TEMPLATE: &str = "recipe.html";
pub const RECIPES_TEMPLATE: &str = "recipes.html";
pub const BOOKS_TEMPLATE: &str = "books.html";

/// Context of `base.html`: notes and the landing page.
#[derive(Serialize)]
struct Page<'a> {
    page_title: &'a str,
    title: &'a str,
    nav_items: &'a [NavItem],
    content_html: String,
}

#[derive(Serialize)]
struct RecipePage<'a> {
    page_title: &'a str,
    title: &'a str,
    nav_items: &'a [NavItem],
    recipe: RecipeSummary<'a>,
    ingredients: Vec<IngredientView>,
    steps: Vec<StepView>,
    servings_display: String,
    servings_value: Option<f64>,
    servings_is_int: bool,
}

#[derive(Serialize)]
struct RecipeSummary<'a> {
    title: &'a str,
    slug: &'a str,
    url: String,
    servings: &'a str,
    cookware: &'a [Cookware],
    timers: &'a [Timer],
}

#[derive(Serialize)]
struct RecipesPage<'a> {
    page_title: &'a str,
    title: &'a str,
    nav_items: &'a [NavItem],
    recipes: Vec<RecipeCard<'a>>,
}

#[derive(Serialize)]
struct RecipeCard<'a> {
    title: &'a str,
    url: String,
}

#[derive(Serialize)]
struct BooksPage<'a> {
    page_title: &'a str,
    title: &'a str,
    nav_items: &'a [NavItem],
    sections: Vec<Section<'a>>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Section<'a> {
    pub key: Status,
    pub label: &'static str,
    pub books: Vec<BookCard<'a>>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct BookCard<'a> {
    pub title: &'a str,
    pub author: &'a str,
    pub year: &'a str,
    pub cover_url: String,
    pub cover_alt: String,
    pub initials: String,
    pub rating: &'a str,
}

/// Renders every kind of page from a loaded site.
pub struct Pages<'a> {
    engine: MiniJinjaEngine,
    layout: &'a Layout,
    site: &'a Site,
}

impl<'a> Pages<'a> {
    pub fn new(layout: &'a Layout, site: &'a Site) -> Self {
        Pages { engine: MiniJinjaEngine::new(&layout.templates), layout, site }
    }

    pub fn note(&self, note: &Note) -> Result<String> {
        let content_html = markdown::render_note(&note.body, &self.site.links)
            .chain_with(|| error!("failed to render note", "key" => note.source.key()))?;

        self.engine.render(BASE_TEMPLATE, Page {
            page_title: &note.title,
            title: &note.declared_title,
            nav_items: &self.site.nav.items,
            content_html,
        })
    }

    /// The site's front page, from the about document. A missing about
    /// document is an empty page.
    pub fn landing(&self) -> Result<String> {
        let about = &self.layout.about;
        let raw = match about.is_file() {
            true => fs::read_to_string(about).chain_with(|| error! {
                "failed to read about page",
                "path" => about.display(),
            })?,
            false => String::new(),
        };

        let (meta, body) = frontmatter::split(&raw);
        let title = meta.field("title");
        let content_html = markdown::render_note(body, &self.site.links)
            .chain_with(|| error!("failed to render about page", "path" => about.display()))?;

        self.engine.render(BASE_TEMPLATE, Page {
            page_title: title,
            title,
            nav_items: &self.site.nav.items,
            content_html,
        })
    }

    pub fn recipe(&self, recipe: &Recipe) -> Result<String> {
        let linked = link(&recipe.parsed, &self.site.recipes);
        let servings = Servings::parse(&recipe.servings);
        self.engine.render(RECIPE_TEMPLATE, RecipePage {
            page_title: &recipe.title,
            title: &recipe.title,
            nav_items: &self.site.nav.items,
            recipe: RecipeSummary {
                title: &recipe.title,
                slug: &recipe.slug,
                url: recipe.url(),
                servings: &recipe.servings,
                cookware: &recipe.parsed.cookware,
                timers: &recipe.parsed.timers,
            },
            ingredients: linked.ingredients,
            steps: linked.steps,
            servings_display: servings.display,
            servings_value: servings.value,
            servings_is_int: servings.is_int,
        })
    }

    pub fn recipes_index(&self) -> Result<String> {
        let mut recipes = self.site.recipes.iter().collect::<Vec<_>>();
        recipes.sort_by_cached_key(|r| (r.title.to_lowercase(), r.slug.clone()));
        self.engine.render(RECIPES_TEMPLATE, RecipesPage {
            page_title: "Recipes",
            title: "Recipes",
            nav_items: &self.site.nav.items,
            recipes: recipes.into_iter()
                .map(|r| RecipeCard { title: &r.title, url: r.url() })
                .collect(),
        })
    }

    pub fn books_index(&self) -> Result<String> {
        self.engine.render(BOOKS_TEMPLATE, BooksPage {
            page_title: "Books",
            title: "Books",
            nav_items: &self.site.nav.items,
            sections: sections(self.site.books.iter()),
        })
    }
}

/// A recipe's yield, as written and, when it's a number, as a value.
#[derive(Debug, PartialEq)]
struct Servings {
    display: String,
    value: Option<f64>,
    /// A positive whole number, displayed without a fraction.
    is_int: bool,
}

impl Servings {
    fn parse(raw: &str) -> Servings {
        let value = parse_decimal(raw);
        match value {
            Some(v) if v > 0.0 && v.fract() == 0.0 => Servings {
                display: format!("{}", v as u64),
                value,
                is_int: true,
            },
            _ => Servings { display: raw.to_string(), value, is_int: false },
        }
    }
}

/// Groups books by status in reading, finished, to-read order. Each group
/// is newest first, then by title; empty groups are left out.
pub fn sections<'b, I: IntoIterator<Item = &'b Book>>(books: I) -> Vec<Section<'b>> {
    let books = books.into_iter().collect::<Vec<_>>();
    Status::ORDER.iter()
        .filter_map(|&status| {
            let mut group = books.iter()
                .copied()
                .filter(|book| book.status == status)
                .collect::<Vec<_>>();

            if group.is_empty() {
                return None;
            }

            group.sort_by_cached_key(|book| (Reverse(book.sort_date()), book.title.to_lowercase()));
            Some(Section {
                key: status,
                label: status.label(),
                books: group.into_iter().map(card).collect(),
            })
        })
        .collect()
}

fn card(book: &Book) -> BookCard<'_> {
    BookCard {
        title: &book.title,
        author: &book.author,
        year: &book.year,
        cover_url: book.cover_url(),
        cover_alt: format!("Cover of {}", book.title),
        initials: book.initials(),
        rating: &book.rating,
    }
}
