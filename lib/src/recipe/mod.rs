//! Cooklang-style recipe markup.
//!
//! Recipes are parsed in two phases. [`parse_in()`] reads one recipe on its
//! own, recording cross-references only as paths. [`link()`] runs once the
//! whole recipe index exists and turns those paths into titled links.

mod token;
mod parse;
mod quantity;
mod link;

pub use token::{tokenize, Token};
pub use parse::{parse, parse_in, RefScope};
pub use quantity::{normalize_quantity, parse_decimal, Quantity};
pub use link::{link, IngredientView, LinkedRecipe, RecipeLookup, StepView};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ingredient {
    pub name: String,
    /// Raw amount; may be empty or `=`-prefixed.
    pub quantity: String,
    pub unit: String,
    /// Key of the recipe this ingredient refers to, if it's a reference.
    pub ref_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cookware {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timer {
    pub name: String,
    pub quantity: String,
    pub unit: String,
}

impl Timer {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.quantity.is_empty() && self.unit.is_empty()
    }

    /// `name (qty unit)`, `(qty unit)`, or `name`.
    pub fn display(&self) -> String {
        let duration = [&*self.quantity, &*self.unit]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        match (self.name.is_empty(), duration.is_empty()) {
            (false, false) => format!("{} ({duration})", self.name),
            (true, false) => format!("({duration})"),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Step,
    Note,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub kind: StepKind,
    pub text: String,
    /// Ingredients used on this step, deduplicated. Always empty for notes.
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRecipe {
    pub ingredients: Vec<Ingredient>,
    pub cookware: Vec<Cookware>,
    pub timers: Vec<Timer>,
    pub steps: Vec<Step>,
}

impl ParsedRecipe {
    /// The distinct recipe keys this recipe refers to, sorted.
    pub fn ref_paths(&self) -> Vec<&str> {
        let mut paths = self.ingredients.iter()
            .filter_map(|i| i.ref_path.as_deref())
            .collect::<Vec<_>>();

        paths.sort_unstable();
        paths.dedup();
        paths
    }
}
