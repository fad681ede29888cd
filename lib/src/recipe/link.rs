use serde::Serialize;

use super::{normalize_quantity, Ingredient, ParsedRecipe, Quantity, StepKind};

/// Resolves recipe keys (root-relative paths) against the full recipe index.
pub trait RecipeLookup {
    fn title(&self, key: &str) -> Option<&str>;

    fn url(&self, key: &str) -> Option<String>;
}

/// An ingredient ready for display, with its reference resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientView {
    pub name: String,
    pub url: Option<String>,
    pub unit: String,
    #[serde(flatten)]
    pub quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub kind: StepKind,
    pub text: String,
    /// 1-based position among `step` entries; `None` for notes.
    pub number: Option<usize>,
    pub ingredients: Vec<IngredientView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkedRecipe {
    /// Ingredients with an amount first, otherwise in declaration order.
    pub ingredients: Vec<IngredientView>,
    pub steps: Vec<StepView>,
}

/// Links a parsed recipe against the index: references become links
/// labelled with the target's title, in the ingredient lists and step text.
/// A reference whose target isn't in the index keeps its written name.
pub fn link<L: RecipeLookup + ?Sized>(recipe: &ParsedRecipe, lookup: &L) -> LinkedRecipe {
    let view = |ingredient: &Ingredient| {
        let target = ingredient.ref_path.as_deref()
            .and_then(|key| Some((lookup.title(key)?, lookup.url(key)?)));

        IngredientView {
            name: target.as_ref().map_or(&*ingredient.name, |(title, _)| *title).to_string(),
            url: target.map(|(_, url)| url),
            unit: ingredient.unit.clone(),
            quantity: normalize_quantity(&ingredient.quantity),
        }
    };

    let mut ingredients = recipe.ingredients.iter().map(view).collect::<Vec<_>>();
    ingredients.sort_by_key(|i| i.quantity.is_empty());

    let mut number = 0;
    let steps = recipe.steps.iter()
        .map(|step| {
            let number = match step.kind {
                StepKind::Step => { number += 1; Some(number) }
                StepKind::Note => None,
            };

            let ingredients = step.ingredients.iter().map(view).collect::<Vec<_>>();
            let mut text = step.text.clone();
            for (raw, view) in step.ingredients.iter().zip(&ingredients) {
                if view.url.is_some() {
                    text = text.replace(&raw.name, &view.name);
                }
            }

            StepView { kind: step.kind, text, number, ingredients }
        })
        .collect();

    LinkedRecipe { ingredients, steps }
}
