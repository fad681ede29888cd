use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::util::{collapse_whitespace, PathExt};
use super::token::{tokenize, Token};
use super::{Cookware, Ingredient, ParsedRecipe, Step, StepKind, Timer};

const RECIPE_EXT: &str = ".cook";

/// Where a recipe lives, for resolving `./` and `../` ingredient references.
#[derive(Debug, Clone, Copy)]
pub struct RefScope<'a> {
    /// The recipes content root. References may not leave it.
    pub root: &'a Path,
    /// The directory containing the recipe being parsed.
    pub dir: &'a Path,
}

impl RefScope<'_> {
    /// Resolves `name` to the root-relative key of another recipe, or `None`
    /// if `name` isn't a relative reference or escapes the root.
    pub fn resolve(&self, name: &str) -> Option<String> {
        if !(name.starts_with("./") || name.starts_with("../")) {
            return None;
        }

        let target = match name.ends_with(RECIPE_EXT) {
            true => self.dir.join(name),
            false => self.dir.join(format!("{name}{RECIPE_EXT}")),
        };

        let rel = absolute(&target)?
            .strip_prefix(absolute(self.root)?)
            .ok()?
            .to_posix();

        match rel.is_empty() {
            true => None,
            false => Some(rel),
        }
    }
}

/// `path` made absolute against the working directory, then normalized.
fn absolute(path: &Path) -> Option<PathBuf> {
    match path.is_absolute() {
        true => Some(path.normalize()),
        false => Some(std::env::current_dir().ok()?.join(path).normalize()),
    }
}

type IngredientKey = (String, String, String);

fn ingredient_key(ingredient: &Ingredient) -> IngredientKey {
    let name = ingredient.name.to_lowercase();
    (name, ingredient.quantity.clone(), ingredient.unit.clone())
}

#[derive(Default)]
struct Parser<'s> {
    scope: Option<RefScope<'s>>,
    recipe: ParsedRecipe,
    seen_ingredients: FxHashSet<IngredientKey>,
    seen_cookware: FxHashSet<String>,
    lines: Vec<String>,
    step_ingredients: Vec<Ingredient>,
    seen_step_ingredients: FxHashSet<IngredientKey>,
}

/// Parses a recipe body without resolving cross-references.
pub fn parse(body: &str) -> ParsedRecipe {
    parse_in(body, None)
}

/// Parses a recipe body, resolving `./` and `../` ingredient names within
/// `scope` when one is given.
pub fn parse_in(body: &str, scope: Option<RefScope<'_>>) -> ParsedRecipe {
    let mut parser = Parser { scope, ..Parser::default() };
    for line in body.lines() {
        parser.line(line);
    }

    parser.flush();
    parser.recipe
}

impl Parser<'_> {
    fn line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return self.flush();
        }

        if let Some(note) = line.strip_prefix('>') {
            self.flush();
            let note = note.trim();
            if !note.is_empty() {
                self.recipe.steps.push(Step {
                    kind: StepKind::Note,
                    text: note.to_string(),
                    ingredients: vec![],
                });
            }

            return;
        }

        let mut display = String::with_capacity(line.len());
        for token in tokenize(line) {
            match token {
                Token::Text(text) => display.push_str(text),
                Token::Ingredient { name, quantity, unit } => {
                    let name = clean_name(name);
                    display.push_str(name);
                    self.ingredient(name, quantity, unit);
                }
                Token::Cookware { name } => {
                    let name = clean_name(name);
                    display.push_str(name);
                    self.cookware(name);
                }
                Token::Timer { name, quantity, unit } => {
                    let timer = Timer {
                        name: clean_name(name).to_string(),
                        quantity: quantity.trim().to_string(),
                        unit: unit.trim().to_string(),
                    };

                    display.push_str(&timer.display());
                    if !timer.is_empty() {
                        self.recipe.timers.push(timer);
                    }
                }
            }
        }

        let display = collapse_whitespace(&display);
        if !display.is_empty() {
            self.lines.push(display);
        }
    }

    fn ingredient(&mut self, name: &str, quantity: &str, unit: &str) {
        if name.is_empty() {
            return;
        }

        let ingredient = Ingredient {
            name: name.to_string(),
            quantity: quantity.trim().to_string(),
            unit: unit.trim().to_string(),
            ref_path: self.scope.and_then(|scope| scope.resolve(name)),
        };

        let key = ingredient_key(&ingredient);
        if self.seen_step_ingredients.insert(key.clone()) {
            self.step_ingredients.push(ingredient.clone());
        }

        if self.seen_ingredients.insert(key) {
            self.recipe.ingredients.push(ingredient);
        }
    }

    fn cookware(&mut self, name: &str) {
        if !name.is_empty() && self.seen_cookware.insert(name.to_lowercase()) {
            self.recipe.cookware.push(Cookware { name: name.to_string() });
        }
    }

    fn flush(&mut self) {
        let ingredients = std::mem::take(&mut self.step_ingredients);
        self.seen_step_ingredients.clear();
        if self.lines.is_empty() {
            return;
        }

        let text = collapse_whitespace(&self.lines.join(" "));
        self.lines.clear();
        if !text.is_empty() {
            self.recipe.steps.push(Step { kind: StepKind::Step, text, ingredients });
        }
    }
}

/// Trims, drops one leading `(`, then drops trailing `,.;:!?)`.
fn clean_name(name: &str) -> &str {
    let name = name.trim();
    let name = name.strip_prefix('(').unwrap_or(name);
    name.trim_end_matches([',', '.', ';', ':', '!', '?', ')']).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(name: &str, quantity: &str, unit: &str) -> Ingredient {
        Ingredient {
            name: name.into(),
            quantity: quantity.into(),
            unit: unit.into(),
            ref_path: None,
        }
    }

    #[test]
    fn soup() {
        let recipe = parse("Add @water{1%L} and #pot{}.\n\nCook for ~{10%minutes}.");

        assert_eq!(recipe.ingredients, vec![ingredient("water", "1", "L")]);
        assert_eq!(recipe.cookware, vec![Cookware { name: "pot".into() }]);
        assert_eq!(recipe.timers, vec![Timer {
            name: "".into(),
            quantity: "10".into(),
            unit: "minutes".into(),
        }]);

        let texts = recipe.steps.iter().map(|s| s.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["Add water and pot.", "Cook for (10 minutes)."]);
        assert!(recipe.steps.iter().all(|s| s.kind == StepKind::Step));
        assert_eq!(recipe.steps[0].ingredients, vec![ingredient("water", "1", "L")]);
        assert!(recipe.steps[1].ingredients.is_empty());
    }

    #[test]
    fn flour_with_quantity_and_unit() {
        let recipe = parse("Sift @Flour{200%g}");
        assert_eq!(recipe.ingredients, vec![ingredient("Flour", "200", "g")]);
        assert_eq!(recipe.steps[0].text, "Sift Flour");
    }

    #[test]
    fn multi_line_steps_and_notes() {
        let body = "\
Whisk @eggs{3}
  with @milk{100%ml}.
> Works with oat milk too.
Pour into #Pan.
Season with @salt, and @Eggs{3}.

>
";
        let recipe = parse(body);
        assert_eq!(recipe.steps.len(), 3);

        assert_eq!(recipe.steps[0].kind, StepKind::Step);
        assert_eq!(recipe.steps[0].text, "Whisk eggs with milk.");
        assert_eq!(recipe.steps[0].ingredients.len(), 2);

        assert_eq!(recipe.steps[1].kind, StepKind::Note);
        assert_eq!(recipe.steps[1].text, "Works with oat milk too.");
        assert!(recipe.steps[1].ingredients.is_empty());

        // A cookware name runs to the end of the line, so its `.` is cleaned away.
        // `@salt, and ` runs up to the next marker and displays trimmed.
        assert_eq!(recipe.steps[2].text, "Pour into Pan Season with salt, andEggs.");
        assert_eq!(recipe.steps[2].ingredients, vec![
            ingredient("salt, and", "", ""),
            ingredient("Eggs", "3", ""),
        ]);

        // `eggs{3}` and `Eggs{3}` are the same ingredient.
        let names = recipe.ingredients.iter().map(|i| i.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["eggs", "milk", "salt, and"]);
    }

    #[test]
    fn deduplication_rules() {
        let recipe = parse("@oil{1%tbsp} @Oil{1%tbsp} @oil{2%tbsp} #pan #Pan ~{1%min} ~{1%min}");
        assert_eq!(recipe.ingredients, vec![
            ingredient("oil", "1", "tbsp"),
            ingredient("oil", "2", "tbsp"),
        ]);

        assert_eq!(recipe.cookware.len(), 1);
        assert_eq!(recipe.timers.len(), 2);
    }

    #[test]
    fn timer_display_forms() {
        let recipe = parse("~rest{5%min}\n\n~{10}\n\n~nap{}\n\n~{}");
        let texts = recipe.steps.iter().map(|s| s.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["rest (5 min)", "(10)", "nap"]);
        assert_eq!(recipe.timers.len(), 3);
    }

    #[test]
    fn name_cleaning() {
        assert_eq!(clean_name("  (tomatoes), "), "tomatoes");
        assert_eq!(clean_name("((x"), "(x");
        assert_eq!(clean_name("basil!?)"), "basil");
        assert_eq!(clean_name("..."), "");

        let recipe = parse("Use @...{1}.");
        assert!(recipe.ingredients.is_empty());
        assert_eq!(recipe.steps[0].text, "Use .");
    }

    #[test]
    fn references_resolve_within_root() {
        let scope = RefScope { root: Path::new("/r"), dir: Path::new("/r/mains") };
        assert_eq!(scope.resolve("./stock"), Some("mains/stock.cook".into()));
        assert_eq!(scope.resolve("../sauces/tomato.cook"), Some("sauces/tomato.cook".into()));
        assert_eq!(scope.resolve("../../etc/passwd"), None);
        assert_eq!(scope.resolve("stock"), None);
        assert_eq!(scope.resolve(".hidden"), None);

        let body = "Add @./stock{1%L} and @../../outside{1}.";
        let recipe = parse_in(body, Some(scope));
        assert_eq!(recipe.ingredients[0].ref_path.as_deref(), Some("mains/stock.cook"));
        assert_eq!(recipe.ingredients[1].ref_path, None);
        assert_eq!(recipe.ingredients[1].name, "../../outside");
        assert_eq!(recipe.ref_paths(), ["mains/stock.cook"]);

        assert!(parse(body).ingredients.iter().all(|i| i.ref_path.is_none()));
    }

    #[test]
    fn relative_roots_are_compared_as_absolute_paths() {
        let root = Path::new("../site/recipes");
        let scope = RefScope { root, dir: root };
        assert_eq!(scope.resolve("./stock"), Some("stock.cook".into()));
        assert_eq!(scope.resolve("../recipes/stock"), Some("stock.cook".into()));
        assert_eq!(scope.resolve("../../../site/recipes/stock"), None);
    }

    #[test]
    fn blank_and_empty_bodies() {
        assert_eq!(parse(""), ParsedRecipe::default());
        assert_eq!(parse("\n\n   \n"), ParsedRecipe::default());
    }
}
