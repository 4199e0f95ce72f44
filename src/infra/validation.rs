use super::mongo::Ingredient;
use super::payloads::{IngredientAmount, IngredientPatch, IngredientWrite, RecipeWrite, TagPatch, TagWrite};
use std::collections::HashSet;
use thiserror::Error;

/// Bounds shared by cooking time and ingredient amounts.
pub const MIN_VALUE: i64 = 1;
pub const MAX_VALUE: i64 = 32000;

pub const RECIPE_NAME_MAX_LENGTH: usize = 256;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 256;
pub const MEASUREMENT_UNIT_MAX_LENGTH: usize = 20;
pub const TAG_NAME_MAX_LENGTH: usize = 50;
pub const SLUG_MAX_LENGTH: usize = 50;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("a recipe needs at least one ingredient")]
    NoIngredients,
    #[error("a recipe needs at least one tag")]
    NoTags,
    #[error("ingredient {0} is listed more than once")]
    DuplicateIngredient(i64),
    #[error("ingredient {0:?} is listed more than once")]
    DuplicateIngredientName(String),
    #[error("tag {0} is listed more than once")]
    DuplicateTag(i64),
    #[error("cooking time must be between 1 and 32000, got {0}")]
    CookingTime(i64),
    #[error("amount of ingredient {id} must be between 1 and 32000, got {amount}")]
    Amount { id: i64, amount: i64 },
    #[error("{0} may not be blank")]
    Blank(&'static str),
    #[error("{field} may not be longer than {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("invalid ingredient id {0}")]
    UnknownIngredient(i64),
    #[error("invalid tag id {0}")]
    UnknownTag(i64),
    #[error("you already have a recipe named {0:?}")]
    DuplicateName(String),
    #[error("color must be a hex value like #FF0000, got {0:?}")]
    Color(String),
    #[error("slug may only contain latin letters, digits, hyphens and underscores")]
    Slug,
}

/// A recipe payload that passed validation, with its image already stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
    pub image: Option<String>,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i64>,
}

fn in_range(value: i64) -> bool {
    (MIN_VALUE..=MAX_VALUE).contains(&value)
}

fn text_field(value: &str, field: &'static str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

impl RecipeWrite {
    /// Checks everything that does not need the database.
    pub fn check_shape(&self) -> Result<(), ValidationError> {
        if self.ingredients.is_empty() {
            return Err(ValidationError::NoIngredients);
        }
        if self.tags.is_empty() {
            return Err(ValidationError::NoTags);
        }
        let mut seen = HashSet::new();
        for item in &self.ingredients {
            if !seen.insert(item.id) {
                return Err(ValidationError::DuplicateIngredient(item.id));
            }
        }
        let mut seen = HashSet::new();
        for tag in &self.tags {
            if !seen.insert(*tag) {
                return Err(ValidationError::DuplicateTag(*tag));
            }
        }
        if !in_range(self.cooking_time) {
            return Err(ValidationError::CookingTime(self.cooking_time));
        }
        for item in &self.ingredients {
            if !in_range(item.amount) {
                return Err(ValidationError::Amount {
                    id: item.id,
                    amount: item.amount,
                });
            }
        }
        text_field(&self.name, "name", RECIPE_NAME_MAX_LENGTH)
    }

    pub fn ingredient_ids(&self) -> Vec<i64> {
        self.ingredients.iter().map(|i| i.id).collect()
    }

    pub fn into_draft(self, image: Option<String>) -> RecipeDraft {
        RecipeDraft {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image,
            ingredients: self.ingredients,
            tags: self.tags,
        }
    }
}

/// First requested id missing from `found`, if any.
pub fn first_unknown(requested: &[i64], found: &[i64]) -> Option<i64> {
    let found: HashSet<_> = found.iter().collect();
    requested.iter().copied().find(|id| !found.contains(id))
}

/// Distinct ids may still name the same ingredient twice.
pub fn check_distinct_names(ingredients: &[Ingredient]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for ingredient in ingredients {
        if !seen.insert(ingredient.name.as_str()) {
            return Err(ValidationError::DuplicateIngredientName(
                ingredient.name.clone(),
            ));
        }
    }
    Ok(())
}

fn check_color(color: &str) -> Result<(), ValidationError> {
    let hex = color.strip_prefix('#').unwrap_or("");
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::Color(color.to_string()))
    }
}

fn check_slug(slug: &str) -> Result<(), ValidationError> {
    text_field(slug, "slug", SLUG_MAX_LENGTH)?;
    if slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::Slug)
    }
}

impl IngredientWrite {
    pub fn check(&self) -> Result<(), ValidationError> {
        text_field(&self.name, "name", INGREDIENT_NAME_MAX_LENGTH)?;
        text_field(
            &self.measurement_unit,
            "measurement_unit",
            MEASUREMENT_UNIT_MAX_LENGTH,
        )
    }
}

impl IngredientPatch {
    pub fn check(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            text_field(name, "name", INGREDIENT_NAME_MAX_LENGTH)?;
        }
        if let Some(unit) = &self.measurement_unit {
            text_field(unit, "measurement_unit", MEASUREMENT_UNIT_MAX_LENGTH)?;
        }
        Ok(())
    }
}

impl TagWrite {
    pub fn check(&self) -> Result<(), ValidationError> {
        text_field(&self.name, "name", TAG_NAME_MAX_LENGTH)?;
        check_color(&self.color)?;
        check_slug(&self.slug)
    }
}

impl TagPatch {
    pub fn check(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            text_field(name, "name", TAG_NAME_MAX_LENGTH)?;
        }
        if let Some(color) = &self.color {
            check_color(color)?;
        }
        if let Some(slug) = &self.slug {
            check_slug(slug)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soup() -> RecipeWrite {
        RecipeWrite {
            name: "Soup".to_string(),
            text: "Boil everything.".to_string(),
            cooking_time: 20,
            ingredients: vec![
                IngredientAmount { id: 1, amount: 2 },
                IngredientAmount { id: 2, amount: 300 },
            ],
            tags: vec![3, 4],
            image: None,
        }
    }

    fn ingredient(id: i64, name: &str) -> Ingredient {
        Ingredient {
            id,
            name: name.to_string(),
            measurement_unit: "g".to_string(),
        }
    }

    #[test]
    fn test_valid_recipe_passes() {
        assert_eq!(soup().check_shape(), Ok(()));
    }

    #[test]
    fn test_recipe_without_ingredients_fails() {
        let mut recipe = soup();
        recipe.ingredients.clear();
        assert_eq!(recipe.check_shape(), Err(ValidationError::NoIngredients));
    }

    #[test]
    fn test_recipe_without_tags_fails() {
        let mut recipe = soup();
        recipe.tags.clear();
        assert_eq!(recipe.check_shape(), Err(ValidationError::NoTags));
    }

    #[test]
    fn test_duplicate_ingredient_id_fails() {
        let mut recipe = soup();
        recipe.ingredients.push(IngredientAmount { id: 1, amount: 5 });
        assert_eq!(
            recipe.check_shape(),
            Err(ValidationError::DuplicateIngredient(1))
        );
    }

    #[test]
    fn test_duplicate_tag_fails() {
        let mut recipe = soup();
        recipe.tags.push(3);
        assert_eq!(recipe.check_shape(), Err(ValidationError::DuplicateTag(3)));
    }

    #[test]
    fn test_cooking_time_bounds() {
        for (time, ok) in [(0, false), (1, true), (32000, true), (32001, false), (-5, false)] {
            let mut recipe = soup();
            recipe.cooking_time = time;
            assert_eq!(recipe.check_shape().is_ok(), ok, "cooking_time {time}");
        }
    }

    #[test]
    fn test_amount_bounds() {
        let mut recipe = soup();
        recipe.ingredients[1].amount = 0;
        assert_eq!(
            recipe.check_shape(),
            Err(ValidationError::Amount { id: 2, amount: 0 })
        );
        recipe.ingredients[1].amount = 32001;
        assert!(recipe.check_shape().is_err());
        recipe.ingredients[1].amount = 32000;
        assert!(recipe.check_shape().is_ok());
    }

    #[test]
    fn test_blank_and_long_names_fail() {
        let mut recipe = soup();
        recipe.name = "   ".to_string();
        assert_eq!(recipe.check_shape(), Err(ValidationError::Blank("name")));
        recipe.name = "x".repeat(RECIPE_NAME_MAX_LENGTH + 1);
        assert!(matches!(
            recipe.check_shape(),
            Err(ValidationError::TooLong { field: "name", .. })
        ));
    }

    #[test]
    fn test_first_unknown() {
        assert_eq!(first_unknown(&[1, 2, 3], &[3, 1]), Some(2));
        assert_eq!(first_unknown(&[1, 2], &[2, 1]), None);
    }

    #[test]
    fn test_distinct_names() {
        assert!(check_distinct_names(&[ingredient(1, "Salt"), ingredient(2, "Sugar")]).is_ok());
        assert_eq!(
            check_distinct_names(&[ingredient(1, "Salt"), ingredient(2, "Salt")]),
            Err(ValidationError::DuplicateIngredientName("Salt".to_string()))
        );
    }

    #[test]
    fn test_into_draft_keeps_fields() {
        let draft = soup().into_draft(Some("/media/recipes/images/a.png".to_string()));
        assert_eq!(draft.name, "Soup");
        assert_eq!(draft.ingredients.len(), 2);
        assert_eq!(draft.image.as_deref(), Some("/media/recipes/images/a.png"));
    }

    #[test]
    fn test_tag_checks() {
        let tag = TagWrite {
            name: "Breakfast".to_string(),
            color: "#E26C2D".to_string(),
            slug: "breakfast_1".to_string(),
        };
        assert!(tag.check().is_ok());
        let bad_color = TagWrite {
            color: "red".to_string(),
            ..tag.clone()
        };
        assert_eq!(bad_color.check(), Err(ValidationError::Color("red".to_string())));
        let bad_slug = TagWrite {
            slug: "café au lait".to_string(),
            ..tag
        };
        assert_eq!(bad_slug.check(), Err(ValidationError::Slug));
    }

    #[test]
    fn test_ingredient_checks() {
        let patch = IngredientPatch {
            name: None,
            measurement_unit: Some("x".repeat(MEASUREMENT_UNIT_MAX_LENGTH + 1)),
        };
        assert!(patch.check().is_err());
        assert!(IngredientWrite {
            name: "Salt".to_string(),
            measurement_unit: "g".to_string(),
        }
        .check()
        .is_ok());
    }
}
