//! Request bodies (write model) and response bodies (read model).
//!
//! The read model never exposes storage documents directly: ids are renamed,
//! related rows are resolved and viewer-relative flags are attached.

use super::mongo::{Ingredient, Recipe, Tag, User};
use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientWrite {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientPatch {
    pub name: Option<String>,
    pub measurement_unit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagWrite {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub slug: Option<String>,
}

/// Accepts a JSON integer or a string holding one, as form-backed clients send both.
fn integer_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(value) => Ok(value),
        Raw::Str(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an integer, got {text:?}"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    #[serde(deserialize_with = "integer_or_string")]
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeWrite {
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(deserialize_with = "integer_or_string")]
    pub cooking_time: i64,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i64>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IngredientRead {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientRead {
    fn from(ingredient: Ingredient) -> Self {
        IngredientRead {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TagRead {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagRead {
    fn from(tag: Tag) -> Self {
        TagRead {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserRead {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserRead {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        UserRead {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// Ingredient of a recipe with its amount.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecipeIngredientRead {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecipeRead {
    pub id: i64,
    pub tags: Vec<TagRead>,
    pub author: UserRead,
    pub ingredients: Vec<RecipeIngredientRead>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    #[serde(deserialize_with = "integer_or_string")]
    pub cooking_time: i64,
}

/// Compact recipe used by favorites, the shopping cart and subscriptions.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i64,
}

impl From<Recipe> for RecipeShort {
    fn from(recipe: Recipe) -> Self {
        RecipeShort {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionRead {
    #[serde(flatten)]
    pub author: UserRead,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::serde::json::{from_str, json, to_value};

    #[test]
    fn test_recipe_write_defaults_optional_fields() {
        let payload: RecipeWrite = from_str(
            r#"{"name":"Soup","cooking_time":20,"ingredients":[{"id":1,"amount":2}],"tags":[3]}"#,
        )
        .unwrap();
        assert_eq!(payload.text, "");
        assert_eq!(payload.image, None);
        assert_eq!(payload.ingredients, vec![IngredientAmount { id: 1, amount: 2 }]);
        assert_eq!(payload.tags, vec![3]);
    }

    #[test]
    fn test_recipe_write_accepts_numeric_strings() {
        let payload: RecipeWrite = from_str(
            r#"{"name":"Soup","cooking_time":"20","ingredients":[{"id":1,"amount":" 2"}],"tags":[3]}"#,
        )
        .unwrap();
        assert_eq!(payload.cooking_time, 20);
        assert_eq!(payload.ingredients, vec![IngredientAmount { id: 1, amount: 2 }]);

        // range checks still happen later, only the shape is decided here
        let zero: RecipeWrite = from_str(
            r#"{"name":"Soup","cooking_time":"0","ingredients":[{"id":1,"amount":2}],"tags":[3]}"#,
        )
        .unwrap();
        assert_eq!(zero.cooking_time, 0);

        assert!(from_str::<RecipeWrite>(
            r#"{"name":"Soup","cooking_time":"soon","ingredients":[{"id":1,"amount":2}],"tags":[3]}"#,
        )
        .is_err());
        assert!(from_str::<RecipeWrite>(
            r#"{"name":"Soup","cooking_time":20.5,"ingredients":[{"id":1,"amount":2}],"tags":[3]}"#,
        )
        .is_err());
    }

    #[test]
    fn test_subscription_flattens_author_fields() {
        let author = User {
            id: 7,
            email: "cook@example.com".to_string(),
            username: "cook".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
        };
        let subscription = SubscriptionRead {
            author: UserRead::new(author, true),
            recipes: vec![],
            recipes_count: 4,
        };
        assert_eq!(
            to_value(&subscription).unwrap(),
            json!({
                "email": "cook@example.com",
                "id": 7,
                "username": "cook",
                "first_name": "Ann",
                "last_name": "Lee",
                "is_subscribed": true,
                "recipes": [],
                "recipes_count": 4
            })
        );
    }
}
