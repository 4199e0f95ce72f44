use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Access token issued by the identity service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Token {
    pub key: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Ingredient {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Tag {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: i64,
    pub author: i64,
    pub name: String,
    pub image: Option<String>,
    #[serde(default)]
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecipeIngredient {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecipeTag {
    pub recipe_id: i64,
    pub tag_id: i64,
}

/// Row of the favorites and shopping_carts collections.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserRecipe {
    pub user_id: i64,
    pub recipe_id: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Follow {
    pub user_id: i64,
    pub author_id: i64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}
