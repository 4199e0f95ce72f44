mod api;
mod catalog;
mod recipes;
mod relations;
mod types;
mod users;

pub use api::{MongoRep, MongoRepError};
pub use recipes::{RecipeFilter, RecipeOrdering};
pub use relations::Relation;
pub use types::{Ingredient, Recipe, Tag, User};

#[cfg(test)]
pub(crate) use api::tests as tests_support;
