use super::api::{collect, MongoRep, MongoRepError};
use super::types::{Follow, UserRecipe};
use crate::infra::shopping::CartRow;
use log::info;
use mongodb::{bson::doc, sync::Collection};
use std::collections::HashMap;

/// User-to-recipe relations sharing the same toggle semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Favorite,
    ShoppingCart,
}

impl Relation {
    pub fn label(&self) -> &'static str {
        match self {
            Relation::Favorite => "favorites",
            Relation::ShoppingCart => "the shopping cart",
        }
    }
}

impl MongoRep {
    fn relation(&self, relation: Relation) -> &Collection<UserRecipe> {
        match relation {
            Relation::Favorite => &self.favorites,
            Relation::ShoppingCart => &self.shopping_carts,
        }
    }

    pub fn has_relation(
        &self,
        relation: Relation,
        user: i64,
        recipe: i64,
    ) -> Result<bool, MongoRepError> {
        let found = self
            .relation(relation)
            .count_documents(doc! {"user_id": user, "recipe_id": recipe}, None)?;
        Ok(found > 0)
    }

    /// Adds the row, rejecting it when it already exists.
    pub fn add_relation(
        &self,
        relation: Relation,
        user: i64,
        recipe: i64,
    ) -> Result<(), MongoRepError> {
        let duplicate = format!("recipe is already in {}", relation.label());
        if self.has_relation(relation, user, recipe)? {
            return Err(MongoRepError::Duplicate(duplicate));
        }
        self.relation(relation)
            .insert_one(
                UserRecipe {
                    user_id: user,
                    recipe_id: recipe,
                },
                None,
            )
            .map_err(MongoRepError::on_duplicate(duplicate))?;
        info!("user {user} added recipe {recipe} to {}", relation.label());
        Ok(())
    }

    /// Removes the row, rejecting the call when there is nothing to remove.
    pub fn remove_relation(
        &self,
        relation: Relation,
        user: i64,
        recipe: i64,
    ) -> Result<(), MongoRepError> {
        let deleted = self
            .relation(relation)
            .delete_one(doc! {"user_id": user, "recipe_id": recipe}, None)?;
        if deleted.deleted_count == 0 {
            return Err(MongoRepError::Invalid(format!(
                "recipe is not in {}",
                relation.label()
            )));
        }
        info!("user {user} removed recipe {recipe} from {}", relation.label());
        Ok(())
    }

    pub fn related_recipe_ids(
        &self,
        relation: Relation,
        user: i64,
    ) -> Result<Vec<i64>, MongoRepError> {
        let rows = collect(self.relation(relation).find(doc! {"user_id": user}, None)?)?;
        Ok(rows.into_iter().map(|row| row.recipe_id).collect())
    }

    /// Ingredient rows of every recipe in the user's cart, resolved to name and unit.
    pub fn shopping_cart_rows(&self, user: i64) -> Result<Vec<CartRow>, MongoRepError> {
        let recipe_ids = self.related_recipe_ids(Relation::ShoppingCart, user)?;
        let rows = self.recipe_ingredients(&recipe_ids)?;
        let mut ingredient_ids: Vec<i64> = rows.iter().map(|row| row.ingredient_id).collect();
        ingredient_ids.sort_unstable();
        ingredient_ids.dedup();
        let ingredients: HashMap<_, _> = self
            .get_ingredients_by_id(&ingredient_ids)?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                ingredients.get(&row.ingredient_id).map(|i| CartRow {
                    name: i.name.clone(),
                    measurement_unit: i.measurement_unit.clone(),
                    amount: row.amount,
                })
            })
            .collect())
    }

    pub fn is_following(&self, user: i64, author: i64) -> Result<bool, MongoRepError> {
        let found = self
            .follows
            .count_documents(doc! {"user_id": user, "author_id": author}, None)?;
        Ok(found > 0)
    }

    pub fn follow(&self, user: i64, author: i64) -> Result<(), MongoRepError> {
        if user == author {
            return Err(MongoRepError::Invalid(
                "you cannot subscribe to yourself".to_string(),
            ));
        }
        let duplicate = "you are already subscribed to this author";
        if self.is_following(user, author)? {
            return Err(MongoRepError::Duplicate(duplicate.to_string()));
        }
        self.follows
            .insert_one(
                Follow {
                    user_id: user,
                    author_id: author,
                },
                None,
            )
            .map_err(MongoRepError::on_duplicate(duplicate))?;
        info!("user {user} subscribed to {author}");
        Ok(())
    }

    pub fn unfollow(&self, user: i64, author: i64) -> Result<(), MongoRepError> {
        let deleted = self
            .follows
            .delete_one(doc! {"user_id": user, "author_id": author}, None)?;
        if deleted.deleted_count == 0 {
            return Err(MongoRepError::Invalid(
                "you are not subscribed to this author".to_string(),
            ));
        }
        info!("user {user} unsubscribed from {author}");
        Ok(())
    }

    pub fn followed_author_ids(&self, user: i64) -> Result<Vec<i64>, MongoRepError> {
        let rows = collect(self.follows.find(doc! {"user_id": user}, None)?)?;
        Ok(rows.into_iter().map(|row| row.author_id).collect())
    }
}
