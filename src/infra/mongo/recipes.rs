use super::api::{collect, MongoRep, MongoRepError};
use super::types::{Recipe, RecipeIngredient, RecipeTag};
use crate::infra::validation::RecipeDraft;
use log::info;
use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
};
use std::str::FromStr;

const DUPLICATE_RECIPE: &str = "you already have a recipe with this name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Id,
    Name,
    CookingTime,
}

/// `?ordering=` value: a field name, `-` prefixed for descending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeOrdering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for RecipeOrdering {
    fn default() -> Self {
        RecipeOrdering {
            field: OrderField::Id,
            descending: true,
        }
    }
}

impl FromStr for RecipeOrdering {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match value.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, value),
        };
        let field = match name {
            "id" => OrderField::Id,
            "name" => OrderField::Name,
            "cooking_time" => OrderField::CookingTime,
            _ => return Err(format!("cannot order recipes by {value:?}")),
        };
        Ok(RecipeOrdering { field, descending })
    }
}

impl RecipeOrdering {
    pub fn sort(&self) -> Document {
        let direction = if self.descending { -1 } else { 1 };
        match self.field {
            OrderField::Id => doc! {"_id": direction},
            OrderField::Name => doc! {"name": direction, "_id": -1},
            OrderField::CookingTime => doc! {"cooking_time": direction, "_id": -1},
        }
    }
}

/// Recipe list constraints. Flags are relative to `viewer`.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub viewer: Option<i64>,
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
    pub ordering: RecipeOrdering,
}

/// Restricts `_id` to (or away from) `ids`.
fn id_clause(ids: Vec<i64>, keep: bool) -> Document {
    if keep {
        doc! {"_id": {"$in": ids}}
    } else {
        doc! {"_id": {"$nin": ids}}
    }
}

impl MongoRep {
    fn flag_clause(
        &self,
        flag: Option<bool>,
        viewer: Option<i64>,
        relation: super::Relation,
    ) -> Result<Option<Document>, MongoRepError> {
        match (flag, viewer) {
            (None, _) => Ok(None),
            // nothing is favorited or in the cart of an anonymous viewer
            (Some(true), None) => Ok(Some(id_clause(Vec::new(), true))),
            (Some(false), None) => Ok(None),
            (Some(keep), Some(user)) => {
                let ids = self.related_recipe_ids(relation, user)?;
                Ok(Some(id_clause(ids, keep)))
            }
        }
    }

    pub fn recipe_query(&self, filter: &RecipeFilter) -> Result<Document, MongoRepError> {
        let mut clauses = Vec::new();
        if let Some(author) = filter.author {
            clauses.push(doc! {"author": author});
        }
        if !filter.tags.is_empty() {
            let known = self.get_tags_by_slug(&filter.tags)?;
            if let Some(slug) = filter
                .tags
                .iter()
                .find(|slug| !known.iter().any(|tag| &tag.slug == *slug))
            {
                return Err(MongoRepError::Invalid(format!("unknown tag {slug:?}")));
            }
            let tag_ids: Vec<i64> = known.into_iter().map(|t| t.id).collect();
            let links = collect(
                self.recipe_tags
                    .find(doc! {"tag_id": {"$in": tag_ids}}, None)?,
            )?;
            let mut recipe_ids: Vec<i64> = links.into_iter().map(|l| l.recipe_id).collect();
            recipe_ids.sort_unstable();
            recipe_ids.dedup();
            clauses.push(id_clause(recipe_ids, true));
        }
        if let Some(clause) =
            self.flag_clause(filter.is_favorited, filter.viewer, super::Relation::Favorite)?
        {
            clauses.push(clause);
        }
        if let Some(clause) = self.flag_clause(
            filter.is_in_shopping_cart,
            filter.viewer,
            super::Relation::ShoppingCart,
        )? {
            clauses.push(clause);
        }
        Ok(match clauses.len() {
            0 => doc! {},
            1 => clauses.remove(0),
            _ => doc! {"$and": clauses},
        })
    }

    pub fn list_recipes(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>, MongoRepError> {
        let query = self.recipe_query(filter)?;
        let options = FindOptions::builder().sort(filter.ordering.sort()).build();
        collect(self.recipes.find(query, options)?)
    }

    pub fn get_recipe(&self, id: i64) -> Result<Recipe, MongoRepError> {
        self.recipes
            .find_one(doc! {"_id": id}, None)?
            .ok_or(MongoRepError::NotFound("recipe"))
    }

    /// Newest recipes of `author`, at most `limit` when given.
    pub fn recipes_by_author(
        &self,
        author: i64,
        limit: Option<u32>,
    ) -> Result<Vec<Recipe>, MongoRepError> {
        // a zero limit means "no limit" to the server
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let options = FindOptions::builder()
            .sort(doc! {"_id": -1})
            .limit(limit.map(i64::from))
            .build();
        collect(self.recipes.find(doc! {"author": author}, options)?)
    }

    pub fn count_recipes_by_author(&self, author: i64) -> Result<u64, MongoRepError> {
        Ok(self
            .recipes
            .count_documents(doc! {"author": author}, None)?)
    }

    /// Whether `author` has a recipe called `name` other than `except`.
    pub fn recipe_name_taken(
        &self,
        author: i64,
        name: &str,
        except: Option<i64>,
    ) -> Result<bool, MongoRepError> {
        let mut query = doc! {"author": author, "name": name};
        if let Some(id) = except {
            query.insert("_id", doc! {"$ne": id});
        }
        Ok(self.recipes.count_documents(query, None)? > 0)
    }

    /// Association rows of `recipe_ids`, in insertion order.
    pub fn recipe_ingredients(
        &self,
        recipe_ids: &[i64],
    ) -> Result<Vec<RecipeIngredient>, MongoRepError> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        let options = FindOptions::builder().sort(doc! {"_id": 1}).build();
        collect(
            self.recipe_ingredients
                .find(doc! {"recipe_id": {"$in": recipe_ids}}, options)?,
        )
    }

    pub fn recipe_tags(&self, recipe_ids: &[i64]) -> Result<Vec<RecipeTag>, MongoRepError> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }
        let options = FindOptions::builder().sort(doc! {"_id": 1}).build();
        collect(
            self.recipe_tags
                .find(doc! {"recipe_id": {"$in": recipe_ids}}, options)?,
        )
    }

    fn insert_associations(&self, recipe_id: i64, draft: &RecipeDraft) -> Result<(), MongoRepError> {
        let ingredients: Vec<RecipeIngredient> = draft
            .ingredients
            .iter()
            .map(|item| RecipeIngredient {
                recipe_id,
                ingredient_id: item.id,
                amount: item.amount,
            })
            .collect();
        if !ingredients.is_empty() {
            self.recipe_ingredients.insert_many(ingredients, None)?;
        }
        let tags: Vec<RecipeTag> = draft
            .tags
            .iter()
            .map(|tag_id| RecipeTag {
                recipe_id,
                tag_id: *tag_id,
            })
            .collect();
        if !tags.is_empty() {
            self.recipe_tags.insert_many(tags, None)?;
        }
        Ok(())
    }

    pub fn create_recipe(&self, author: i64, draft: RecipeDraft) -> Result<Recipe, MongoRepError> {
        let recipe = Recipe {
            id: self.next_id("recipes")?,
            author,
            name: draft.name.clone(),
            image: draft.image.clone(),
            text: draft.text.clone(),
            cooking_time: draft.cooking_time,
        };
        self.recipes
            .insert_one(&recipe, None)
            .map_err(MongoRepError::on_duplicate(DUPLICATE_RECIPE))?;
        self.insert_associations(recipe.id, &draft)?;
        info!(
            "user {author} created recipe {} with {} ingredients",
            recipe.id,
            draft.ingredients.len()
        );
        Ok(recipe)
    }

    /// Replaces scalar fields and every association of `recipe`.
    ///
    /// The recipe document is replaced first so a rejected rename leaves the
    /// associations intact. Associations are then deleted before the new ones
    /// are inserted, so a concurrent reader may briefly see a recipe without
    /// ingredients.
    pub fn update_recipe(&self, recipe: Recipe, draft: RecipeDraft) -> Result<Recipe, MongoRepError> {
        let updated = Recipe {
            name: draft.name.clone(),
            image: draft.image.clone().or(recipe.image),
            text: draft.text.clone(),
            cooking_time: draft.cooking_time,
            ..recipe
        };
        self.recipes
            .replace_one(doc! {"_id": updated.id}, &updated, None)
            .map_err(MongoRepError::on_duplicate(DUPLICATE_RECIPE))?;
        let rows = doc! {"recipe_id": updated.id};
        self.recipe_ingredients.delete_many(rows.clone(), None)?;
        self.recipe_tags.delete_many(rows, None)?;
        self.insert_associations(updated.id, &draft)?;
        info!("user {} updated recipe {}", updated.author, updated.id);
        Ok(updated)
    }

    /// Deletes the recipe and every row referencing it.
    pub fn delete_recipe(&self, id: i64) -> Result<(), MongoRepError> {
        let deleted = self.recipes.delete_one(doc! {"_id": id}, None)?;
        if deleted.deleted_count == 0 {
            return Err(MongoRepError::NotFound("recipe"));
        }
        let rows = doc! {"recipe_id": id};
        self.recipe_ingredients.delete_many(rows.clone(), None)?;
        self.recipe_tags.delete_many(rows.clone(), None)?;
        self.favorites.delete_many(rows.clone(), None)?;
        self.shopping_carts.delete_many(rows, None)?;
        info!("deleted recipe {id}");
        Ok(())
    }
}
