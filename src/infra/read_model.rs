use super::mongo::{MongoRep, MongoRepError, Recipe, Relation, User};
use super::payloads::{
    IngredientRead, RecipeIngredientRead, RecipeRead, RecipeShort, SubscriptionRead, TagRead,
    UserRead,
};
use log::warn;
use std::collections::{HashMap, HashSet};

/// Viewer-relative sets used to compute the boolean flags of a response.
#[derive(Debug, Default)]
pub struct ViewerMarks {
    pub favorites: HashSet<i64>,
    pub shopping_cart: HashSet<i64>,
    pub following: HashSet<i64>,
}

impl ViewerMarks {
    pub fn load(db: &MongoRep, viewer: Option<i64>) -> Result<Self, MongoRepError> {
        let user = match viewer {
            Some(user) => user,
            None => return Ok(ViewerMarks::default()),
        };
        Ok(ViewerMarks {
            favorites: db
                .related_recipe_ids(Relation::Favorite, user)?
                .into_iter()
                .collect(),
            shopping_cart: db
                .related_recipe_ids(Relation::ShoppingCart, user)?
                .into_iter()
                .collect(),
            following: db.followed_author_ids(user)?.into_iter().collect(),
        })
    }
}

pub fn user_reads(
    db: &MongoRep,
    viewer: Option<i64>,
    users: Vec<User>,
) -> Result<Vec<UserRead>, MongoRepError> {
    let marks = ViewerMarks::load(db, viewer)?;
    Ok(users
        .into_iter()
        .map(|user| {
            let subscribed = marks.following.contains(&user.id);
            UserRead::new(user, subscribed)
        })
        .collect())
}

/// Resolves ingredients, tags and authors of `recipes` in batched queries.
pub fn recipe_reads(
    db: &MongoRep,
    viewer: Option<i64>,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeRead>, MongoRepError> {
    let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let marks = ViewerMarks::load(db, viewer)?;

    let rows = db.recipe_ingredients(&ids)?;
    let ingredient_ids: Vec<i64> = rows.iter().map(|r| r.ingredient_id).collect();
    let ingredients: HashMap<i64, IngredientRead> = db
        .get_ingredients_by_id(&ingredient_ids)?
        .into_iter()
        .map(|i| (i.id, IngredientRead::from(i)))
        .collect();
    let mut ingredients_of: HashMap<i64, Vec<RecipeIngredientRead>> = HashMap::new();
    for row in rows {
        if let Some(ingredient) = ingredients.get(&row.ingredient_id) {
            ingredients_of
                .entry(row.recipe_id)
                .or_default()
                .push(RecipeIngredientRead {
                    id: ingredient.id,
                    name: ingredient.name.clone(),
                    measurement_unit: ingredient.measurement_unit.clone(),
                    amount: row.amount,
                });
        }
    }

    let links = db.recipe_tags(&ids)?;
    let tag_ids: Vec<i64> = links.iter().map(|l| l.tag_id).collect();
    let tags: HashMap<i64, TagRead> = db
        .get_tags_by_id(&tag_ids)?
        .into_iter()
        .map(|t| (t.id, TagRead::from(t)))
        .collect();
    let mut tags_of: HashMap<i64, Vec<TagRead>> = HashMap::new();
    for link in links {
        if let Some(tag) = tags.get(&link.tag_id) {
            tags_of.entry(link.recipe_id).or_default().push(tag.clone());
        }
    }

    let author_ids: Vec<i64> = recipes.iter().map(|r| r.author).collect();
    let authors: HashMap<i64, User> = db
        .get_users_by_id(&author_ids)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(recipes
        .into_iter()
        .filter_map(|recipe| {
            let author = match authors.get(&recipe.author) {
                Some(author) => author.clone(),
                None => {
                    warn!("recipe {} has unknown author {}", recipe.id, recipe.author);
                    return None;
                }
            };
            let subscribed = marks.following.contains(&author.id);
            Some(RecipeRead {
                id: recipe.id,
                tags: tags_of.remove(&recipe.id).unwrap_or_default(),
                author: UserRead::new(author, subscribed),
                ingredients: ingredients_of.remove(&recipe.id).unwrap_or_default(),
                is_favorited: marks.favorites.contains(&recipe.id),
                is_in_shopping_cart: marks.shopping_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect())
}

pub fn recipe_read(
    db: &MongoRep,
    viewer: Option<i64>,
    recipe: Recipe,
) -> Result<RecipeRead, MongoRepError> {
    recipe_reads(db, viewer, vec![recipe])?
        .pop()
        .ok_or(MongoRepError::NotFound("recipe author"))
}

/// Followed authors with their newest recipes, capped by `recipes_limit`.
pub fn subscription_reads(
    db: &MongoRep,
    viewer: i64,
    authors: Vec<User>,
    recipes_limit: Option<u32>,
) -> Result<Vec<SubscriptionRead>, MongoRepError> {
    let marks = ViewerMarks::load(db, Some(viewer))?;
    authors
        .into_iter()
        .map(|author| {
            let recipes = db
                .recipes_by_author(author.id, recipes_limit)?
                .into_iter()
                .map(RecipeShort::from)
                .collect();
            let recipes_count = db.count_recipes_by_author(author.id)?;
            let subscribed = marks.following.contains(&author.id);
            Ok(SubscriptionRead {
                author: UserRead::new(author, subscribed),
                recipes,
                recipes_count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::mongo::RecipeFilter;
    use super::super::payloads::{IngredientAmount, IngredientWrite, TagWrite};
    use super::super::validation::RecipeDraft;
    use super::*;
    use crate::infra::mongo::tests_support::fresh_repo;

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_recipe_read_resolves_everything() {
        let db = fresh_repo("foodgram_test_read_model");
        let cook = db.insert_user("cook");
        let fan = db.insert_user("fan");
        let salt = db
            .create_ingredient(IngredientWrite {
                name: "Salt".to_string(),
                measurement_unit: "g".to_string(),
            })
            .unwrap();
        let lunch = db
            .create_tag(TagWrite {
                name: "Lunch".to_string(),
                color: "#00FF00".to_string(),
                slug: "lunch".to_string(),
            })
            .unwrap();
        let recipe = db
            .create_recipe(
                cook.id,
                RecipeDraft {
                    name: "Soup".to_string(),
                    text: String::new(),
                    cooking_time: 20,
                    image: None,
                    ingredients: vec![IngredientAmount { id: salt.id, amount: 2 }],
                    tags: vec![lunch.id],
                },
            )
            .unwrap();
        db.add_relation(Relation::Favorite, fan.id, recipe.id).unwrap();
        db.follow(fan.id, cook.id).unwrap();

        let seen_by_fan = recipe_read(&db, Some(fan.id), recipe.clone()).unwrap();
        assert!(seen_by_fan.is_favorited);
        assert!(!seen_by_fan.is_in_shopping_cart);
        assert!(seen_by_fan.author.is_subscribed);
        assert_eq!(seen_by_fan.ingredients[0].name, "Salt");
        assert_eq!(seen_by_fan.ingredients[0].amount, 2);
        assert_eq!(seen_by_fan.tags[0].slug, "lunch");

        let anonymous = recipe_read(&db, None, recipe).unwrap();
        assert!(!anonymous.is_favorited);
        assert!(!anonymous.author.is_subscribed);

        let listed = db.list_recipes(&RecipeFilter::default()).unwrap();
        assert_eq!(recipe_reads(&db, None, listed).unwrap().len(), 1);

        let subscriptions =
            subscription_reads(&db, fan.id, vec![cook.clone()], Some(0)).unwrap();
        assert_eq!(subscriptions[0].recipes_count, 1);
        assert!(subscriptions[0].recipes.is_empty());
        assert!(subscriptions[0].author.is_subscribed);
    }
}
