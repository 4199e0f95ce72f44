use super::{query_param, Flag, ShoppingListFile};
use crate::infra::{
    auth::{AuthUser, Viewer},
    error::ApiError,
    images::{parse_data_uri, MediaStore},
    mongo::{MongoRep, MongoRepError, Recipe, RecipeFilter, RecipeOrdering, Relation, User},
    payloads::{RecipeRead, RecipeShort, RecipeWrite},
    read_model::{recipe_read, recipe_reads},
    shopping,
    validation::{check_distinct_names, first_unknown, RecipeDraft, ValidationError},
};
use log::info;
use rocket::{http::Status, response::status::Created, serde::json::Json, State};

#[derive(Debug, FromForm)]
pub struct RecipeQuery {
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
    pub ordering: Option<String>,
}

impl RecipeQuery {
    pub fn into_filter(self, viewer: Option<i64>) -> Result<RecipeFilter, ApiError> {
        let ordering = match self.ordering.as_deref() {
            Some(value) => value.parse::<RecipeOrdering>().map_err(ApiError::BadRequest)?,
            None => RecipeOrdering::default(),
        };
        let flag = |name, value: &Option<String>| {
            query_param::<Flag>(name, value.as_deref()).map(|flag| flag.map(|f| f.0))
        };
        Ok(RecipeFilter {
            viewer,
            author: query_param("author", self.author.as_deref())?,
            is_favorited: flag("is_favorited", &self.is_favorited)?,
            is_in_shopping_cart: flag("is_in_shopping_cart", &self.is_in_shopping_cart)?,
            tags: self.tags,
            ordering,
        })
    }
}

/// Validates `payload` against the catalog and the author's recipes, then stores its image.
fn prepare_draft(
    db: &MongoRep,
    media: &MediaStore,
    author: &User,
    payload: RecipeWrite,
    existing: Option<&Recipe>,
) -> Result<RecipeDraft, ApiError> {
    payload.check_shape()?;

    let requested = payload.ingredient_ids();
    let ingredients = db.get_ingredients_by_id(&requested)?;
    let found: Vec<i64> = ingredients.iter().map(|i| i.id).collect();
    if let Some(id) = first_unknown(&requested, &found) {
        return Err(ValidationError::UnknownIngredient(id).into());
    }
    check_distinct_names(&ingredients)?;

    let tags = db.get_tags_by_id(&payload.tags)?;
    let found: Vec<i64> = tags.iter().map(|t| t.id).collect();
    if let Some(id) = first_unknown(&payload.tags, &found) {
        return Err(ValidationError::UnknownTag(id).into());
    }

    if db.recipe_name_taken(author.id, &payload.name, existing.map(|r| r.id))? {
        return Err(ValidationError::DuplicateName(payload.name).into());
    }

    let image = match payload.image.as_deref() {
        Some(uri) if !uri.is_empty() => Some(media.save_recipe_image(&parse_data_uri(uri)?)?),
        _ => None,
    };
    Ok(payload.into_draft(image))
}

/// Removes a freshly stored image when the write it belongs to failed.
fn discard_image_on_error<T>(
    media: &MediaStore,
    image: Option<&str>,
    result: Result<T, MongoRepError>,
) -> Result<T, MongoRepError> {
    if let (Err(_), Some(url)) = (&result, image) {
        media.remove(url);
    }
    result
}

/// Loads a recipe the user is allowed to modify.
fn owned_recipe(db: &MongoRep, user: &User, id: i64) -> Result<Recipe, ApiError> {
    let recipe = db.get_recipe(id)?;
    if recipe.author != user.id {
        return Err(ApiError::Forbidden);
    }
    Ok(recipe)
}

#[get("/recipes?<query..>")]
pub fn get_recipes(
    db: &State<MongoRep>,
    viewer: Viewer,
    query: RecipeQuery,
) -> Result<Json<Vec<RecipeRead>>, ApiError> {
    let filter = query.into_filter(viewer.id())?;
    let recipes = db.list_recipes(&filter)?;
    Ok(Json(recipe_reads(db, viewer.id(), recipes)?))
}

#[get("/recipes/<id>")]
pub fn get_recipe(
    db: &State<MongoRep>,
    viewer: Viewer,
    id: i64,
) -> Result<Json<RecipeRead>, ApiError> {
    let recipe = db.get_recipe(id)?;
    Ok(Json(recipe_read(db, viewer.id(), recipe)?))
}

#[post("/recipes", data = "<payload>")]
pub fn create_recipe(
    db: &State<MongoRep>,
    media: &State<MediaStore>,
    user: AuthUser,
    payload: Json<RecipeWrite>,
) -> Result<Created<Json<RecipeRead>>, ApiError> {
    let AuthUser(author) = user;
    let draft = prepare_draft(db, media, &author, payload.into_inner(), None)?;
    let image = draft.image.clone();
    let created = db.create_recipe(author.id, draft);
    let recipe = discard_image_on_error(media, image.as_deref(), created)?;
    let location = format!("/api/recipes/{}", recipe.id);
    let read = recipe_read(db, Some(author.id), recipe)?;
    Ok(Created::new(location).body(Json(read)))
}

#[patch("/recipes/<id>", data = "<payload>")]
pub fn update_recipe(
    db: &State<MongoRep>,
    media: &State<MediaStore>,
    user: AuthUser,
    id: i64,
    payload: Json<RecipeWrite>,
) -> Result<Json<RecipeRead>, ApiError> {
    let AuthUser(author) = user;
    let recipe = owned_recipe(db, &author, id)?;
    let previous_image = recipe.image.clone();
    let draft = prepare_draft(db, media, &author, payload.into_inner(), Some(&recipe))?;
    let image = draft.image.clone();
    let updated = db.update_recipe(recipe, draft);
    let recipe = discard_image_on_error(media, image.as_deref(), updated)?;
    if let (true, Some(old)) = (image.is_some(), previous_image) {
        media.remove(&old);
    }
    Ok(Json(recipe_read(db, Some(author.id), recipe)?))
}

#[delete("/recipes/<id>")]
pub fn delete_recipe(
    db: &State<MongoRep>,
    media: &State<MediaStore>,
    user: AuthUser,
    id: i64,
) -> Result<Status, ApiError> {
    let recipe = owned_recipe(db, &user.0, id)?;
    db.delete_recipe(recipe.id)?;
    if let Some(image) = recipe.image {
        media.remove(&image);
    }
    Ok(Status::NoContent)
}

fn add_to(
    db: &MongoRep,
    relation: Relation,
    user: &User,
    id: i64,
) -> Result<Created<Json<RecipeShort>>, ApiError> {
    let recipe = db.get_recipe(id)?;
    db.add_relation(relation, user.id, recipe.id)?;
    let location = format!("/api/recipes/{}", recipe.id);
    Ok(Created::new(location).body(Json(recipe.into())))
}

fn remove_from(db: &MongoRep, relation: Relation, user: &User, id: i64) -> Result<Status, ApiError> {
    let recipe = db.get_recipe(id)?;
    db.remove_relation(relation, user.id, recipe.id)?;
    Ok(Status::NoContent)
}

#[post("/recipes/<id>/favorite")]
pub fn add_favorite(
    db: &State<MongoRep>,
    user: AuthUser,
    id: i64,
) -> Result<Created<Json<RecipeShort>>, ApiError> {
    add_to(db, Relation::Favorite, &user.0, id)
}

#[delete("/recipes/<id>/favorite")]
pub fn remove_favorite(db: &State<MongoRep>, user: AuthUser, id: i64) -> Result<Status, ApiError> {
    remove_from(db, Relation::Favorite, &user.0, id)
}

#[post("/recipes/<id>/shopping_cart")]
pub fn add_to_shopping_cart(
    db: &State<MongoRep>,
    user: AuthUser,
    id: i64,
) -> Result<Created<Json<RecipeShort>>, ApiError> {
    add_to(db, Relation::ShoppingCart, &user.0, id)
}

#[delete("/recipes/<id>/shopping_cart")]
pub fn remove_from_shopping_cart(
    db: &State<MongoRep>,
    user: AuthUser,
    id: i64,
) -> Result<Status, ApiError> {
    remove_from(db, Relation::ShoppingCart, &user.0, id)
}

#[get("/recipes/download_shopping_cart")]
pub fn download_shopping_cart(
    db: &State<MongoRep>,
    user: AuthUser,
) -> Result<ShoppingListFile, ApiError> {
    let rows = db.shopping_cart_rows(user.0.id)?;
    let lines = shopping::aggregate(rows);
    info!(
        "user {} downloaded a shopping list of {} items",
        user.0.id,
        lines.len()
    );
    Ok(ShoppingListFile(shopping::render(&lines)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::images::MEDIA_URL;

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    fn stored_image(media: &MediaStore) -> String {
        media
            .save_recipe_image(&parse_data_uri(PIXEL).unwrap())
            .unwrap()
    }

    fn on_disk(root: &std::path::Path, url: &str) -> bool {
        let relative = url.strip_prefix(MEDIA_URL).unwrap().trim_start_matches('/');
        root.join(relative).exists()
    }

    #[test]
    fn test_failed_write_discards_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        let url = stored_image(&media);
        assert!(on_disk(dir.path(), &url));

        let failed: Result<(), MongoRepError> =
            Err(MongoRepError::Duplicate("you already have a recipe with this name".into()));
        assert!(discard_image_on_error(&media, Some(&url), failed).is_err());
        assert!(!on_disk(dir.path(), &url));
    }

    #[test]
    fn test_successful_write_keeps_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let media = MediaStore::new(dir.path());
        let url = stored_image(&media);
        assert_eq!(discard_image_on_error(&media, Some(&url), Ok(7)).unwrap(), 7);
        assert!(on_disk(dir.path(), &url));
    }

    #[test]
    fn test_query_filters_are_parsed_strictly() {
        let query = RecipeQuery {
            author: Some("3".to_string()),
            tags: vec!["lunch".to_string()],
            is_favorited: Some("1".to_string()),
            is_in_shopping_cart: None,
            ordering: Some("-cooking_time".to_string()),
        };
        let filter = query.into_filter(Some(5)).unwrap();
        assert_eq!(filter.author, Some(3));
        assert_eq!(filter.is_favorited, Some(true));
        assert_eq!(filter.is_in_shopping_cart, None);
        assert_eq!(filter.viewer, Some(5));

        let query = RecipeQuery {
            author: Some("abc".to_string()),
            tags: vec![],
            is_favorited: None,
            is_in_shopping_cart: None,
            ordering: None,
        };
        assert!(matches!(query.into_filter(None), Err(ApiError::BadRequest(_))));
    }
}
