use crate::infra::{
    auth::AuthUser,
    error::ApiError,
    mongo::MongoRep,
    payloads::{IngredientPatch, IngredientRead, IngredientWrite, TagPatch, TagRead, TagWrite},
};
use rocket::{http::Status, response::status::Created, serde::json::Json, State};

#[get("/ingredients?<name>")]
pub fn get_ingredients(
    db: &State<MongoRep>,
    name: Option<&str>,
) -> Result<Json<Vec<IngredientRead>>, ApiError> {
    let ingredients = db.list_ingredients(name)?;
    Ok(Json(ingredients.into_iter().map(IngredientRead::from).collect()))
}

#[get("/ingredients/<id>")]
pub fn get_ingredient(db: &State<MongoRep>, id: i64) -> Result<Json<IngredientRead>, ApiError> {
    Ok(Json(db.get_ingredient(id)?.into()))
}

#[post("/ingredients", data = "<payload>")]
pub fn create_ingredient(
    db: &State<MongoRep>,
    _user: AuthUser,
    payload: Json<IngredientWrite>,
) -> Result<Created<Json<IngredientRead>>, ApiError> {
    let payload = payload.into_inner();
    payload.check()?;
    let ingredient = db.create_ingredient(payload)?;
    let location = format!("/api/ingredients/{}", ingredient.id);
    Ok(Created::new(location).body(Json(ingredient.into())))
}

#[patch("/ingredients/<id>", data = "<payload>")]
pub fn update_ingredient(
    db: &State<MongoRep>,
    _user: AuthUser,
    id: i64,
    payload: Json<IngredientPatch>,
) -> Result<Json<IngredientRead>, ApiError> {
    let payload = payload.into_inner();
    payload.check()?;
    Ok(Json(db.update_ingredient(id, payload)?.into()))
}

#[delete("/ingredients/<id>")]
pub fn delete_ingredient(
    db: &State<MongoRep>,
    _user: AuthUser,
    id: i64,
) -> Result<Status, ApiError> {
    db.delete_ingredient(id)?;
    Ok(Status::NoContent)
}

#[get("/tags")]
pub fn get_tags(db: &State<MongoRep>) -> Result<Json<Vec<TagRead>>, ApiError> {
    let tags = db.list_tags()?;
    Ok(Json(tags.into_iter().map(TagRead::from).collect()))
}

#[get("/tags/<id>")]
pub fn get_tag(db: &State<MongoRep>, id: i64) -> Result<Json<TagRead>, ApiError> {
    Ok(Json(db.get_tag(id)?.into()))
}

#[post("/tags", data = "<payload>")]
pub fn create_tag(
    db: &State<MongoRep>,
    _user: AuthUser,
    payload: Json<TagWrite>,
) -> Result<Created<Json<TagRead>>, ApiError> {
    let payload = payload.into_inner();
    payload.check()?;
    let tag = db.create_tag(payload)?;
    let location = format!("/api/tags/{}", tag.id);
    Ok(Created::new(location).body(Json(tag.into())))
}

#[patch("/tags/<id>", data = "<payload>")]
pub fn update_tag(
    db: &State<MongoRep>,
    _user: AuthUser,
    id: i64,
    payload: Json<TagPatch>,
) -> Result<Json<TagRead>, ApiError> {
    let payload = payload.into_inner();
    payload.check()?;
    Ok(Json(db.update_tag(id, payload)?.into()))
}

#[delete("/tags/<id>")]
pub fn delete_tag(db: &State<MongoRep>, _user: AuthUser, id: i64) -> Result<Status, ApiError> {
    db.delete_tag(id)?;
    Ok(Status::NoContent)
}
