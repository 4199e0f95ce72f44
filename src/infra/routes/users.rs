use crate::infra::{
    auth::{AuthUser, Viewer},
    error::ApiError,
    mongo::MongoRep,
    payloads::{SubscriptionRead, UserRead},
    read_model::{subscription_reads, user_reads},
};
use super::query_param;
use rocket::{http::Status, response::status::Created, serde::json::Json, State};

#[get("/users")]
pub fn get_users(db: &State<MongoRep>, viewer: Viewer) -> Result<Json<Vec<UserRead>>, ApiError> {
    let users = db.list_users()?;
    Ok(Json(user_reads(db, viewer.id(), users)?))
}

#[get("/users/me")]
pub fn get_me(db: &State<MongoRep>, user: AuthUser) -> Result<Json<UserRead>, ApiError> {
    let AuthUser(me) = user;
    let id = me.id;
    let mut reads = user_reads(db, Some(id), vec![me])?;
    reads.pop().map(Json).ok_or(ApiError::NotFound("user"))
}

#[get("/users/<id>")]
pub fn get_user(db: &State<MongoRep>, viewer: Viewer, id: i64) -> Result<Json<UserRead>, ApiError> {
    let user = db.get_user(id)?;
    let mut reads = user_reads(db, viewer.id(), vec![user])?;
    reads.pop().map(Json).ok_or(ApiError::NotFound("user"))
}

#[get("/users/subscriptions?<recipes_limit>")]
pub fn get_subscriptions(
    db: &State<MongoRep>,
    user: AuthUser,
    recipes_limit: Option<String>,
) -> Result<Json<Vec<SubscriptionRead>>, ApiError> {
    let recipes_limit = query_param("recipes_limit", recipes_limit.as_deref())?;
    let authors = db.get_users_by_id(&db.followed_author_ids(user.0.id)?)?;
    Ok(Json(subscription_reads(
        db,
        user.0.id,
        authors,
        recipes_limit,
    )?))
}

#[post("/users/<id>/subscribe?<recipes_limit>")]
pub fn subscribe(
    db: &State<MongoRep>,
    user: AuthUser,
    id: i64,
    recipes_limit: Option<String>,
) -> Result<Created<Json<SubscriptionRead>>, ApiError> {
    let recipes_limit = query_param("recipes_limit", recipes_limit.as_deref())?;
    let author = db.get_user(id)?;
    db.follow(user.0.id, author.id)?;
    let mut reads = subscription_reads(db, user.0.id, vec![author], recipes_limit)?;
    let read = reads.pop().ok_or(ApiError::NotFound("user"))?;
    Ok(Created::new(format!("/api/users/{id}")).body(Json(read)))
}

#[delete("/users/<id>/subscribe")]
pub fn unsubscribe(db: &State<MongoRep>, user: AuthUser, id: i64) -> Result<Status, ApiError> {
    let author = db.get_user(id)?;
    db.unfollow(user.0.id, author.id)?;
    Ok(Status::NoContent)
}
