mod catalog;
mod recipes;
mod users;

pub use catalog::*;
pub use recipes::*;
pub use users::*;

use super::error::{error_body, ApiError};
use super::shopping::FILENAME;
use rocket::{
    http::{ContentType, Status},
    response::{self, Responder, Response},
    serde::json::{Json, Value},
    Request, Route,
};
use std::{io::Cursor, str::FromStr};

/// Boolean query flag accepting `1`/`0` as well as `true`/`false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1" | "true" | "True" => Ok(Flag(true)),
            "0" | "false" | "False" => Ok(Flag(false)),
            _ => Err(format!("expected 0, 1, true or false, got {value:?}")),
        }
    }
}

/// Parses an optional query value. Rocket drops unparseable `Option` fields
/// silently, so filters take raw strings and are parsed here.
pub fn query_param<T: FromStr>(name: &str, value: Option<&str>) -> Result<Option<T>, ApiError> {
    match value.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid value {raw:?} for {name}"))),
    }
}

/// Plain text shopping list served as a download.
pub struct ShoppingListFile(pub String);

impl<'r> Responder<'r, 'static> for ShoppingListFile {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(ContentType::new("application", "txt"))
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{FILENAME}\""),
            )
            .sized_body(self.0.len(), Cursor::new(self.0))
            .ok()
    }
}

pub fn api_routes() -> Vec<Route> {
    routes![
        get_ingredients,
        get_ingredient,
        create_ingredient,
        update_ingredient,
        delete_ingredient,
        get_tags,
        get_tag,
        create_tag,
        update_tag,
        delete_tag,
        get_recipes,
        get_recipe,
        create_recipe,
        update_recipe,
        delete_recipe,
        add_favorite,
        remove_favorite,
        add_to_shopping_cart,
        remove_from_shopping_cart,
        download_shopping_cart,
        get_users,
        get_me,
        get_user,
        get_subscriptions,
        subscribe,
        unsubscribe,
    ]
}

#[catch(default)]
pub fn default_catcher(status: Status, _: &Request) -> (Status, Json<Value>) {
    let message = status.reason().unwrap_or("request failed");
    (status, error_body(message.to_lowercase()))
}

#[catch(401)]
pub fn unauthorized() -> Json<Value> {
    error_body("authentication credentials were not provided or are invalid")
}

#[catch(404)]
pub fn not_found(req: &Request) -> Json<Value> {
    error_body(format!("{} does not exist", req.uri().path()))
}

#[catch(422)]
pub fn unprocessable(req: &Request) -> Json<Value> {
    error_body(format!("malformed request to {}", req.uri().path()))
}
