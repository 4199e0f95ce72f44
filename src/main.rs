#[macro_use]
extern crate rocket;

mod config;
mod infra;

use config::Config;
use dotenv::dotenv;
use infra::images::MEDIA_URL;
use infra::*;
use log::{error, info};
use rocket::fairing::{self, AdHoc, Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::{Build, Request, Response, Rocket};

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "Attaching CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/// Routes, catchers and CORS. State is managed separately.
fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api", api_routes())
        .register(
            "/",
            catchers![default_catcher, unauthorized, not_found, unprocessable],
        )
        .attach(CORS)
}

/// Connects the repository, ensures indexes and serves the media directory.
async fn connect(rocket: Rocket<Build>) -> fairing::Result {
    let config = match Config::from_figment(rocket.figment()) {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            return Err(rocket);
        }
    };
    let db = match MongoRep::init(&config.mongo_uri, &config.database) {
        Ok(db) => db,
        Err(e) => {
            error!("cannot reach MongoDB at {}: {e:?}", config.mongo_uri);
            return Err(rocket);
        }
    };
    if let Err(e) = db.ensure_indexes() {
        error!("cannot create indexes in {}: {e:?}", config.database);
        return Err(rocket);
    }
    if let Err(e) = std::fs::create_dir_all(&config.media_root) {
        error!("cannot create media root {}: {e}", config.media_root);
        return Err(rocket);
    }
    info!("using MongoDB database {}", config.database);
    Ok(rocket
        .manage(db)
        .manage(MediaStore::new(&config.media_root))
        .mount(MEDIA_URL, FileServer::from(&config.media_root)))
}

#[launch]
fn rocket() -> _ {
    dotenv().ok();
    mount(rocket::build()).attach(AdHoc::try_on_ignite("MongoDB repository", connect))
}
