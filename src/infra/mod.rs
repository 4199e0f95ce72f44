pub mod auth;
pub mod error;
pub mod images;
pub mod mongo;
pub mod payloads;
pub mod read_model;
pub mod routes;
pub mod shopping;
pub mod validation;

pub use images::MediaStore;
pub use mongo::MongoRep;
pub use routes::*;
