use super::types::{
    Counter, Follow, Ingredient, Recipe, RecipeIngredient, RecipeTag, Tag, Token, User, UserRecipe,
};
use mongodb::{
    bson::{doc, Document},
    error::{Error as mongoError, ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    sync::{Client, Collection},
    IndexModel,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Server code reported when a write violates a unique index.
pub const DUPLICATE_KEY: i32 = 11000;

#[derive(Error, Debug)]
pub enum MongoRepError {
    #[error("error querying value")]
    QueryError(#[from] mongoError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Invalid(String),
    #[error("id sequence {0} could not be advanced")]
    SequenceUnavailable(String),
}

impl MongoRepError {
    /// Turns a unique index violation into `Duplicate(message)`, leaves other errors as queries.
    pub fn on_duplicate(message: impl Into<String>) -> impl FnOnce(mongoError) -> MongoRepError {
        let message = message.into();
        move |err| {
            if is_duplicate_key(&err) {
                MongoRepError::Duplicate(message)
            } else {
                MongoRepError::QueryError(err)
            }
        }
    }
}

pub fn is_duplicate_key(err: &mongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .map_or(false, |errors| errors.iter().any(|e| e.code == DUPLICATE_KEY)),
        _ => false,
    }
}

pub(crate) fn collect<T>(cursor: mongodb::sync::Cursor<T>) -> Result<Vec<T>, MongoRepError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    cursor
        .collect::<Result<Vec<T>, mongoError>>()
        .map_err(MongoRepError::from)
}

pub struct MongoRep {
    pub counters: Collection<Counter>,
    pub users: Collection<User>,
    pub tokens: Collection<Token>,
    pub ingredients: Collection<Ingredient>,
    pub tags: Collection<Tag>,
    pub recipes: Collection<Recipe>,
    pub recipe_ingredients: Collection<RecipeIngredient>,
    pub recipe_tags: Collection<RecipeTag>,
    pub favorites: Collection<UserRecipe>,
    pub shopping_carts: Collection<UserRecipe>,
    pub follows: Collection<Follow>,
}

impl MongoRep {
    /// Builds the repository. The driver connects lazily, so this only fails on a malformed uri.
    pub fn init(uri: &str, database: &str) -> Result<Self, MongoRepError> {
        let client = Client::with_uri_str(uri)?;
        let database = client.database(database);
        let rep = MongoRep {
            counters: database.collection("counters"),
            users: database.collection("users"),
            tokens: database.collection("tokens"),
            ingredients: database.collection("ingredients"),
            tags: database.collection("tags"),
            recipes: database.collection("recipes"),
            recipe_ingredients: database.collection("recipe_ingredients"),
            recipe_tags: database.collection("recipe_tags"),
            favorites: database.collection("favorites"),
            shopping_carts: database.collection("shopping_carts"),
            follows: database.collection("follows"),
        };
        Ok(rep)
    }

    pub fn ensure_indexes(&self) -> Result<(), MongoRepError> {
        unique(&self.users, doc! {"email": 1})?;
        unique(&self.users, doc! {"username": 1})?;
        unique(&self.tokens, doc! {"key": 1})?;
        unique(&self.tags, doc! {"name": 1})?;
        unique(&self.tags, doc! {"color": 1})?;
        unique(&self.tags, doc! {"slug": 1})?;
        unique(&self.recipes, doc! {"author": 1, "name": 1})?;
        unique(&self.favorites, doc! {"user_id": 1, "recipe_id": 1})?;
        unique(&self.shopping_carts, doc! {"user_id": 1, "recipe_id": 1})?;
        unique(&self.follows, doc! {"user_id": 1, "author_id": 1})?;
        plain(&self.recipe_ingredients, doc! {"recipe_id": 1})?;
        plain(&self.recipe_tags, doc! {"recipe_id": 1})?;
        Ok(())
    }

    /// Allocates the next integer id of `collection`.
    pub fn next_id(&self, collection: &str) -> Result<i64, MongoRepError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        match self.counters.find_one_and_update(
            doc! {"_id": collection},
            doc! {"$inc": {"seq": 1_i64}},
            options,
        )? {
            Some(counter) => Ok(counter.seq),
            None => Err(MongoRepError::SequenceUnavailable(collection.to_string())),
        }
    }
}

fn unique<T>(collection: &Collection<T>, keys: Document) -> Result<(), mongoError> {
    let options = IndexOptions::builder().unique(true).build();
    let model = IndexModel::builder().keys(keys).options(options).build();
    collection.create_index(model, None).map(|_| ())
}

fn plain<T>(collection: &Collection<T>, keys: Document) -> Result<(), mongoError> {
    let model = IndexModel::builder().keys(keys).build();
    collection.create_index(model, None).map(|_| ())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn init_repo(database: &str) -> MongoRep {
        let rep = MongoRep::init("mongodb://localhost:27017/", database).unwrap();
        rep.ensure_indexes().unwrap();
        rep
    }

    /// Drops every collection so each live test starts from an empty database.
    pub(crate) fn fresh_repo(database: &str) -> MongoRep {
        let client = Client::with_uri_str("mongodb://localhost:27017/").unwrap();
        client.database(database).drop(None).unwrap();
        init_repo(database)
    }

    #[test]
    fn test_init_mongo_repo_passes_without_server() {
        MongoRep::init("mongodb://localhost:27017/", "foodgram_test").unwrap();
    }

    #[test]
    fn test_init_mongo_repo_rejects_malformed_uri() {
        assert!(matches!(
            MongoRep::init("localhost", "foodgram_test"),
            Err(MongoRepError::QueryError(_))
        ));
    }

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_next_id_is_sequential() {
        let rep = fresh_repo("foodgram_test_counters");
        assert_eq!(rep.next_id("recipes").unwrap(), 1);
        assert_eq!(rep.next_id("recipes").unwrap(), 2);
        assert_eq!(rep.next_id("tags").unwrap(), 1);
    }

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_unique_index_violation_is_duplicate() {
        let rep = fresh_repo("foodgram_test_duplicates");
        let row = UserRecipe {
            user_id: 1,
            recipe_id: 1,
        };
        rep.favorites.insert_one(&row, None).unwrap();
        let err = rep.favorites.insert_one(&row, None).unwrap_err();
        assert!(is_duplicate_key(&err));
        let mapped = MongoRepError::on_duplicate("already there")(err);
        assert!(matches!(mapped, MongoRepError::Duplicate(m) if m == "already there"));
    }
}
