use super::api::{collect, MongoRep, MongoRepError};
use super::types::{Token, User};
use mongodb::{bson::doc, options::FindOptions, sync::Collection};

/// Owned handle on the collections needed to resolve a token, so the lookup
/// can be moved onto a blocking thread.
#[derive(Clone)]
pub struct TokenLookup {
    users: Collection<User>,
    tokens: Collection<Token>,
}

impl TokenLookup {
    /// Owner of an access token, `None` for unknown keys.
    pub fn user_by_token(&self, key: &str) -> Result<Option<User>, MongoRepError> {
        match self.tokens.find_one(doc! {"key": key}, None)? {
            Some(token) => Ok(self.users.find_one(doc! {"_id": token.user_id}, None)?),
            None => Ok(None),
        }
    }
}

impl MongoRep {
    pub fn list_users(&self) -> Result<Vec<User>, MongoRepError> {
        let options = FindOptions::builder().sort(doc! {"username": 1}).build();
        collect(self.users.find(None, options)?)
    }

    pub fn get_user(&self, id: i64) -> Result<User, MongoRepError> {
        self.users
            .find_one(doc! {"_id": id}, None)?
            .ok_or(MongoRepError::NotFound("user"))
    }

    /// Users whose id is in `ids`, ordered by username.
    pub fn get_users_by_id(&self, ids: &[i64]) -> Result<Vec<User>, MongoRepError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let options = FindOptions::builder().sort(doc! {"username": 1}).build();
        collect(self.users.find(doc! {"_id": {"$in": ids}}, options)?)
    }

    pub fn token_lookup(&self) -> TokenLookup {
        TokenLookup {
            users: self.users.clone(),
            tokens: self.tokens.clone(),
        }
    }

    pub fn user_by_token(&self, key: &str) -> Result<Option<User>, MongoRepError> {
        self.token_lookup().user_by_token(key)
    }
}

/// Accounts and tokens are provisioned by the identity service in production.
#[cfg(test)]
impl MongoRep {
    pub(crate) fn insert_user(&self, username: &str) -> User {
        let user = User {
            id: self.next_id("users").unwrap(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        };
        self.users.insert_one(&user, None).unwrap();
        user
    }

    pub(crate) fn insert_token(&self, user: &User, key: &str) {
        self.tokens
            .insert_one(
                Token {
                    key: key.to_string(),
                    user_id: user.id,
                },
                None,
            )
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::super::api::tests::fresh_repo;

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_user_by_token() {
        let rep = fresh_repo("foodgram_test_users");
        let alice = rep.insert_user("alice");
        rep.insert_token(&alice, "secret");
        assert_eq!(rep.user_by_token("secret").unwrap(), Some(alice));
        assert_eq!(rep.user_by_token("nope").unwrap(), None);
    }

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_token_lookup_runs_on_another_thread() {
        let rep = fresh_repo("foodgram_test_token_lookup");
        let bob = rep.insert_user("bob");
        rep.insert_token(&bob, "bob-key");
        let lookup = rep.token_lookup();
        let found = std::thread::spawn(move || lookup.user_by_token("bob-key"))
            .join()
            .unwrap()
            .unwrap();
        assert_eq!(found, Some(bob));
    }

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_list_users_sorted_by_username() {
        let rep = fresh_repo("foodgram_test_user_list");
        rep.insert_user("zoe");
        rep.insert_user("adam");
        let names: Vec<_> = rep
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["adam", "zoe"]);
    }
}
