use rocket::figment::Figment;
use serde::Deserialize;

/// Application settings read from `Rocket.toml` or `ROCKET_*` variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub mongo_uri: String,
    pub database: String,
    pub media_root: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mongo_uri: "mongodb://localhost:27017/".to_string(),
            database: "foodgram".to_string(),
            media_root: "media".to_string(),
        }
    }
}

impl Config {
    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::figment::providers::{Format, Toml};

    #[test]
    fn test_defaults_when_unset() {
        let figment = Figment::new();
        assert_eq!(Config::from_figment(&figment).unwrap(), Config::default());
    }

    #[test]
    fn test_values_override_defaults() {
        let figment = Figment::new().merge(Toml::string(
            r#"
            mongo_uri = "mongodb://db:27017/"
            database = "foodgram_staging"
            "#,
        ));
        let config = Config::from_figment(&figment).unwrap();
        assert_eq!(config.mongo_uri, "mongodb://db:27017/");
        assert_eq!(config.database, "foodgram_staging");
        assert_eq!(config.media_root, "media");
    }
}
