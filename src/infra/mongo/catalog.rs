use super::api::{collect, MongoRep, MongoRepError};
use super::types::{Ingredient, Tag};
use crate::infra::payloads::{IngredientPatch, IngredientWrite, TagPatch, TagWrite};
use log::info;
use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
};

/// Case-insensitive substring match on `name`.
fn name_contains(fragment: &str) -> Document {
    doc! {"name": {"$regex": regex::escape(fragment), "$options": "i"}}
}

impl MongoRep {
    pub fn list_ingredients(&self, name: Option<&str>) -> Result<Vec<Ingredient>, MongoRepError> {
        let filter = name.filter(|n| !n.is_empty()).map(name_contains);
        let options = FindOptions::builder().sort(doc! {"name": 1, "_id": 1}).build();
        collect(self.ingredients.find(filter, options)?)
    }

    pub fn get_ingredient(&self, id: i64) -> Result<Ingredient, MongoRepError> {
        self.ingredients
            .find_one(doc! {"_id": id}, None)?
            .ok_or(MongoRepError::NotFound("ingredient"))
    }

    /// Ingredients whose id is in `ids`. Unknown ids are silently absent from the result.
    pub fn get_ingredients_by_id(&self, ids: &[i64]) -> Result<Vec<Ingredient>, MongoRepError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        collect(self.ingredients.find(doc! {"_id": {"$in": ids}}, None)?)
    }

    pub fn create_ingredient(&self, new: IngredientWrite) -> Result<Ingredient, MongoRepError> {
        let ingredient = Ingredient {
            id: self.next_id("ingredients")?,
            name: new.name,
            measurement_unit: new.measurement_unit,
        };
        self.ingredients.insert_one(&ingredient, None)?;
        info!("created ingredient {} ({})", ingredient.id, ingredient.name);
        Ok(ingredient)
    }

    pub fn update_ingredient(
        &self,
        id: i64,
        patch: IngredientPatch,
    ) -> Result<Ingredient, MongoRepError> {
        let mut ingredient = self.get_ingredient(id)?;
        if let Some(name) = patch.name {
            ingredient.name = name;
        }
        if let Some(unit) = patch.measurement_unit {
            ingredient.measurement_unit = unit;
        }
        self.ingredients
            .replace_one(doc! {"_id": id}, &ingredient, None)?;
        Ok(ingredient)
    }

    /// Deletes the ingredient and every recipe association pointing at it.
    pub fn delete_ingredient(&self, id: i64) -> Result<(), MongoRepError> {
        let deleted = self.ingredients.delete_one(doc! {"_id": id}, None)?;
        if deleted.deleted_count == 0 {
            return Err(MongoRepError::NotFound("ingredient"));
        }
        self.recipe_ingredients
            .delete_many(doc! {"ingredient_id": id}, None)?;
        info!("deleted ingredient {id}");
        Ok(())
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>, MongoRepError> {
        let options = FindOptions::builder().sort(doc! {"_id": 1}).build();
        collect(self.tags.find(None, options)?)
    }

    pub fn get_tag(&self, id: i64) -> Result<Tag, MongoRepError> {
        self.tags
            .find_one(doc! {"_id": id}, None)?
            .ok_or(MongoRepError::NotFound("tag"))
    }

    pub fn get_tags_by_id(&self, ids: &[i64]) -> Result<Vec<Tag>, MongoRepError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        collect(self.tags.find(doc! {"_id": {"$in": ids}}, None)?)
    }

    pub fn get_tags_by_slug(&self, slugs: &[String]) -> Result<Vec<Tag>, MongoRepError> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }
        collect(self.tags.find(doc! {"slug": {"$in": slugs}}, None)?)
    }

    pub fn create_tag(&self, new: TagWrite) -> Result<Tag, MongoRepError> {
        let tag = Tag {
            id: self.next_id("tags")?,
            name: new.name,
            color: new.color,
            slug: new.slug,
        };
        self.tags
            .insert_one(&tag, None)
            .map_err(MongoRepError::on_duplicate(
                "a tag with this name, color or slug already exists",
            ))?;
        info!("created tag {} ({})", tag.id, tag.slug);
        Ok(tag)
    }

    pub fn update_tag(&self, id: i64, patch: TagPatch) -> Result<Tag, MongoRepError> {
        let mut tag = self.get_tag(id)?;
        if let Some(name) = patch.name {
            tag.name = name;
        }
        if let Some(color) = patch.color {
            tag.color = color;
        }
        if let Some(slug) = patch.slug {
            tag.slug = slug;
        }
        self.tags
            .replace_one(doc! {"_id": id}, &tag, None)
            .map_err(MongoRepError::on_duplicate(
                "a tag with this name, color or slug already exists",
            ))?;
        Ok(tag)
    }

    pub fn delete_tag(&self, id: i64) -> Result<(), MongoRepError> {
        let deleted = self.tags.delete_one(doc! {"_id": id}, None)?;
        if deleted.deleted_count == 0 {
            return Err(MongoRepError::NotFound("tag"));
        }
        self.recipe_tags.delete_many(doc! {"tag_id": id}, None)?;
        info!("deleted tag {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::api::tests::fresh_repo;
    use super::*;

    fn tag(name: &str, color: &str, slug: &str) -> TagWrite {
        TagWrite {
            name: name.to_string(),
            color: color.to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn test_name_contains_escapes_regex() {
        assert_eq!(
            name_contains("a.b"),
            doc! {"name": {"$regex": "a\\.b", "$options": "i"}}
        );
    }

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_list_ingredients_filters_by_name_case_insensitively() {
        let rep = fresh_repo("foodgram_test_ingredients");
        for (name, unit) in [("Salt", "g"), ("Sea salt", "g"), ("Pepper", "pinch")] {
            rep.create_ingredient(IngredientWrite {
                name: name.to_string(),
                measurement_unit: unit.to_string(),
            })
            .unwrap();
        }
        let found = rep.list_ingredients(Some("SALT")).unwrap();
        let names: Vec<_> = found.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Salt", "Sea salt"]);
        assert_eq!(rep.list_ingredients(None).unwrap().len(), 3);
    }

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_create_tag_rejects_duplicate_slug() {
        let rep = fresh_repo("foodgram_test_tags");
        rep.create_tag(tag("Breakfast", "#FF0000", "breakfast")).unwrap();
        let err = rep
            .create_tag(tag("Morning", "#00FF00", "breakfast"))
            .unwrap_err();
        assert!(matches!(err, MongoRepError::Duplicate(_)));
    }

    #[test]
    #[ignore = "needs MongoDB on localhost:27017"]
    fn test_get_tag_missing() {
        let rep = fresh_repo("foodgram_test_tags_missing");
        assert!(matches!(rep.get_tag(42), Err(MongoRepError::NotFound("tag"))));
    }
}
