//! Recipe metadata and the catalog that backs result presentation.
//!
//! Recipes come from the allrecipes JSON dump: an array of objects whose
//! position matches the embedding id. Only the fields used for search text and
//! presentation are kept. The index never reads this data.

use crate::config::{EMBED_MAX_INGREDIENTS, EMBED_TEXT_MAX_CHARS};
use crate::error::Result;
use crate::pipeline::MetadataSource;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A recipe record. `id` falls back to the record's position when the dump has none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl Recipe {
    /// Text handed to the embedding model: title, description and the first
    /// ingredients, truncated to the model's input budget.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if !self.title.is_empty() {
            parts.push(self.title.clone());
        }
        if let Some(desc) = self.description.as_deref().filter(|d| !d.is_empty()) {
            parts.push(desc.to_string());
        }
        if !self.ingredients.is_empty() {
            let listed: Vec<&str> = self
                .ingredients
                .iter()
                .take(EMBED_MAX_INGREDIENTS)
                .map(String::as_str)
                .collect();
            parts.push(format!("Ingredients: {}", listed.join(", ")));
        }
        parts.join(" ").chars().take(EMBED_TEXT_MAX_CHARS).collect()
    }
}

// The dump is loosely typed: ids and ratings show up as numbers or strings.
fn de_opt_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Recipes indexed by embedding id.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    pub fn new(mut recipes: Vec<Recipe>) -> Self {
        for (i, recipe) in recipes.iter_mut().enumerate() {
            if recipe.id.is_none() {
                recipe.id = Some(i.to_string());
            }
        }
        Self { recipes }
    }

    /// Parses a JSON array of recipe objects.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let recipes: Vec<Recipe> = serde_json::from_slice(bytes)?;
        Ok(Self::new(recipes))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let catalog = Self::from_json_slice(&fs::read(path)?)?;
        tracing::info!("Loaded {} recipes from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Recipe> {
        self.recipes.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> + '_ {
        self.recipes.iter()
    }
}

impl MetadataSource for RecipeCatalog {
    type Record = Recipe;

    fn metadata(&self, id: u32) -> Option<Recipe> {
        self.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const DUMP: &str = r#"[
        {"id": "10813", "title": "Best Brownies", "description": "Fudgy.", "rating": "4.6",
         "ingredients": ["1/2 cup butter", "1 cup sugar"]},
        {"title": "Plain Toast", "rating": 3},
        {"id": 42, "title": "Soup", "description": "", "ingredients": [], "extra": true}
    ]"#;

    #[test]
    fn test_parse_loose_fields() {
        let catalog = RecipeCatalog::from_json_slice(DUMP.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);

        let brownies = catalog.get(0).unwrap();
        assert_eq!(brownies.id.as_deref(), Some("10813"));
        assert_eq!(brownies.rating, Some(4.6));

        let toast = catalog.get(1).unwrap();
        assert_eq!(toast.id.as_deref(), Some("1"), "positional id fallback");
        assert_eq!(toast.rating, Some(3.0));
        assert_eq!(toast.description, None);

        assert_eq!(catalog.get(2).unwrap().id.as_deref(), Some("42"));
        assert!(catalog.get(3).is_none());
    }

    #[test]
    fn test_search_text() {
        let catalog = RecipeCatalog::from_json_slice(DUMP.as_bytes()).unwrap();
        assert_eq!(
            catalog.get(0).unwrap().search_text(),
            "Best Brownies Fudgy. Ingredients: 1/2 cup butter, 1 cup sugar"
        );
        assert_eq!(catalog.get(2).unwrap().search_text(), "Soup");
    }

    #[test]
    fn test_search_text_limits() {
        let recipe = Recipe {
            id: None,
            title: "x".repeat(3000),
            description: None,
            rating: None,
            ingredients: (0..20).map(|i| format!("item{i}")).collect(),
        };
        assert_eq!(recipe.search_text().chars().count(), EMBED_TEXT_MAX_CHARS);

        let short = Recipe {
            title: "Salad".into(),
            ..recipe
        };
        let text = short.search_text();
        assert!(text.contains("item9"));
        assert!(!text.contains("item10"));
    }

    #[test]
    fn test_invalid_json() {
        let err = RecipeCatalog::from_json_slice(b"{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedCatalog(_)), "got {err:?}");
        assert!(err.to_string().starts_with("malformed recipe catalog"));

        // An object instead of an array is a shape error, not I/O
        assert!(matches!(
            RecipeCatalog::from_json_slice(br#"{"title": "Soup"}"#),
            Err(Error::MalformedCatalog(_))
        ));
    }

    #[test]
    fn test_load_reports_parse_and_io_separately() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("recipes.json");
        std::fs::write(&bad, "[{\"title\": ").unwrap();
        assert!(matches!(
            RecipeCatalog::load(&bad),
            Err(Error::MalformedCatalog(_))
        ));
        assert!(matches!(
            RecipeCatalog::load(&dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
