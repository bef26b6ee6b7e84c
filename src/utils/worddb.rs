use std::fs;
use std::path::Path;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::roles::SPY_ROLE;

/// One named list of candidate secret words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub words: Vec<String>,
}

#[derive(Debug, Error)]
pub enum WordDbError {
    #[error("reading word file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing word file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("word file contains no categories")]
    Empty,
    #[error("category '{0}' has no words")]
    EmptyCategory(String),
    #[error("category '{0}' uses the reserved word 'Spion'")]
    ReservedWord(String),
    #[error("category '{0}' is defined twice")]
    Duplicate(String),
}

/// Immutable word database - loaded once at startup
/// Order is kept so a random category pick covers every entry equally
#[derive(Debug, Clone)]
pub struct WordDb {
    categories: Vec<Category>,
}

impl WordDb {
    /// Load the built-in reference categories
    pub fn load() -> Self {
        let builtin: [(&str, &[&str]); 5] = [
            ("Geografie", &["Äquator", "Insel", "Fluss", "Gebirge", "Wüste"]),
            ("Geschichte", &["Römisches Reich", "Mittelalter", "Revolution", "Pyramiden"]),
            ("Anime", &["Naruto", "Goku", "Luffy", "Titan"]),
            ("Filme und Serien", &["Harry Potter", "Frodo", "Breaking Bad"]),
            ("Bekannte Persönlichkeiten", &["Einstein", "Newton", "Tesla"]),
        ];

        let categories = builtin
            .iter()
            .map(|(name, words)| Category {
                name: name.to_string(),
                words: words.iter().map(|w| w.to_string()).collect(),
            })
            .collect();

        Self { categories }
    }

    /// Load categories from a JSON file: `[{"name": .., "words": [..]}, ..]`
    pub fn from_path(path: &Path) -> Result<Self, WordDbError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, WordDbError> {
        let categories: Vec<Category> = serde_json::from_str(text)?;
        Self::from_categories(categories)
    }

    pub fn from_categories(categories: Vec<Category>) -> Result<Self, WordDbError> {
        if categories.is_empty() {
            return Err(WordDbError::Empty);
        }
        for (idx, category) in categories.iter().enumerate() {
            if category.words.is_empty() {
                return Err(WordDbError::EmptyCategory(category.name.clone()));
            }
            if category.words.iter().any(|w| w == SPY_ROLE) {
                return Err(WordDbError::ReservedWord(category.name.clone()));
            }
            if categories[..idx].iter().any(|c| c.name == category.name) {
                return Err(WordDbError::Duplicate(category.name.clone()));
            }
        }
        Ok(Self { categories })
    }

    /// Get category by name
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Uniform pick over all categories
    pub fn random_category<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Category> {
        self.categories.choose(rng)
    }
}

impl Category {
    /// Uniform pick over the category's words
    pub fn random_word<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.words.choose(rng).map(String::as_str)
    }
}
