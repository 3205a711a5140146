//! Category tree records.
//!
//! Categories are three levels deep: category, subcategory, third category.
//! The backend has stored the lower levels both as plain strings and as
//! `{ "name": .. }` objects over time; both shapes decode.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::CategoryId;

/// A second-level category and its third-level names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub name: String,
    pub third_categories: Vec<String>,
}

impl Subcategory {
    /// A subcategory with no third-level entries.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            third_categories: Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for Subcategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Name(String),
            Full {
                name: String,
                #[serde(
                    default,
                    alias = "thirdCategories",
                    alias = "thirdCategory",
                    alias = "third_category",
                    deserialize_with = "names"
                )]
                third_categories: Vec<String>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Name(name) => Self::new(name),
            Raw::Full {
                name,
                third_categories,
            } => Self {
                name,
                third_categories,
            },
        })
    }
}

/// A top-level category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default, alias = "subCategories", alias = "subcategory")]
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    /// Find a subcategory by name (case-insensitive).
    #[must_use]
    pub fn subcategory(&self, name: &str) -> Option<&Subcategory> {
        self.subcategories
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// Fields sent when creating or updating a category.
///
/// The backend replaces the whole subcategory tree on update, so admin edits
/// start from the current category and send the full draft back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    pub subcategories: Vec<Subcategory>,
}

impl CategoryDraft {
    /// A new category with no subcategories.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            subcategories: Vec::new(),
        }
    }

    /// Append a subcategory. Returns `false` for blank or duplicate names.
    pub fn add_subcategory(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty()
            || self
                .subcategories
                .iter()
                .any(|s| s.name.eq_ignore_ascii_case(name))
        {
            return false;
        }
        self.subcategories.push(Subcategory::new(name));
        true
    }

    /// Append a third category under `subcategory`.
    ///
    /// Returns `false` when the subcategory does not exist or the name is
    /// blank or already present.
    pub fn add_third(&mut self, subcategory: &str, name: &str) -> bool {
        let name = name.trim();
        let Some(sub) = self
            .subcategories
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(subcategory.trim()))
        else {
            return false;
        };
        if name.is_empty() || sub.third_categories.iter().any(|t| t.eq_ignore_ascii_case(name)) {
            return false;
        }
        sub.third_categories.push(name.to_owned());
        true
    }
}

impl From<&Category> for CategoryDraft {
    fn from(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            subcategories: category.subcategories.clone(),
        }
    }
}

/// Find a category by name (case-insensitive).
#[must_use]
pub fn find_category<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Decode a list whose entries are strings or `{ "name": .. }` objects.
fn names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Name(String),
        Named { name: String },
    }

    let entries = Vec::<Entry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|e| match e {
            Entry::Name(name) | Entry::Named { name } => name,
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_mixed_shapes() {
        let category: Category = serde_json::from_str(
            r#"{
                "_id": "c1",
                "name": "Clothing",
                "subCategories": [
                    "Accessories",
                    {"name": "Tops", "thirdCategories": ["T-Shirts", {"name": "Hoodies"}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(category.subcategories.len(), 2);
        assert!(category.subcategories[0].third_categories.is_empty());
        assert_eq!(
            category.subcategory("tops").unwrap().third_categories,
            vec!["T-Shirts", "Hoodies"]
        );
    }

    #[test]
    fn test_find_category_case_insensitive() {
        let categories: Vec<Category> =
            serde_json::from_str(r#"[{"id":"1","name":"Food"},{"id":"2","name":"Drinks"}]"#)
                .unwrap();
        assert_eq!(find_category(&categories, "drinks").unwrap().id.as_str(), "2");
        assert!(find_category(&categories, "Toys").is_none());
    }

    #[test]
    fn test_draft_edits() {
        let mut draft = CategoryDraft::new(" Food ");
        assert_eq!(draft.name, "Food");
        assert!(draft.add_subcategory("Indian"));
        assert!(!draft.add_subcategory("indian"));
        assert!(!draft.add_subcategory("  "));
        assert!(draft.add_third("Indian", "Thali"));
        assert!(!draft.add_third("Indian", "THALI"));
        assert!(!draft.add_third("Chinese", "Noodles"));

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["subcategories"][0]["thirdCategories"][0], "Thali");
    }
}
