//! Cascading category selector state.
//!
//! Three dependent choices: category, then subcategory, then third category.
//! Changing an upstream choice resets everything below it.

use serde::{Deserialize, Serialize};

use crate::models::{Category, Subcategory, find_category};

/// Current picks in the category cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third: Option<String>,
}

/// Treat blank form values as "nothing selected".
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

impl CategorySelection {
    /// Build a selection from raw query values, without validation.
    #[must_use]
    pub fn from_parts(
        category: Option<&str>,
        subcategory: Option<&str>,
        third: Option<&str>,
    ) -> Self {
        Self {
            category: non_blank(category),
            subcategory: non_blank(subcategory),
            third: non_blank(third),
        }
    }

    /// Pick a category. A different category clears the lower levels.
    pub fn select_category(&mut self, name: Option<&str>) {
        let name = non_blank(name);
        let same = match (&self.category, &name) {
            (Some(current), Some(new)) => current.eq_ignore_ascii_case(new),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.subcategory = None;
            self.third = None;
        }
        self.category = name;
    }

    /// Pick a subcategory. Always clears the third level unless unchanged.
    pub fn select_subcategory(&mut self, name: Option<&str>) {
        let name = non_blank(name);
        let same = match (&self.subcategory, &name) {
            (Some(current), Some(new)) => current.eq_ignore_ascii_case(new),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.third = None;
        }
        self.subcategory = name;
    }

    /// Pick a third-level category.
    pub fn select_third(&mut self, name: Option<&str>) {
        self.third = non_blank(name);
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.subcategory.is_none() && self.third.is_none()
    }

    /// Names of every top-level category.
    #[must_use]
    pub fn category_options(categories: &[Category]) -> Vec<String> {
        categories.iter().map(|c| c.name.clone()).collect()
    }

    fn selected_category<'a>(&self, categories: &'a [Category]) -> Option<&'a Category> {
        find_category(categories, self.category.as_deref()?)
    }

    fn selected_subcategory<'a>(&self, categories: &'a [Category]) -> Option<&'a Subcategory> {
        self.selected_category(categories)?
            .subcategory(self.subcategory.as_deref()?)
    }

    /// Subcategory names under the selected category.
    #[must_use]
    pub fn subcategory_options(&self, categories: &[Category]) -> Vec<String> {
        self.selected_category(categories)
            .map(|c| c.subcategories.iter().map(|s| s.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Third-level names under the selected subcategory.
    #[must_use]
    pub fn third_options(&self, categories: &[Category]) -> Vec<String> {
        self.selected_subcategory(categories)
            .map(|s| s.third_categories.clone())
            .unwrap_or_default()
    }

    /// Drop any pick that is not a child of the pick above it.
    #[must_use]
    pub fn normalized(mut self, categories: &[Category]) -> Self {
        if self.selected_category(categories).is_none() {
            return Self::default();
        }
        if self.subcategory.is_some() && self.selected_subcategory(categories).is_none() {
            self.subcategory = None;
            self.third = None;
            return self;
        }
        let thirds = self.third_options(categories);
        if let Some(third) = &self.third
            && !thirds.iter().any(|t| t.eq_ignore_ascii_case(third))
        {
            self.third = None;
        }
        self
    }
}
