//! Core category domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// A validated, non-empty category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// empty or only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for a category.
pub type CategoryId = i64;

/// The name shown for transactions without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A category for grouping transactions (e.g., 'Groceries', 'Salary').
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: CategoryName,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

/// Request body for creating and renaming categories.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

#[cfg(test)]
mod category_name_tests {
    use crate::Error;

    use super::CategoryName;

    #[test]
    fn new_fails_on_empty_string() {
        let category_name = CategoryName::new("");

        assert_eq!(category_name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        let category_name = CategoryName::new("\n\t \r");

        assert_eq!(category_name, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_whitespace() {
        let category_name = CategoryName::new("  Groceries ");

        assert_eq!(category_name, Ok(CategoryName::new_unchecked("Groceries")));
    }
}
