//! The free-form label used to group ledger records.

use std::{fmt::Display, str::FromStr};

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::ValidationError;

/// A validated, non-empty category label, e.g. "餐饮" or "Groceries".
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// The maximum length of a category in user-perceived characters.
    pub const MAX_LENGTH: usize = 50;

    /// Create a category from `name` with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [ValidationError::EmptyCategory] if `name` is empty after trimming,
    /// - or [ValidationError::CategoryTooLong] if `name` has more than
    ///   [Category::MAX_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(ValidationError::EmptyCategory);
        }

        let length = name.graphemes(true).count();
        if length > Self::MAX_LENGTH {
            return Err(ValidationError::CategoryTooLong {
                length,
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(name.to_owned()))
    }

    /// Create a category without validation.
    ///
    /// The caller should ensure that the string is not empty, e.g. because it
    /// was read back from the database.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::new(s)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::ValidationError;

    use super::Category;

    #[test]
    fn trims_whitespace() {
        let category = Category::new("  餐饮 ").unwrap();

        assert_eq!(category.as_ref(), "餐饮");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(Category::new(""), Err(ValidationError::EmptyCategory));
        assert_eq!(Category::new(" \t "), Err(ValidationError::EmptyCategory));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let name = "饭".repeat(Category::MAX_LENGTH);

        assert!(Category::new(&name).is_ok());
    }

    #[test]
    fn rejects_long_names() {
        let name = "a".repeat(Category::MAX_LENGTH + 1);

        assert_eq!(
            Category::new(&name),
            Err(ValidationError::CategoryTooLong {
                length: Category::MAX_LENGTH + 1,
                max: Category::MAX_LENGTH
            })
        );
    }
}
