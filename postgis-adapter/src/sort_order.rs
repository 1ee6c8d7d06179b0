use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Direction of a finder's `ORDER BY` clause.
///
/// # Usage
/// ```text
/// let cities = adapter.finder::<City>().by_area(SortOrder::Descending)?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Smallest measurement first
    #[default]
    Ascending,
    /// Largest measurement first
    Descending,
}

impl SortOrder {
    /// The SQL keyword, `ASC` or `DESC`.
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }

    pub fn reverse(&self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
        assert_eq!(SortOrder::Ascending.to_string(), "ASC");
        assert_eq!(SortOrder::Ascending.reverse(), SortOrder::Descending);
        assert_eq!(SortOrder::Descending.keyword(), "DESC");
    }
}
