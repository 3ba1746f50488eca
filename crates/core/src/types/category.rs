//! Product categories.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a category name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown product category: {0}")]
pub struct CategoryError(pub String);

/// Catalog category assigned to every product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Electronics,
    Clothing,
    Books,
    HomeGarden,
    Sports,
    Beauty,
    Automotive,
    Toys,
    Food,
    Other,
}

impl ProductCategory {
    pub const ALL: [Self; 10] = [
        Self::Electronics,
        Self::Clothing,
        Self::Books,
        Self::HomeGarden,
        Self::Sports,
        Self::Beauty,
        Self::Automotive,
        Self::Toys,
        Self::Food,
        Self::Other,
    ];

    /// Wire name, e.g. `HOME_GARDEN`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Electronics => "ELECTRONICS",
            Self::Clothing => "CLOTHING",
            Self::Books => "BOOKS",
            Self::HomeGarden => "HOME_GARDEN",
            Self::Sports => "SPORTS",
            Self::Beauty => "BEAUTY",
            Self::Automotive => "AUTOMOTIVE",
            Self::Toys => "TOYS",
            Self::Food => "FOOD",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| CategoryError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_loose_spelling() {
        assert_eq!("home-garden".parse(), Ok(ProductCategory::HomeGarden));
        assert_eq!("Books".parse(), Ok(ProductCategory::Books));
        assert_eq!(
            "gadgets".parse::<ProductCategory>(),
            Err(CategoryError("gadgets".to_string()))
        );
    }

    #[test]
    fn test_display_matches_wire_name() {
        for category in ProductCategory::ALL {
            let json = serde_json::to_string(&category).unwrap_or_default();
            assert_eq!(json, format!("\"{category}\""));
        }
    }
}
