//! Client-side narrowing of a tour list.
//!
//! The catalogue screen fetches every tour once and narrows it locally by
//! free text, category and price range, so changing a filter never costs a
//! request.

use crate::api::types::Tour;

/// The pseudo-category that matches every tour.
pub const ALL_CATEGORIES: &str = "Все";

/// Categories offered by the catalogue, [`ALL_CATEGORIES`] first.
pub const CATEGORIES: [&str; 5] = [
    ALL_CATEGORIES,
    "Гастрономический",
    "Винный",
    "Мастер-класс",
    "Фермерский",
];

/// Lower bound of the default price range.
pub const DEFAULT_MIN_PRICE: f64 = 0.0;

/// Upper bound of the default price range.
pub const DEFAULT_MAX_PRICE: f64 = 10_000.0;

/// An inclusive price range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Create a range, swapping the bounds if they are reversed.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Check whether `price` lies within `[min, max]`.
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PRICE, DEFAULT_MAX_PRICE)
    }
}

/// The catalogue filter state.
#[derive(Debug, Clone, PartialEq)]
pub struct TourQuery {
    /// Free text matched against title and description, case-insensitively.
    pub search: String,
    /// A category name, or [`ALL_CATEGORIES`].
    pub category: String,
    /// Inclusive price bounds.
    pub price: PriceRange,
}

impl Default for TourQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: ALL_CATEGORIES.to_string(),
            price: PriceRange::default(),
        }
    }
}

impl TourQuery {
    /// A query that matches every tour.
    ///
    /// Unlike [`TourQuery::default`], the price range is unbounded.
    pub fn everything() -> Self {
        Self {
            price: PriceRange::new(f64::NEG_INFINITY, f64::INFINITY),
            ..Self::default()
        }
    }

    /// Restrict to free-text matches.
    pub fn search(mut self, text: &str) -> Self {
        self.search = text.to_string();
        self
    }

    /// Restrict to one category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Restrict to an inclusive price range.
    pub fn price(mut self, min: f64, max: f64) -> Self {
        self.price = PriceRange::new(min, max);
        self
    }

    /// Check whether a tour passes every criterion.
    pub fn matches(&self, tour: &Tour) -> bool {
        self.matches_search(tour) && self.matches_category(tour) && self.price.contains(tour.price)
    }

    fn matches_search(&self, tour: &Tour) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        tour.title.to_lowercase().contains(&needle)
            || tour.description.to_lowercase().contains(&needle)
    }

    fn matches_category(&self, tour: &Tour) -> bool {
        self.category == ALL_CATEGORIES || tour.category.as_deref() == Some(self.category.as_str())
    }

    /// Narrow `tours` to the matching entries, keeping their order.
    pub fn apply<'a>(&self, tours: &'a [Tour]) -> Vec<&'a Tour> {
        tours.iter().filter(|tour| self.matches(tour)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_tours;

    fn ids(tours: &[&Tour]) -> Vec<i64> {
        tours.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_all_category_returns_full_list() {
        let tours = sample_tours();
        let query = TourQuery::default().category(ALL_CATEGORIES);
        assert_eq!(query.apply(&tours).len(), tours.len());
    }

    #[test]
    fn test_specific_category_returns_only_matches() {
        let tours = sample_tours();
        let found = TourQuery::default().category("Винный").apply(&tours);
        assert_eq!(ids(&found), vec![2]);
        assert!(found
            .iter()
            .all(|t| t.category.as_deref() == Some("Винный")));
    }

    #[test]
    fn test_unknown_category_returns_nothing() {
        let tours = sample_tours();
        assert!(TourQuery::default().category("Морской").apply(&tours).is_empty());
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let tours = sample_tours();
        // Bounds sit exactly on tours 3 (3000) and 1 (5000).
        let found = TourQuery::default().price(3000.0, 5000.0).apply(&tours);
        assert_eq!(ids(&found), vec![1, 3]);
    }

    #[test]
    fn test_price_range_excludes_outside() {
        let tours = sample_tours();
        let found = TourQuery::default().price(3000.01, 4999.99).apply(&tours);
        assert!(found.is_empty());
    }

    #[test]
    fn test_default_range_includes_upper_bound() {
        let tours = sample_tours();
        // Tour 4 costs exactly 10000.
        let found = TourQuery::default().apply(&tours);
        assert!(ids(&found).contains(&4));
    }

    #[test]
    fn test_reversed_bounds_are_swapped() {
        assert_eq!(PriceRange::new(9.0, 1.0), PriceRange::new(1.0, 9.0));
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_description() {
        let tours = sample_tours();
        assert_eq!(ids(&TourQuery::default().search("КРЫМ").apply(&tours)), vec![2]);
        assert_eq!(
            ids(&TourQuery::default().search("шеф-повар").apply(&tours)),
            vec![3]
        );
    }

    #[test]
    fn test_criteria_combine() {
        let tours = sample_tours();
        let found = TourQuery::default()
            .search("тур")
            .category("Гастрономический")
            .price(0.0, 6000.0)
            .apply(&tours);
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn test_everything_has_no_price_limit() {
        let mut tours = sample_tours();
        tours[0].price = 1_000_000.0;
        assert_eq!(TourQuery::everything().apply(&tours).len(), tours.len());
    }

    #[test]
    fn test_category_list_starts_with_all() {
        assert_eq!(CATEGORIES[0], ALL_CATEGORIES);
    }
}
