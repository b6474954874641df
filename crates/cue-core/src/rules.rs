//! Static per-category policy rules
//!
//! These are fixed configuration, not runtime state. User-facing
//! toggles and volume caps live in [`crate::types::NotificationSettings`].

use crate::types::Category;

/// Policy rule for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    /// Minimum whole days between notifications matching the same
    /// metadata; 0 disables the cooldown check.
    pub cooldown_days: i64,
    /// Lifetime cap on notifications per physical item, if any
    pub max_per_item: Option<i64>,
    /// Whether this category always sends at critical priority
    pub always_critical: bool,
}

/// Look up the rule for a category
pub fn rule_for(category: Category) -> CategoryRule {
    match category {
        Category::ReceiptReady => CategoryRule {
            cooldown_days: 0,
            max_per_item: None,
            always_critical: true,
        },
        // One reminder per occurrence; the idempotency key dedupes.
        Category::Lessons => CategoryRule {
            cooldown_days: 0,
            max_per_item: None,
            always_critical: false,
        },
        Category::GearEnrichment => CategoryRule {
            cooldown_days: 3,
            max_per_item: None,
            always_critical: false,
        },
        Category::Warranty => CategoryRule {
            cooldown_days: 7,
            max_per_item: Some(2),
            always_critical: false,
        },
        Category::Maintenance => CategoryRule {
            cooldown_days: 60,
            max_per_item: None,
            always_critical: false,
        },
        Category::Reengagement => CategoryRule {
            cooldown_days: 21,
            max_per_item: None,
            always_critical: false,
        },
        Category::Service => CategoryRule {
            cooldown_days: 1,
            max_per_item: None,
            always_critical: false,
        },
    }
}
