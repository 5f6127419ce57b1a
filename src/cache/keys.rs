//! Cache key definitions.
//!
//! Every cached read maps to exactly one `CacheKey`. The rendered form is the
//! literal string stored in the backend, so prefix purges work on it directly.

use std::fmt;

/// Identifies one cached read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// All menus with their counts.
    MenusList,
    /// One menu.
    Menu { menu_id: i64 },
    /// Submenus of a menu.
    SubmenuList { menu_id: i64 },
    /// One submenu.
    Submenu { menu_id: i64, submenu_id: i64 },
    /// Dishes of a submenu.
    DishList { menu_id: i64, submenu_id: i64 },
    /// One dish.
    Dish {
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    },
}

impl CacheKey {
    /// Low-cardinality label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheKey::MenusList => "menus_list",
            CacheKey::Menu { .. } => "menu",
            CacheKey::SubmenuList { .. } => "submenu_list",
            CacheKey::Submenu { .. } => "submenu",
            CacheKey::DishList { .. } => "dish_list",
            CacheKey::Dish { .. } => "dish",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::MenusList => f.write_str("menus_list"),
            CacheKey::Menu { menu_id } => write!(f, "menu_{menu_id}"),
            CacheKey::SubmenuList { menu_id } => write!(f, "submenu_{menu_id}"),
            CacheKey::Submenu {
                menu_id,
                submenu_id,
            } => write!(f, "submenu_{menu_id}_{submenu_id}"),
            CacheKey::DishList {
                menu_id,
                submenu_id,
            } => write!(f, "dish_{menu_id}_{submenu_id}"),
            CacheKey::Dish {
                menu_id,
                submenu_id,
                dish_id,
            } => write!(f, "dish_{menu_id}_{submenu_id}_{dish_id}"),
        }
    }
}

/// A literal key prefix used to purge descendants on cascading deletes.
///
/// Matching is purely textual: `submenu_1` also matches `submenu_12`. Purging a
/// sibling's entries is harmless, it only costs a later miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPrefix {
    /// `submenu_{m}`: the submenu list and every submenu of menu `m`.
    SubmenusOf { menu_id: i64 },
    /// `dish_{m}`: every dish list and dish under menu `m`.
    DishesOfMenu { menu_id: i64 },
    /// `dish_{m}_{s}`: the dish list and every dish of submenu `s`.
    DishesOfSubmenu { menu_id: i64, submenu_id: i64 },
}

impl KeyPrefix {
    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(self.to_string().as_str())
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPrefix::SubmenusOf { menu_id } => write!(f, "submenu_{menu_id}"),
            KeyPrefix::DishesOfMenu { menu_id } => write!(f, "dish_{menu_id}"),
            KeyPrefix::DishesOfSubmenu {
                menu_id,
                submenu_id,
            } => write!(f, "dish_{menu_id}_{submenu_id}"),
        }
    }
}
