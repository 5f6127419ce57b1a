//! Invalidation plan generation.
//!
//! Maps every catalog mutation to the exact keys and prefixes that must be
//! purged so cached entries, including their embedded counts, never outlive
//! the store state they were read from.

use std::collections::BTreeSet;
use std::fmt;

use super::keys::{CacheKey, KeyPrefix};

/// A write against the catalog, identified by the entity and its ancestry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    MenuCreated,
    MenuUpdated {
        menu_id: i64,
    },
    MenuDeleted {
        menu_id: i64,
    },
    SubmenuCreated {
        menu_id: i64,
    },
    SubmenuUpdated {
        menu_id: i64,
        submenu_id: i64,
    },
    SubmenuDeleted {
        menu_id: i64,
        submenu_id: i64,
    },
    DishCreated {
        menu_id: i64,
        submenu_id: i64,
    },
    DishUpdated {
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    },
    DishDeleted {
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    },
}

impl Mutation {
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::MenuCreated => "menu.create",
            Mutation::MenuUpdated { .. } => "menu.update",
            Mutation::MenuDeleted { .. } => "menu.delete",
            Mutation::SubmenuCreated { .. } => "submenu.create",
            Mutation::SubmenuUpdated { .. } => "submenu.update",
            Mutation::SubmenuDeleted { .. } => "submenu.delete",
            Mutation::DishCreated { .. } => "dish.create",
            Mutation::DishUpdated { .. } => "dish.update",
            Mutation::DishDeleted { .. } => "dish.delete",
        }
    }
}

/// Keys to delete exactly plus prefixes to purge for one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub exact: BTreeSet<CacheKey>,
    pub prefixes: BTreeSet<KeyPrefix>,
}

impl InvalidationPlan {
    pub fn for_mutation(mutation: Mutation) -> Self {
        let mut plan = Self::default();
        plan.exact.insert(CacheKey::MenusList);

        match mutation {
            Mutation::MenuCreated => {}
            Mutation::MenuUpdated { menu_id } => {
                plan.exact.insert(CacheKey::Menu { menu_id });
            }
            Mutation::MenuDeleted { menu_id } => {
                plan.exact.insert(CacheKey::Menu { menu_id });
                plan.prefixes.insert(KeyPrefix::SubmenusOf { menu_id });
                plan.prefixes.insert(KeyPrefix::DishesOfMenu { menu_id });
            }
            Mutation::SubmenuCreated { menu_id } => {
                plan.add_menu_branch(menu_id);
            }
            Mutation::SubmenuUpdated {
                menu_id,
                submenu_id,
            } => {
                plan.add_menu_branch(menu_id);
                plan.exact.insert(CacheKey::Submenu {
                    menu_id,
                    submenu_id,
                });
            }
            Mutation::SubmenuDeleted {
                menu_id,
                submenu_id,
            } => {
                plan.add_menu_branch(menu_id);
                plan.exact.insert(CacheKey::Submenu {
                    menu_id,
                    submenu_id,
                });
                plan.prefixes.insert(KeyPrefix::DishesOfSubmenu {
                    menu_id,
                    submenu_id,
                });
            }
            Mutation::DishCreated {
                menu_id,
                submenu_id,
            } => {
                // The submenu entry embeds dishes_count, so it goes too.
                plan.add_submenu_branch(menu_id, submenu_id);
            }
            Mutation::DishUpdated {
                menu_id,
                submenu_id,
                dish_id,
            }
            | Mutation::DishDeleted {
                menu_id,
                submenu_id,
                dish_id,
            } => {
                plan.add_submenu_branch(menu_id, submenu_id);
                plan.exact.insert(CacheKey::Dish {
                    menu_id,
                    submenu_id,
                    dish_id,
                });
            }
        }

        plan
    }

    fn add_menu_branch(&mut self, menu_id: i64) {
        self.exact.insert(CacheKey::Menu { menu_id });
        self.exact.insert(CacheKey::SubmenuList { menu_id });
    }

    fn add_submenu_branch(&mut self, menu_id: i64, submenu_id: i64) {
        self.add_menu_branch(menu_id);
        self.exact.insert(CacheKey::Submenu {
            menu_id,
            submenu_id,
        });
        self.exact.insert(CacheKey::DishList {
            menu_id,
            submenu_id,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.prefixes.is_empty()
    }

    /// Whether `key` would be removed by applying this plan.
    pub fn covers(&self, key: &str) -> bool {
        self.exact.iter().any(|exact| exact.to_string() == key)
            || self.prefixes.iter().any(|prefix| prefix.matches(key))
    }

    pub fn exact_keys(&self) -> Vec<CacheKey> {
        self.exact.iter().copied().collect()
    }
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exact: Vec<String> = self.exact.iter().map(ToString::to_string).collect();
        let prefixes: Vec<String> = self
            .prefixes
            .iter()
            .map(|prefix| format!("{prefix}*"))
            .collect();
        write!(
            f,
            "InvalidationPlan {{ exact: [{}], prefixes: [{}] }}",
            exact.join(", "),
            prefixes.join(", ")
        )
    }
}
