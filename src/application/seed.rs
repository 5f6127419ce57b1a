//! Demo catalog used by `carte seed` and `POST /api/v1/generate_data`.

use serde::Serialize;
use tracing::info;

use crate::application::catalog::{
    CatalogError, CreateDishCommand, CreateMenuCommand, CreateSubmenuCommand, DishService,
    MenuService, SubmenuService,
};
use crate::domain::price::Price;

struct DemoDish {
    title: &'static str,
    description: &'static str,
    price_cents: i64,
}

struct DemoSubmenu {
    title: &'static str,
    description: &'static str,
    dishes: &'static [DemoDish],
}

struct DemoMenu {
    title: &'static str,
    description: &'static str,
    submenus: &'static [DemoSubmenu],
}

const DEMO_CATALOG: &[DemoMenu] = &[
    DemoMenu {
        title: "Breakfast",
        description: "Served until noon",
        submenus: &[
            DemoSubmenu {
                title: "Porridges",
                description: "Cooked on milk or water",
                dishes: &[
                    DemoDish {
                        title: "Oatmeal with berries",
                        description: "Rolled oats, seasonal berries, honey",
                        price_cents: 450,
                    },
                    DemoDish {
                        title: "Buckwheat porridge",
                        description: "With butter",
                        price_cents: 390,
                    },
                ],
            },
            DemoSubmenu {
                title: "Eggs",
                description: "Farm eggs, cooked to order",
                dishes: &[
                    DemoDish {
                        title: "Shakshuka",
                        description: "Eggs poached in spiced tomato sauce",
                        price_cents: 720,
                    },
                    DemoDish {
                        title: "Omelette with cheese",
                        description: "Three eggs, cheddar",
                        price_cents: 610,
                    },
                ],
            },
        ],
    },
    DemoMenu {
        title: "Dinner",
        description: "Served from six in the evening",
        submenus: &[
            DemoSubmenu {
                title: "Soups",
                description: "Made fresh every day",
                dishes: &[
                    DemoDish {
                        title: "Borscht",
                        description: "Beetroot soup with sour cream",
                        price_cents: 650,
                    },
                    DemoDish {
                        title: "Tom yum",
                        description: "Hot and sour soup with shrimp",
                        price_cents: 990,
                    },
                ],
            },
            DemoSubmenu {
                title: "Mains",
                description: "With a side of your choice",
                dishes: &[
                    DemoDish {
                        title: "Chicken Kiev",
                        description: "Breaded chicken fillet with herb butter",
                        price_cents: 1250,
                    },
                    DemoDish {
                        title: "Grilled salmon",
                        description: "With lemon and capers",
                        price_cents: 1890,
                    },
                ],
            },
        ],
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub menus: usize,
    pub submenus: usize,
    pub dishes: usize,
}

/// Writes the demo catalog through the services so the cache stays consistent.
///
/// Fails with a `Conflict` when a demo title is already taken.
pub async fn seed_demo_catalog(
    menus: &MenuService,
    submenus: &SubmenuService,
    dishes: &DishService,
) -> Result<SeedSummary, CatalogError> {
    let mut summary = SeedSummary::default();

    for demo_menu in DEMO_CATALOG {
        let menu = menus
            .create(CreateMenuCommand {
                title: demo_menu.title.to_string(),
                description: Some(demo_menu.description.to_string()),
            })
            .await?;
        summary.menus += 1;

        for demo_submenu in demo_menu.submenus {
            let submenu = submenus
                .create(
                    menu.id,
                    CreateSubmenuCommand {
                        title: demo_submenu.title.to_string(),
                        description: Some(demo_submenu.description.to_string()),
                    },
                )
                .await?;
            summary.submenus += 1;

            for demo_dish in demo_submenu.dishes {
                let price = Price::from_cents(demo_dish.price_cents)
                    .map_err(|err| CatalogError::validation("price", err.to_string()))?;
                dishes
                    .create(
                        menu.id,
                        submenu.id,
                        CreateDishCommand {
                            title: demo_dish.title.to_string(),
                            description: Some(demo_dish.description.to_string()),
                            price,
                        },
                    )
                    .await?;
                summary.dishes += 1;
            }
        }
    }

    info!(
        target = "carte::seed",
        menus = summary.menus,
        submenus = summary.submenus,
        dishes = summary.dishes,
        "demo catalog created"
    );
    Ok(summary)
}
