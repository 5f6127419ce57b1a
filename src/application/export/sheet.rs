//! Cell layout for the catalog export.
//!
//! Each level is indented one column under its parent and every row carries a
//! 1-based counter that restarts per parent:
//!
//! ```text
//! 1 | Menu A     | desc
//!   | 1          | Soups | desc
//!   |            | 1     | Borscht | desc | 12.50
//! ```

use crate::domain::entities::MenuTree;

const MENU_COLUMN: u16 = 0;
const SUBMENU_COLUMN: u16 = 1;
const DISH_COLUMN: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Counter(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
}

/// Zero-based cells for every menu, submenu and dish, on consecutive rows.
pub fn layout(menus: &[MenuTree]) -> Vec<SheetCell> {
    let mut cells = Vec::new();
    let mut row: u32 = 0;

    for (menu_index, menu) in menus.iter().enumerate() {
        push_entry(
            &mut cells,
            row,
            MENU_COLUMN,
            menu_index,
            &menu.title,
            menu.description.as_deref(),
        );
        row += 1;

        for (submenu_index, submenu) in menu.submenus.iter().enumerate() {
            push_entry(
                &mut cells,
                row,
                SUBMENU_COLUMN,
                submenu_index,
                &submenu.title,
                submenu.description.as_deref(),
            );
            row += 1;

            for (dish_index, dish) in submenu.dishes.iter().enumerate() {
                push_entry(
                    &mut cells,
                    row,
                    DISH_COLUMN,
                    dish_index,
                    &dish.title,
                    dish.description.as_deref(),
                );
                cells.push(SheetCell {
                    row,
                    col: DISH_COLUMN + 3,
                    value: CellValue::Text(dish.price.to_string()),
                });
                row += 1;
            }
        }
    }

    cells
}

fn push_entry(
    cells: &mut Vec<SheetCell>,
    row: u32,
    col: u16,
    index: usize,
    title: &str,
    description: Option<&str>,
) {
    cells.push(SheetCell {
        row,
        col,
        value: CellValue::Counter(index as u32 + 1),
    });
    cells.push(SheetCell {
        row,
        col: col + 1,
        value: CellValue::Text(title.to_string()),
    });
    if let Some(description) = description {
        cells.push(SheetCell {
            row,
            col: col + 2,
            value: CellValue::Text(description.to_string()),
        });
    }
}
