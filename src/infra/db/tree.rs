use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    application::repos::{CatalogTreeRepo, RepoError},
    domain::entities::{DishRecord, MenuTree, SubmenuTree},
};

use super::{PostgresRepositories, dishes::DishRow, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TreeMenuRow {
    id: i64,
    title: String,
    description: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TreeSubmenuRow {
    id: i64,
    menu_id: i64,
    title: String,
    description: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TreeDishRow {
    submenu_id: i64,
    #[sqlx(flatten)]
    dish: DishRow,
}

#[async_trait]
impl CatalogTreeRepo for PostgresRepositories {
    async fn load_tree(&self) -> Result<Vec<MenuTree>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let menus = sqlx::query_as::<_, TreeMenuRow>(
            "SELECT id, title, description FROM menus ORDER BY id",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let submenus = sqlx::query_as::<_, TreeSubmenuRow>(
            "SELECT id, menu_id, title, description FROM submenus ORDER BY menu_id, id",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let dishes = sqlx::query_as::<_, TreeDishRow>(
            r#"
            SELECT submenu_id, id, title, description, price_cents
              FROM dishes
             ORDER BY submenu_id, id
            "#,
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        assemble_tree(menus, submenus, dishes)
    }
}

fn assemble_tree(
    menus: Vec<TreeMenuRow>,
    submenus: Vec<TreeSubmenuRow>,
    dishes: Vec<TreeDishRow>,
) -> Result<Vec<MenuTree>, RepoError> {
    let mut dishes_by_submenu: HashMap<i64, Vec<DishRecord>> = HashMap::new();
    for row in dishes {
        let submenu_id = row.submenu_id;
        dishes_by_submenu
            .entry(submenu_id)
            .or_default()
            .push(DishRecord::try_from(row.dish)?);
    }

    let mut submenus_by_menu: HashMap<i64, Vec<SubmenuTree>> = HashMap::new();
    for row in submenus {
        submenus_by_menu
            .entry(row.menu_id)
            .or_default()
            .push(SubmenuTree {
                id: row.id,
                title: row.title,
                description: row.description,
                dishes: dishes_by_submenu.remove(&row.id).unwrap_or_default(),
            });
    }

    Ok(menus
        .into_iter()
        .map(|row| MenuTree {
            id: row.id,
            title: row.title,
            description: row.description,
            submenus: submenus_by_menu.remove(&row.id).unwrap_or_default(),
        })
        .collect())
}
