use async_trait::async_trait;

use crate::{
    application::repos::{
        CreateMenuParams, MenusRepo, MenusWriteRepo, RepoError, UpdateMenuParams,
    },
    domain::entities::MenuRecord,
};

use super::{PostgresRepositories, map_sqlx_error, util::expect_affected};

const MENU_SELECT: &str = r#"
    SELECT m.id,
           m.title,
           m.description,
           COUNT(DISTINCT s.id) AS submenus_count,
           COUNT(d.id) AS dishes_count
      FROM menus m
      LEFT JOIN submenus s ON s.menu_id = m.id
      LEFT JOIN dishes d ON d.submenu_id = s.id
"#;

#[derive(sqlx::FromRow)]
struct MenuRow {
    id: i64,
    title: String,
    description: Option<String>,
    submenus_count: i64,
    dishes_count: i64,
}

impl From<MenuRow> for MenuRecord {
    fn from(row: MenuRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            submenus_count: row.submenus_count,
            dishes_count: row.dishes_count,
        }
    }
}

#[async_trait]
impl MenusRepo for PostgresRepositories {
    async fn list_menus(&self) -> Result<Vec<MenuRecord>, RepoError> {
        let sql = format!("{MENU_SELECT} GROUP BY m.id ORDER BY m.id");
        let rows = sqlx::query_as::<_, MenuRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuRecord::from).collect())
    }

    async fn find_menu(&self, menu_id: i64) -> Result<Option<MenuRecord>, RepoError> {
        let sql = format!("{MENU_SELECT} WHERE m.id = $1 GROUP BY m.id");
        let row = sqlx::query_as::<_, MenuRow>(&sql)
            .bind(menu_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(MenuRecord::from))
    }
}

#[async_trait]
impl MenusWriteRepo for PostgresRepositories {
    async fn create_menu(&self, params: CreateMenuParams) -> Result<MenuRecord, RepoError> {
        let (id, title, description) = sqlx::query_as::<_, (i64, String, Option<String>)>(
            r#"
            INSERT INTO menus (title, description)
            VALUES ($1, $2)
            RETURNING id, title, description
            "#,
        )
        .bind(&params.title)
        .bind(&params.description)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(MenuRecord {
            id,
            title,
            description,
            submenus_count: 0,
            dishes_count: 0,
        })
    }

    async fn update_menu(
        &self,
        menu_id: i64,
        params: UpdateMenuParams,
    ) -> Result<MenuRecord, RepoError> {
        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE menus
               SET title = COALESCE($2, title),
                   description = COALESCE($3, description)
             WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(menu_id)
        .bind(&params.title)
        .bind(&params.description)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if updated.is_none() {
            return Err(RepoError::NotFound);
        }

        self.find_menu(menu_id).await?.ok_or(RepoError::NotFound)
    }

    async fn delete_menu(&self, menu_id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(menu_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        expect_affected(result.rows_affected())
    }
}
