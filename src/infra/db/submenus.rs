use async_trait::async_trait;

use crate::{
    application::repos::{
        CreateSubmenuParams, RepoError, SubmenusRepo, SubmenusWriteRepo, UpdateSubmenuParams,
    },
    domain::entities::SubmenuRecord,
};

use super::{PostgresRepositories, map_sqlx_error, util::expect_affected};

#[derive(sqlx::FromRow)]
struct SubmenuRow {
    id: i64,
    title: String,
    description: Option<String>,
    dishes_count: i64,
}

impl From<SubmenuRow> for SubmenuRecord {
    fn from(row: SubmenuRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            dishes_count: row.dishes_count,
        }
    }
}

impl PostgresRepositories {
    async fn menu_exists(&self, menu_id: i64) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM menus WHERE id = $1)")
            .bind(menu_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl SubmenusRepo for PostgresRepositories {
    async fn list_submenus(&self, menu_id: i64) -> Result<Vec<SubmenuRecord>, RepoError> {
        if !self.menu_exists(menu_id).await? {
            return Err(RepoError::NotFound);
        }

        let rows = sqlx::query_as::<_, SubmenuRow>(
            r#"
            SELECT s.id,
                   s.title,
                   s.description,
                   COUNT(d.id) AS dishes_count
              FROM submenus s
              LEFT JOIN dishes d ON d.submenu_id = s.id
             WHERE s.menu_id = $1
             GROUP BY s.id
             ORDER BY s.id
            "#,
        )
        .bind(menu_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SubmenuRecord::from).collect())
    }

    async fn find_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Option<SubmenuRecord>, RepoError> {
        let row = sqlx::query_as::<_, SubmenuRow>(
            r#"
            SELECT s.id,
                   s.title,
                   s.description,
                   COUNT(d.id) AS dishes_count
              FROM submenus s
              LEFT JOIN dishes d ON d.submenu_id = s.id
             WHERE s.menu_id = $1 AND s.id = $2
             GROUP BY s.id
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SubmenuRecord::from))
    }
}

#[async_trait]
impl SubmenusWriteRepo for PostgresRepositories {
    async fn create_submenu(
        &self,
        menu_id: i64,
        params: CreateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        // Inserting through a SELECT on the parent turns a missing menu into zero rows.
        let row = sqlx::query_as::<_, (i64, String, Option<String>)>(
            r#"
            INSERT INTO submenus (menu_id, title, description)
            SELECT m.id, $2, $3
              FROM menus m
             WHERE m.id = $1
            RETURNING id, title, description
            "#,
        )
        .bind(menu_id)
        .bind(&params.title)
        .bind(&params.description)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let (id, title, description) = row.ok_or(RepoError::NotFound)?;
        Ok(SubmenuRecord {
            id,
            title,
            description,
            dishes_count: 0,
        })
    }

    async fn update_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
        params: UpdateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE submenus
               SET title = COALESCE($3, title),
                   description = COALESCE($4, description)
             WHERE menu_id = $1 AND id = $2
            RETURNING id
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(&params.title)
        .bind(&params.description)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if updated.is_none() {
            return Err(RepoError::NotFound);
        }

        self.find_submenu(menu_id, submenu_id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn delete_submenu(&self, menu_id: i64, submenu_id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM submenus WHERE menu_id = $1 AND id = $2")
            .bind(menu_id)
            .bind(submenu_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        expect_affected(result.rows_affected())
    }
}
