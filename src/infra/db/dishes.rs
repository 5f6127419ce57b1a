use std::convert::TryFrom;

use async_trait::async_trait;

use crate::{
    application::repos::{
        CreateDishParams, DishesRepo, DishesWriteRepo, RepoError, UpdateDishParams,
    },
    domain::{entities::DishRecord, price::Price},
};

use super::{PostgresRepositories, map_sqlx_error, util::expect_affected};

#[derive(sqlx::FromRow)]
pub(super) struct DishRow {
    pub(super) id: i64,
    pub(super) title: String,
    pub(super) description: Option<String>,
    pub(super) price_cents: i64,
}

impl TryFrom<DishRow> for DishRecord {
    type Error = RepoError;

    fn try_from(row: DishRow) -> Result<Self, Self::Error> {
        let price = Price::from_cents(row.price_cents).map_err(|err| {
            RepoError::from_persistence(format!("dish {} has invalid price: {err}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price,
        })
    }
}

impl PostgresRepositories {
    async fn submenu_exists(&self, menu_id: i64, submenu_id: i64) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM submenus WHERE menu_id = $1 AND id = $2)",
        )
        .bind(menu_id)
        .bind(submenu_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl DishesRepo for PostgresRepositories {
    async fn list_dishes(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Vec<DishRecord>, RepoError> {
        if !self.submenu_exists(menu_id, submenu_id).await? {
            return Err(RepoError::NotFound);
        }

        let rows = sqlx::query_as::<_, DishRow>(
            r#"
            SELECT id, title, description, price_cents
              FROM dishes
             WHERE submenu_id = $1
             ORDER BY id
            "#,
        )
        .bind(submenu_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(DishRecord::try_from).collect()
    }

    async fn find_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<Option<DishRecord>, RepoError> {
        let row = sqlx::query_as::<_, DishRow>(
            r#"
            SELECT d.id, d.title, d.description, d.price_cents
              FROM dishes d
              JOIN submenus s ON s.id = d.submenu_id
             WHERE s.menu_id = $1 AND s.id = $2 AND d.id = $3
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(dish_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(DishRecord::try_from).transpose()
    }
}

#[async_trait]
impl DishesWriteRepo for PostgresRepositories {
    async fn create_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        params: CreateDishParams,
    ) -> Result<DishRecord, RepoError> {
        let row = sqlx::query_as::<_, DishRow>(
            r#"
            INSERT INTO dishes (submenu_id, title, description, price_cents)
            SELECT s.id, $3, $4, $5
              FROM submenus s
             WHERE s.menu_id = $1 AND s.id = $2
            RETURNING id, title, description, price_cents
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(&params.title)
        .bind(&params.description)
        .bind(params.price.cents())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        DishRecord::try_from(row.ok_or(RepoError::NotFound)?)
    }

    async fn update_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        params: UpdateDishParams,
    ) -> Result<DishRecord, RepoError> {
        let row = sqlx::query_as::<_, DishRow>(
            r#"
            UPDATE dishes d
               SET title = COALESCE($4, d.title),
                   description = COALESCE($5, d.description),
                   price_cents = COALESCE($6, d.price_cents)
              FROM submenus s
             WHERE s.id = d.submenu_id
               AND s.menu_id = $1 AND s.id = $2 AND d.id = $3
            RETURNING d.id, d.title, d.description, d.price_cents
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(dish_id)
        .bind(&params.title)
        .bind(&params.description)
        .bind(params.price.map(Price::cents))
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        DishRecord::try_from(row.ok_or(RepoError::NotFound)?)
    }

    async fn delete_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM dishes d
             USING submenus s
             WHERE s.id = d.submenu_id
               AND s.menu_id = $1 AND s.id = $2 AND d.id = $3
            "#,
        )
        .bind(menu_id)
        .bind(submenu_id)
        .bind(dish_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        expect_affected(result.rows_affected())
    }
}
