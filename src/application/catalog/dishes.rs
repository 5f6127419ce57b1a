use std::sync::Arc;

use tracing::info;

use crate::application::repos::{CreateDishParams, DishesRepo, DishesWriteRepo, UpdateDishParams};
use crate::cache::{CacheGateway, CacheKey, Mutation};
use crate::domain::entities::DishRecord;
use crate::domain::price::Price;

use super::{
    CatalogError, EntityKind, check_description, normalize_title, patch_description, patch_title,
};

#[derive(Debug, Clone)]
pub struct CreateDishCommand {
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDishCommand {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
}

#[derive(Clone)]
pub struct DishService {
    reader: Arc<dyn DishesRepo>,
    writer: Arc<dyn DishesWriteRepo>,
    cache: CacheGateway,
}

impl DishService {
    pub fn new(
        reader: Arc<dyn DishesRepo>,
        writer: Arc<dyn DishesWriteRepo>,
        cache: CacheGateway,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    /// Dishes of a submenu; a submenu outside `menu_id` is `NotFound`.
    pub async fn list(&self, menu_id: i64, submenu_id: i64) -> Result<Vec<DishRecord>, CatalogError> {
        let key = CacheKey::DishList {
            menu_id,
            submenu_id,
        };
        self.cache
            .read_through(key, || async {
                self.reader
                    .list_dishes(menu_id, submenu_id)
                    .await
                    .map_err(|err| CatalogError::from_repo(EntityKind::Submenu, err))
            })
            .await
    }

    pub async fn get(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<DishRecord, CatalogError> {
        let key = CacheKey::Dish {
            menu_id,
            submenu_id,
            dish_id,
        };
        self.cache
            .read_through(key, || async {
                self.reader
                    .find_dish(menu_id, submenu_id, dish_id)
                    .await
                    .map_err(|err| CatalogError::from_repo(EntityKind::Dish, err))?
                    .ok_or(CatalogError::not_found(EntityKind::Dish))
            })
            .await
    }

    pub async fn create(
        &self,
        menu_id: i64,
        submenu_id: i64,
        command: CreateDishCommand,
    ) -> Result<DishRecord, CatalogError> {
        let params = CreateDishParams {
            title: normalize_title(&command.title)?,
            description: check_description(command.description)?,
            price: command.price,
        };

        let plan = self
            .cache
            .invalidate(Mutation::DishCreated {
                menu_id,
                submenu_id,
            })
            .await?;
        let record = self
            .writer
            .create_dish(menu_id, submenu_id, params)
            .await
            .map_err(|err| CatalogError::from_create(EntityKind::Dish, EntityKind::Submenu, err))?;
        self.cache.settle(&plan).await;

        info!(
            target = "carte::catalog::dishes",
            menu_id,
            submenu_id,
            dish_id = record.id,
            price = %record.price,
            "dish created"
        );
        Ok(record)
    }

    pub async fn update(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        command: UpdateDishCommand,
    ) -> Result<DishRecord, CatalogError> {
        let params = UpdateDishParams {
            title: patch_title(command.title)?,
            description: patch_description(command.description)?,
            price: command.price,
        };

        let plan = self
            .cache
            .invalidate(Mutation::DishUpdated {
                menu_id,
                submenu_id,
                dish_id,
            })
            .await?;
        let record = self
            .writer
            .update_dish(menu_id, submenu_id, dish_id, params)
            .await
            .map_err(|err| CatalogError::from_repo(EntityKind::Dish, err))?;
        self.cache.settle(&plan).await;

        info!(
            target = "carte::catalog::dishes",
            menu_id, submenu_id, dish_id, "dish updated"
        );
        Ok(record)
    }

    pub async fn delete(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<(), CatalogError> {
        let plan = self
            .cache
            .invalidate(Mutation::DishDeleted {
                menu_id,
                submenu_id,
                dish_id,
            })
            .await?;
        self.writer
            .delete_dish(menu_id, submenu_id, dish_id)
            .await
            .map_err(|err| CatalogError::from_repo(EntityKind::Dish, err))?;
        self.cache.settle(&plan).await;

        info!(
            target = "carte::catalog::dishes",
            menu_id, submenu_id, dish_id, "dish deleted"
        );
        Ok(())
    }
}
