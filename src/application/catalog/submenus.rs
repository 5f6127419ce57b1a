use std::sync::Arc;

use tracing::info;

use crate::application::repos::{
    CreateSubmenuParams, SubmenusRepo, SubmenusWriteRepo, UpdateSubmenuParams,
};
use crate::cache::{CacheGateway, CacheKey, Mutation};
use crate::domain::entities::SubmenuRecord;

use super::{
    CatalogError, EntityKind, check_description, normalize_title, patch_description, patch_title,
};

#[derive(Debug, Clone)]
pub struct CreateSubmenuCommand {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSubmenuCommand {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct SubmenuService {
    reader: Arc<dyn SubmenusRepo>,
    writer: Arc<dyn SubmenusWriteRepo>,
    cache: CacheGateway,
}

impl SubmenuService {
    pub fn new(
        reader: Arc<dyn SubmenusRepo>,
        writer: Arc<dyn SubmenusWriteRepo>,
        cache: CacheGateway,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    /// Submenus of `menu_id`; an unknown menu is `NotFound`, not an empty list.
    pub async fn list(&self, menu_id: i64) -> Result<Vec<SubmenuRecord>, CatalogError> {
        self.cache
            .read_through(CacheKey::SubmenuList { menu_id }, || async {
                self.reader
                    .list_submenus(menu_id)
                    .await
                    .map_err(|err| CatalogError::from_repo(EntityKind::Menu, err))
            })
            .await
    }

    pub async fn get(&self, menu_id: i64, submenu_id: i64) -> Result<SubmenuRecord, CatalogError> {
        let key = CacheKey::Submenu {
            menu_id,
            submenu_id,
        };
        self.cache
            .read_through(key, || async {
                self.reader
                    .find_submenu(menu_id, submenu_id)
                    .await
                    .map_err(|err| CatalogError::from_repo(EntityKind::Submenu, err))?
                    .ok_or(CatalogError::not_found(EntityKind::Submenu))
            })
            .await
    }

    pub async fn create(
        &self,
        menu_id: i64,
        command: CreateSubmenuCommand,
    ) -> Result<SubmenuRecord, CatalogError> {
        let params = CreateSubmenuParams {
            title: normalize_title(&command.title)?,
            description: check_description(command.description)?,
        };

        let plan = self
            .cache
            .invalidate(Mutation::SubmenuCreated { menu_id })
            .await?;
        let record = self
            .writer
            .create_submenu(menu_id, params)
            .await
            .map_err(|err| CatalogError::from_create(EntityKind::Submenu, EntityKind::Menu, err))?;
        self.cache.settle(&plan).await;

        info!(
            target = "carte::catalog::submenus",
            menu_id,
            submenu_id = record.id,
            "submenu created"
        );
        Ok(record)
    }

    pub async fn update(
        &self,
        menu_id: i64,
        submenu_id: i64,
        command: UpdateSubmenuCommand,
    ) -> Result<SubmenuRecord, CatalogError> {
        let params = UpdateSubmenuParams {
            title: patch_title(command.title)?,
            description: patch_description(command.description)?,
        };

        let plan = self
            .cache
            .invalidate(Mutation::SubmenuUpdated {
                menu_id,
                submenu_id,
            })
            .await?;
        let record = self
            .writer
            .update_submenu(menu_id, submenu_id, params)
            .await
            .map_err(|err| CatalogError::from_repo(EntityKind::Submenu, err))?;
        self.cache.settle(&plan).await;

        info!(
            target = "carte::catalog::submenus",
            menu_id, submenu_id, "submenu updated"
        );
        Ok(record)
    }

    pub async fn delete(&self, menu_id: i64, submenu_id: i64) -> Result<(), CatalogError> {
        let plan = self
            .cache
            .invalidate(Mutation::SubmenuDeleted {
                menu_id,
                submenu_id,
            })
            .await?;
        self.writer
            .delete_submenu(menu_id, submenu_id)
            .await
            .map_err(|err| CatalogError::from_repo(EntityKind::Submenu, err))?;
        self.cache.settle(&plan).await;

        info!(
            target = "carte::catalog::submenus",
            menu_id, submenu_id, "submenu deleted"
        );
        Ok(())
    }
}
