use std::sync::Arc;

use tracing::info;

use crate::application::repos::{
    CreateMenuParams, MenusRepo, MenusWriteRepo, UpdateMenuParams,
};
use crate::cache::{CacheGateway, CacheKey, Mutation};
use crate::domain::entities::MenuRecord;

use super::{
    CatalogError, EntityKind, check_description, normalize_title, patch_description, patch_title,
};

#[derive(Debug, Clone)]
pub struct CreateMenuCommand {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMenuCommand {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct MenuService {
    reader: Arc<dyn MenusRepo>,
    writer: Arc<dyn MenusWriteRepo>,
    cache: CacheGateway,
}

impl MenuService {
    pub fn new(
        reader: Arc<dyn MenusRepo>,
        writer: Arc<dyn MenusWriteRepo>,
        cache: CacheGateway,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    pub async fn list(&self) -> Result<Vec<MenuRecord>, CatalogError> {
        self.cache
            .read_through(CacheKey::MenusList, || async {
                self.reader
                    .list_menus()
                    .await
                    .map_err(|err| CatalogError::from_repo(EntityKind::Menu, err))
            })
            .await
    }

    pub async fn get(&self, menu_id: i64) -> Result<MenuRecord, CatalogError> {
        self.cache
            .read_through(CacheKey::Menu { menu_id }, || async {
                self.reader
                    .find_menu(menu_id)
                    .await
                    .map_err(|err| CatalogError::from_repo(EntityKind::Menu, err))?
                    .ok_or(CatalogError::not_found(EntityKind::Menu))
            })
            .await
    }

    pub async fn create(&self, command: CreateMenuCommand) -> Result<MenuRecord, CatalogError> {
        let params = CreateMenuParams {
            title: normalize_title(&command.title)?,
            description: check_description(command.description)?,
        };

        let plan = self.cache.invalidate(Mutation::MenuCreated).await?;
        let record = self
            .writer
            .create_menu(params)
            .await
            .map_err(|err| CatalogError::from_repo(EntityKind::Menu, err))?;
        self.cache.settle(&plan).await;

        info!(
            target = "carte::catalog::menus",
            menu_id = record.id,
            title = %record.title,
            "menu created"
        );
        Ok(record)
    }

    pub async fn update(
        &self,
        menu_id: i64,
        command: UpdateMenuCommand,
    ) -> Result<MenuRecord, CatalogError> {
        let params = UpdateMenuParams {
            title: patch_title(command.title)?,
            description: patch_description(command.description)?,
        };

        let plan = self.cache.invalidate(Mutation::MenuUpdated { menu_id }).await?;
        let record = self
            .writer
            .update_menu(menu_id, params)
            .await
            .map_err(|err| CatalogError::from_repo(EntityKind::Menu, err))?;
        self.cache.settle(&plan).await;

        info!(target = "carte::catalog::menus", menu_id, "menu updated");
        Ok(record)
    }

    pub async fn delete(&self, menu_id: i64) -> Result<(), CatalogError> {
        let plan = self.cache.invalidate(Mutation::MenuDeleted { menu_id }).await?;
        self.writer
            .delete_menu(menu_id)
            .await
            .map_err(|err| CatalogError::from_repo(EntityKind::Menu, err))?;
        self.cache.settle(&plan).await;

        info!(target = "carte::catalog::menus", menu_id, "menu deleted");
        Ok(())
    }
}
