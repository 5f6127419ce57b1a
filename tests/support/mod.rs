#![allow(dead_code)]

//! In-memory fakes shared by the integration tests.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use carte::application::catalog::{DishService, MenuService, SubmenuService};
use carte::application::export::ExportService;
use carte::application::repos::{
    CatalogTreeRepo, CreateDishParams, CreateMenuParams, CreateSubmenuParams, DishesRepo,
    DishesWriteRepo, JobsRepo, MenusRepo, MenusWriteRepo, NewJobRecord, RepoError,
    SubmenusRepo, SubmenusWriteRepo, UpdateDishParams, UpdateMenuParams, UpdateSubmenuParams,
};
use carte::cache::{Cache, CacheConfig, CacheError, CacheGateway, CacheKey, KeyPrefix, MemoryCache};
use carte::domain::entities::{
    DishRecord, JobRecord, MenuRecord, MenuTree, SubmenuRecord, SubmenuTree,
};
use carte::domain::price::Price;
use carte::domain::types::JobState;
use carte::infra::http::ApiState;

#[derive(Debug, Clone)]
struct MenuRow {
    title: String,
    description: Option<String>,
}

#[derive(Debug, Clone)]
struct SubmenuRow {
    menu_id: i64,
    title: String,
    description: Option<String>,
}

#[derive(Debug, Clone)]
struct DishRow {
    submenu_id: i64,
    title: String,
    description: Option<String>,
    price: Price,
}

#[derive(Default)]
struct CatalogState {
    menu_seq: i64,
    submenu_seq: i64,
    dish_seq: i64,
    menus: BTreeMap<i64, MenuRow>,
    submenus: BTreeMap<i64, SubmenuRow>,
    dishes: BTreeMap<i64, DishRow>,
}

impl CatalogState {
    fn menu_record(&self, menu_id: i64) -> Option<MenuRecord> {
        let row = self.menus.get(&menu_id)?;
        let submenu_ids: Vec<i64> = self
            .submenus
            .iter()
            .filter(|(_, submenu)| submenu.menu_id == menu_id)
            .map(|(id, _)| *id)
            .collect();
        let dishes_count = self
            .dishes
            .values()
            .filter(|dish| submenu_ids.contains(&dish.submenu_id))
            .count();
        Some(MenuRecord {
            id: menu_id,
            title: row.title.clone(),
            description: row.description.clone(),
            submenus_count: submenu_ids.len() as i64,
            dishes_count: dishes_count as i64,
        })
    }

    fn submenu_record(&self, menu_id: i64, submenu_id: i64) -> Option<SubmenuRecord> {
        let row = self
            .submenus
            .get(&submenu_id)
            .filter(|row| row.menu_id == menu_id)?;
        let dishes_count = self
            .dishes
            .values()
            .filter(|dish| dish.submenu_id == submenu_id)
            .count();
        Some(SubmenuRecord {
            id: submenu_id,
            title: row.title.clone(),
            description: row.description.clone(),
            dishes_count: dishes_count as i64,
        })
    }

    fn dish_record(&self, menu_id: i64, submenu_id: i64, dish_id: i64) -> Option<DishRecord> {
        self.submenu_record(menu_id, submenu_id)?;
        let row = self
            .dishes
            .get(&dish_id)
            .filter(|row| row.submenu_id == submenu_id)?;
        Some(DishRecord {
            id: dish_id,
            title: row.title.clone(),
            description: row.description.clone(),
            price: row.price,
        })
    }

    fn menu_title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.menus
            .iter()
            .any(|(id, row)| row.title == title && Some(*id) != except)
    }

    fn submenu_title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.submenus
            .iter()
            .any(|(id, row)| row.title == title && Some(*id) != except)
    }

    fn dish_title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.dishes
            .iter()
            .any(|(id, row)| row.title == title && Some(*id) != except)
    }

    fn remove_submenu(&mut self, submenu_id: i64) {
        self.submenus.remove(&submenu_id);
        self.dishes.retain(|_, dish| dish.submenu_id != submenu_id);
    }
}

fn duplicate(constraint: &str) -> RepoError {
    RepoError::Duplicate {
        constraint: constraint.to_string(),
    }
}

/// Catalog store with the same uniqueness, ancestry and cascade rules as the
/// Postgres schema. Counts every read so tests can tell hits from misses.
#[derive(Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
    reads: AtomicUsize,
}

impl MemoryCatalog {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn menu_count(&self) -> usize {
        self.state.lock().unwrap().menus.len()
    }

    pub fn dish_count(&self) -> usize {
        self.state.lock().unwrap().dishes.len()
    }

    fn read(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl MenusRepo for MemoryCatalog {
    async fn list_menus(&self) -> Result<Vec<MenuRecord>, RepoError> {
        let state = self.read();
        Ok(state
            .menus
            .keys()
            .filter_map(|id| state.menu_record(*id))
            .collect())
    }

    async fn find_menu(&self, menu_id: i64) -> Result<Option<MenuRecord>, RepoError> {
        Ok(self.read().menu_record(menu_id))
    }
}

#[async_trait]
impl MenusWriteRepo for MemoryCatalog {
    async fn create_menu(&self, params: CreateMenuParams) -> Result<MenuRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        if state.menu_title_taken(&params.title, None) {
            return Err(duplicate("menus_title_key"));
        }
        state.menu_seq += 1;
        let id = state.menu_seq;
        state.menus.insert(
            id,
            MenuRow {
                title: params.title,
                description: params.description,
            },
        );
        state.menu_record(id).ok_or(RepoError::NotFound)
    }

    async fn update_menu(
        &self,
        menu_id: i64,
        params: UpdateMenuParams,
    ) -> Result<MenuRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        if let Some(title) = &params.title
            && state.menu_title_taken(title, Some(menu_id))
        {
            return Err(duplicate("menus_title_key"));
        }
        let row = state.menus.get_mut(&menu_id).ok_or(RepoError::NotFound)?;
        if let Some(title) = params.title {
            row.title = title;
        }
        if let Some(description) = params.description {
            row.description = Some(description);
        }
        state.menu_record(menu_id).ok_or(RepoError::NotFound)
    }

    async fn delete_menu(&self, menu_id: i64) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();
        state.menus.remove(&menu_id).ok_or(RepoError::NotFound)?;
        let doomed: Vec<i64> = state
            .submenus
            .iter()
            .filter(|(_, row)| row.menu_id == menu_id)
            .map(|(id, _)| *id)
            .collect();
        for submenu_id in doomed {
            state.remove_submenu(submenu_id);
        }
        Ok(())
    }
}

#[async_trait]
impl SubmenusRepo for MemoryCatalog {
    async fn list_submenus(&self, menu_id: i64) -> Result<Vec<SubmenuRecord>, RepoError> {
        let state = self.read();
        if !state.menus.contains_key(&menu_id) {
            return Err(RepoError::NotFound);
        }
        Ok(state
            .submenus
            .keys()
            .filter_map(|id| state.submenu_record(menu_id, *id))
            .collect())
    }

    async fn find_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Option<SubmenuRecord>, RepoError> {
        Ok(self.read().submenu_record(menu_id, submenu_id))
    }
}

#[async_trait]
impl SubmenusWriteRepo for MemoryCatalog {
    async fn create_submenu(
        &self,
        menu_id: i64,
        params: CreateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        if !state.menus.contains_key(&menu_id) {
            return Err(RepoError::NotFound);
        }
        if state.submenu_title_taken(&params.title, None) {
            return Err(duplicate("submenus_title_key"));
        }
        state.submenu_seq += 1;
        let id = state.submenu_seq;
        state.submenus.insert(
            id,
            SubmenuRow {
                menu_id,
                title: params.title,
                description: params.description,
            },
        );
        state.submenu_record(menu_id, id).ok_or(RepoError::NotFound)
    }

    async fn update_submenu(
        &self,
        menu_id: i64,
        submenu_id: i64,
        params: UpdateSubmenuParams,
    ) -> Result<SubmenuRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        state
            .submenu_record(menu_id, submenu_id)
            .ok_or(RepoError::NotFound)?;
        if let Some(title) = &params.title
            && state.submenu_title_taken(title, Some(submenu_id))
        {
            return Err(duplicate("submenus_title_key"));
        }
        let row = state
            .submenus
            .get_mut(&submenu_id)
            .ok_or(RepoError::NotFound)?;
        if let Some(title) = params.title {
            row.title = title;
        }
        if let Some(description) = params.description {
            row.description = Some(description);
        }
        state
            .submenu_record(menu_id, submenu_id)
            .ok_or(RepoError::NotFound)
    }

    async fn delete_submenu(&self, menu_id: i64, submenu_id: i64) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();
        state
            .submenu_record(menu_id, submenu_id)
            .ok_or(RepoError::NotFound)?;
        state.remove_submenu(submenu_id);
        Ok(())
    }
}

#[async_trait]
impl DishesRepo for MemoryCatalog {
    async fn list_dishes(
        &self,
        menu_id: i64,
        submenu_id: i64,
    ) -> Result<Vec<DishRecord>, RepoError> {
        let state = self.read();
        state
            .submenu_record(menu_id, submenu_id)
            .ok_or(RepoError::NotFound)?;
        Ok(state
            .dishes
            .keys()
            .filter_map(|id| state.dish_record(menu_id, submenu_id, *id))
            .collect())
    }

    async fn find_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<Option<DishRecord>, RepoError> {
        Ok(self.read().dish_record(menu_id, submenu_id, dish_id))
    }
}

#[async_trait]
impl DishesWriteRepo for MemoryCatalog {
    async fn create_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        params: CreateDishParams,
    ) -> Result<DishRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        state
            .submenu_record(menu_id, submenu_id)
            .ok_or(RepoError::NotFound)?;
        if state.dish_title_taken(&params.title, None) {
            return Err(duplicate("dishes_title_key"));
        }
        state.dish_seq += 1;
        let id = state.dish_seq;
        state.dishes.insert(
            id,
            DishRow {
                submenu_id,
                title: params.title,
                description: params.description,
                price: params.price,
            },
        );
        state
            .dish_record(menu_id, submenu_id, id)
            .ok_or(RepoError::NotFound)
    }

    async fn update_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
        params: UpdateDishParams,
    ) -> Result<DishRecord, RepoError> {
        let mut state = self.state.lock().unwrap();
        state
            .dish_record(menu_id, submenu_id, dish_id)
            .ok_or(RepoError::NotFound)?;
        if let Some(title) = &params.title
            && state.dish_title_taken(title, Some(dish_id))
        {
            return Err(duplicate("dishes_title_key"));
        }
        let row = state.dishes.get_mut(&dish_id).ok_or(RepoError::NotFound)?;
        if let Some(title) = params.title {
            row.title = title;
        }
        if let Some(description) = params.description {
            row.description = Some(description);
        }
        if let Some(price) = params.price {
            row.price = price;
        }
        state
            .dish_record(menu_id, submenu_id, dish_id)
            .ok_or(RepoError::NotFound)
    }

    async fn delete_dish(
        &self,
        menu_id: i64,
        submenu_id: i64,
        dish_id: i64,
    ) -> Result<(), RepoError> {
        let mut state = self.state.lock().unwrap();
        state
            .dish_record(menu_id, submenu_id, dish_id)
            .ok_or(RepoError::NotFound)?;
        state.dishes.remove(&dish_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogTreeRepo for MemoryCatalog {
    async fn load_tree(&self) -> Result<Vec<MenuTree>, RepoError> {
        let state = self.read();
        let tree = state
            .menus
            .iter()
            .map(|(menu_id, menu)| MenuTree {
                id: *menu_id,
                title: menu.title.clone(),
                description: menu.description.clone(),
                submenus: state
                    .submenus
                    .iter()
                    .filter(|(_, submenu)| submenu.menu_id == *menu_id)
                    .map(|(submenu_id, submenu)| SubmenuTree {
                        id: *submenu_id,
                        title: submenu.title.clone(),
                        description: submenu.description.clone(),
                        dishes: state
                            .dishes
                            .keys()
                            .filter_map(|id| state.dish_record(*menu_id, *submenu_id, *id))
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Ok(tree)
    }
}

/// Memory cache whose operations can be made to fail on demand.
pub struct FlakyCache {
    inner: Arc<MemoryCache>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FlakyCache {
    pub fn new(inner: Arc<MemoryCache>) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), CacheError> {
        if flag.load(Ordering::SeqCst) {
            return Err(CacheError::backend(format!("{op} refused")));
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for FlakyCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Self::check(&self.fail_reads, "get")?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        Self::check(&self.fail_writes, "set")?;
        self.inner.set(key, value).await
    }

    async fn delete_exact(&self, keys: &[CacheKey]) -> Result<(), CacheError> {
        Self::check(&self.fail_deletes, "delete")?;
        self.inner.delete_exact(keys).await
    }

    async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<(), CacheError> {
        Self::check(&self.fail_deletes, "delete")?;
        self.inner.delete_prefix(prefix).await
    }
}

/// Job queue fake; jobs stay pending until a test moves them.
#[derive(Default)]
pub struct FakeJobs {
    jobs: Mutex<HashMap<String, JobRecord>>,
}

impl FakeJobs {
    pub fn set_state(&self, id: &str, state: JobState, last_error: Option<&str>) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(id) {
            job.state = state;
            job.last_error = last_error.map(str::to_string);
            if state.is_terminal() {
                job.done_at = Some(OffsetDateTime::now_utc());
            }
        }
    }

    pub fn job(&self, id: &str) -> Option<JobRecord> {
        self.jobs.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl JobsRepo for FakeJobs {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = JobRecord {
            id: id.clone(),
            job_type: job.job_type,
            payload: job.payload,
            state: JobState::Pending,
            attempts: 0,
            max_attempts: job.max_attempts,
            run_at: job.run_at,
            done_at: None,
            last_error: None,
        };
        self.jobs.lock().unwrap().insert(id.clone(), record);
        Ok(id)
    }

    async fn find_job(&self, id: &str) -> Result<Option<JobRecord>, RepoError> {
        Ok(self.jobs.lock().unwrap().get(id).cloned())
    }
}

/// Services wired to one store and one cache.
pub struct Catalog {
    pub store: Arc<MemoryCatalog>,
    pub memory: Arc<MemoryCache>,
    pub cache: Arc<FlakyCache>,
    pub gateway: CacheGateway,
    pub menus: MenuService,
    pub submenus: SubmenuService,
    pub dishes: DishService,
}

impl Catalog {
    pub fn new(invalidate_after_write: bool) -> Self {
        let config = CacheConfig {
            invalidate_after_write,
            ..Default::default()
        };
        let store = Arc::new(MemoryCatalog::default());
        let memory = Arc::new(MemoryCache::new(&config));
        let cache = Arc::new(FlakyCache::new(memory.clone()));
        let gateway = CacheGateway::new(cache.clone(), &config);

        Self {
            menus: MenuService::new(store.clone(), store.clone(), gateway.clone()),
            submenus: SubmenuService::new(store.clone(), store.clone(), gateway.clone()),
            dishes: DishService::new(store.clone(), store.clone(), gateway.clone()),
            store,
            memory,
            cache,
            gateway,
        }
    }

    pub fn cached(&self, key: &str) -> bool {
        self.memory.contains(key)
    }

    pub fn api_state(&self, jobs: Arc<FakeJobs>, directory: PathBuf) -> ApiState {
        ApiState {
            menus: Arc::new(self.menus.clone()),
            submenus: Arc::new(self.submenus.clone()),
            dishes: Arc::new(self.dishes.clone()),
            exports: Arc::new(ExportService::new(jobs, directory)),
        }
    }
}

pub fn price(text: &str) -> Price {
    text.parse().unwrap()
}
