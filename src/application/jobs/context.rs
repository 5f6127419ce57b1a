use std::{path::PathBuf, sync::Arc};

use apalis::prelude::Error as ApalisError;

use crate::application::repos::CatalogTreeRepo;

/// Shared context passed to export workers.
#[derive(Clone)]
pub struct ExportJobContext {
    pub catalog: Arc<dyn CatalogTreeRepo>,
    pub directory: PathBuf,
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convert any error into an [`ApalisError::Failed`].
pub fn job_failed<E>(err: E) -> ApalisError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let boxed: BoxError = Box::new(err);
    ApalisError::Failed(Arc::new(boxed))
}
