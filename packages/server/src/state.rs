use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::services::Coordinator;
use crate::services::identity::IdentityValidator;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub blob_store: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityValidator>,
}

impl AppState {
    pub fn coordinator(&self) -> Coordinator<'_> {
        Coordinator::new(&self.db, self.identity.as_ref(), self.blob_store.as_ref())
    }
}
