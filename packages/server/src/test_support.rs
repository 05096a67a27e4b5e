//! Fixtures shared by the unit tests.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use common::storage::FilesystemBlobStore;
use sea_orm::DatabaseConnection;

use crate::config::DatabaseConfig;
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::identity::{Credential, IdentityValidator};
use crate::services::listing::{ListingDraft, ListingType};

/// Fresh in-memory database with the full schema.
///
/// A single pooled connection keeps every query on the same SQLite memory
/// database and serialises transactions the way row locks would.
pub async fn test_db() -> DatabaseConnection {
    let config = DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
        log_queries: false,
    };
    let db = crate::database::init_db(&config).await.unwrap();
    crate::database::ensure_indexes(&db).await.unwrap();
    db
}

pub async fn temp_blob_store() -> (FilesystemBlobStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemBlobStore::new(dir.path().join("photos"), 1024 * 1024)
        .await
        .unwrap();
    (store, dir)
}

/// A valid draft owned by `u1` on device `d1`.
pub fn listing_draft(city: &str, price: f64) -> ListingDraft {
    ListingDraft {
        owner_id: "u1".into(),
        device_id: "d1".into(),
        title: "Cordless drill".into(),
        description: "18V, two batteries".into(),
        price,
        category: "tools".into(),
        city: city.into(),
        region: "BE".into(),
        image_url: "https://img.example/drill.jpg".into(),
        listing_type: ListingType::Rent,
    }
}

pub fn credential() -> Credential {
    Credential::new(format!("Bearer {}", FakeDirectory::TOKEN))
}

/// In-process validator with fixed answers and a call counter.
#[derive(Default)]
pub struct StaticDirectory {
    owners: HashSet<String>,
    devices: HashSet<String>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl StaticDirectory {
    pub fn new(owners: &[&str], devices: &[&str]) -> Self {
        Self {
            owners: owners.iter().map(|s| s.to_string()).collect(),
            devices: devices.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Every lookup fails as if the remote service were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer(&self, set: &HashSet<String>, id: &str) -> ServiceResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(ServiceError::Dependency("directory unavailable".into()));
        }
        Ok(set.contains(id))
    }
}

#[async_trait]
impl IdentityValidator for StaticDirectory {
    async fn owner_exists(&self, owner_id: &str, _credential: &Credential) -> ServiceResult<bool> {
        self.answer(&self.owners, owner_id)
    }

    async fn device_exists(
        &self,
        device_id: &str,
        _credential: &Credential,
    ) -> ServiceResult<bool> {
        self.answer(&self.devices, device_id)
    }
}

/// Stand-in for the remote owner directory and device registry.
#[derive(Clone)]
pub struct FakeDirectory {
    owners: Arc<HashSet<String>>,
    devices: Arc<HashSet<String>>,
}

impl FakeDirectory {
    pub const TOKEN: &'static str = "test-token";
    /// Answers 500.
    pub const BROKEN_ID: &'static str = "broken";
    /// Answers after one second.
    pub const SLOW_ID: &'static str = "slow";

    pub fn new(owners: &[&str], devices: &[&str]) -> Self {
        Self {
            owners: Arc::new(owners.iter().map(|s| s.to_string()).collect()),
            devices: Arc::new(devices.iter().map(|s| s.to_string()).collect()),
        }
    }
}

/// Serve `directory` on a random local port and return its base URL.
pub async fn spawn_fake_directory(directory: FakeDirectory) -> String {
    async fn lookup(set: &HashSet<String>, headers: &HeaderMap, id: &str) -> StatusCode {
        let expected = format!("Bearer {}", FakeDirectory::TOKEN);
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str())
        {
            return StatusCode::UNAUTHORIZED;
        }
        match id {
            FakeDirectory::BROKEN_ID => StatusCode::INTERNAL_SERVER_ERROR,
            FakeDirectory::SLOW_ID => {
                tokio::time::sleep(Duration::from_secs(1)).await;
                StatusCode::OK
            }
            id if set.contains(id) => StatusCode::OK,
            _ => StatusCode::NOT_FOUND,
        }
    }

    async fn user(
        State(dir): State<FakeDirectory>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> StatusCode {
        lookup(&dir.owners, &headers, &id).await
    }

    async fn device(
        State(dir): State<FakeDirectory>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> StatusCode {
        lookup(&dir.devices, &headers, &id).await
    }

    let app = Router::new()
        .route("/api/users/{id}", get(user))
        .route("/api/devices/{id}", get(device))
        .with_state(directory);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}
