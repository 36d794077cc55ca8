use std::sync::Arc;

use sqlx::SqlitePool;

use crate::db::{Repository, SqliteRepository};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub fn sqlite(db: SqlitePool) -> Self {
        Self::new(Arc::new(SqliteRepository::new(db)))
    }
}
