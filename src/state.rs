use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Db;
use crate::services::notifications::Notifier;

pub struct AppState {
    pub db: Db,
    pub config: AppConfig,
    pub notifier: Arc<dyn Notifier>,
}
