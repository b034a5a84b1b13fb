use std::sync::Arc;

use crate::shared::data::cache::DataCache;
use crate::shared::data::source::TableSource;

pub mod handlers;

/// Состояние приложения, прокидывается в хендлеры через axum State
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DataCache>,
    /// Прямой доступ к источнику, мимо кэша (диагностика соединения)
    pub source: Arc<dyn TableSource>,
}
