//! Process-wide tool catalog cache.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::Result;
use crate::types::ToolDescriptor;

use super::ToolGateway;

/// Catalog fetched once from the gateway and shared by every session.
///
/// Concurrent first callers wait on a single fetch. A failed fetch leaves the
/// cache empty so the next caller tries again. Entries are never invalidated.
#[derive(Clone)]
pub struct CatalogCache {
    gateway: Arc<dyn ToolGateway>,
    catalog: Arc<OnceCell<Arc<Vec<ToolDescriptor>>>>,
}

impl CatalogCache {
    pub fn new(gateway: Arc<dyn ToolGateway>) -> Self {
        Self {
            gateway,
            catalog: Arc::new(OnceCell::new()),
        }
    }

    /// Cached catalog, fetching it on first use.
    pub async fn tools(&self) -> Result<Arc<Vec<ToolDescriptor>>> {
        let catalog = self
            .catalog
            .get_or_try_init(|| async {
                let tools = self.gateway.list_tools().await?;
                tracing::debug!(count = tools.len(), "tool catalog cached");
                Ok::<_, crate::error::HostError>(Arc::new(tools))
            })
            .await?;
        Ok(Arc::clone(catalog))
    }

    pub fn is_populated(&self) -> bool {
        self.catalog.initialized()
    }

    pub fn gateway(&self) -> &Arc<dyn ToolGateway> {
        &self.gateway
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("populated", &self.is_populated())
            .finish()
    }
}
