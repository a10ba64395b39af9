//! Comment list service: validates a page request, reads the store once,
//! and assembles the page.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::comment::CommentPageResult;
use crate::error::Result;
use crate::page::{self, PageLimits, PageRequest};
use crate::store::CommentStore;

/// Serves hierarchical comment pages from a [`CommentStore`].
pub struct CommentListService {
    store: Arc<dyn CommentStore>,
    limits: PageLimits,
    /// Held only around the store read, never around assembly.
    read_gate: Option<Mutex<()>>,
}

impl CommentListService {
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self {
            store,
            limits: PageLimits::default(),
            read_gate: None,
        }
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Serialize store reads across concurrent requests.
    pub fn with_serialized_reads(mut self, enabled: bool) -> Self {
        self.read_gate = enabled.then(|| Mutex::new(()));
        self
    }

    pub fn store(&self) -> &Arc<dyn CommentStore> {
        &self.store
    }

    pub fn limits(&self) -> &PageLimits {
        &self.limits
    }

    /// Fetch one page of primary comments with one page of replies each.
    ///
    /// Invalid arguments fail before any store access. A window with no
    /// comments is an empty page, not an error. Store failures are returned
    /// unchanged.
    pub async fn get_comment_list(&self, request: &PageRequest) -> Result<CommentPageResult> {
        let window = request.validate(&self.limits)?;
        let query = window.range_query();

        let fetch = {
            let _gate = match &self.read_gate {
                Some(gate) => Some(gate.lock().await),
                None => None,
            };
            self.store.find_range(query).await.inspect_err(|e| {
                warn!(
                    store = self.store.name(),
                    article_id = query.article_id,
                    error = %e,
                    "Comment range read failed"
                );
            })?
        };

        debug!(
            store = self.store.name(),
            article_id = window.article_id(),
            offset = window.offset(),
            primary_count = window.primary_count(),
            sub_count = window.sub_count(),
            found = fetch.found,
            primaries = fetch.primaries.len(),
            subs = fetch.subs.len(),
            "Comment range fetched"
        );

        Ok(page::assemble(&window, fetch))
    }
}
