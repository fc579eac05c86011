//! Shared state handed to every HTTP handler

use crate::core::service::{OrderService, ProductService};
use crate::extraction::OrderExtractor;
use std::sync::Arc;

/// Application state shared across handlers
///
/// Cheap to clone: every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderService>,
    pub products: Arc<dyn ProductService>,
    /// `None` when no model endpoint is configured
    pub extractor: Option<Arc<dyn OrderExtractor>>,
}

impl AppState {
    pub fn new(orders: Arc<dyn OrderService>, products: Arc<dyn ProductService>) -> Self {
        Self {
            orders,
            products,
            extractor: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn OrderExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }
}
