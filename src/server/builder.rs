//! ServerBuilder for fluent API to build HTTP servers

use super::host::AppState;
use super::router::build_routes;
use crate::core::catalog::Catalog;
use crate::core::service::{OrderService, ProductService};
use crate::extraction::OrderExtractor;
use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the order desk HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_order_service(InMemoryOrderStore::new())
///     .with_product_service(InMemoryProductStore::new())
///     .with_catalog(Catalog::default_catalog()?)
///     .build()?;
/// ```
pub struct ServerBuilder {
    order_service: Option<Arc<dyn OrderService>>,
    product_service: Option<Arc<dyn ProductService>>,
    extractor: Option<Arc<dyn OrderExtractor>>,
    catalog: Option<Catalog>,
    cors_origins: Vec<String>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            order_service: None,
            product_service: None,
            extractor: None,
            catalog: None,
            cors_origins: Vec::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Set the order store (required)
    pub fn with_order_service(mut self, service: impl OrderService + 'static) -> Self {
        self.order_service = Some(Arc::new(service));
        self
    }

    /// Set the product store (required)
    pub fn with_product_service(mut self, service: impl ProductService + 'static) -> Self {
        self.product_service = Some(Arc::new(service));
        self
    }

    /// Enable `/extract-order`
    pub fn with_extractor(mut self, extractor: Arc<dyn OrderExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Products to seed into an empty product store
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Browser origins allowed to call the API
    pub fn with_cors_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cors_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Add routes outside the order desk API
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Seed the configured catalog into the product store
    ///
    /// Does nothing when the store already holds products or no catalog was
    /// given. Returns how many products were inserted.
    pub async fn seed_catalog(&self) -> Result<usize> {
        let (Some(products), Some(catalog)) = (&self.product_service, &self.catalog) else {
            return Ok(0);
        };

        let added = products
            .seed(catalog.list())
            .await
            .context("Failed to seed product catalog")?;
        if added > 0 {
            tracing::info!(products = added, "product catalog seeded");
        }
        Ok(added)
    }

    /// Build the shared handler state
    pub fn build_state(&self) -> Result<AppState> {
        let orders = self
            .order_service
            .clone()
            .ok_or_else(|| anyhow::anyhow!("OrderService is required. Call .with_order_service()"))?;
        let products = self.product_service.clone().ok_or_else(|| {
            anyhow::anyhow!("ProductService is required. Call .with_product_service()")
        })?;

        let mut state = AppState::new(orders, products);
        if let Some(extractor) = &self.extractor {
            state = state.with_extractor(extractor.clone());
        }
        Ok(state)
    }

    /// Build the final router with CORS and request tracing applied
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;
        let cors = self.cors_layer()?;

        let mut app = build_routes(state);
        for custom_router in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom_router);
        }

        Ok(app.layer(cors).layer(TraceLayer::new_for_http()))
    }

    fn cors_layer(&self) -> Result<CorsLayer> {
        let origins = self
            .cors_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid CORS origin '{}'", origin))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .allow_credentials(true))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Seed the catalog if the product store is empty
    /// - Bind to the provided address
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        self.seed_catalog().await?;
        let app = self.build()?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
