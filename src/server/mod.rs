//! Web server
//!
//! Pages are rendered per request from the content source. The listing keeps
//! one session per visitor so "load more" can append to what the visitor
//! already sees; everything that is not a route is served from the public
//! directory.

mod error;
mod handlers;

pub use error::AppError;

use anyhow::Result;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tera::Context;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::detail::DetailRenderer;
use crate::i18n::I18n;
use crate::listing::{ListingController, ListingState, SessionStore};
use crate::source::ContentSource;
use crate::templates::{base_context, ListingView, SiteData, TemplateRenderer};
use crate::Blog;

/// Cookie holding the listing session id
pub const SESSION_COOKIE: &str = "listing_session";

/// Shared state of the web application
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub listing: ListingController,
    pub detail: DetailRenderer,
    pub sessions: SessionStore,
    pub renderer: TemplateRenderer,
    pub i18n: I18n,
    pub public_dir: PathBuf,
    site: SiteData,
    translations: HashMap<String, String>,
}

impl AppState {
    pub fn new(
        config: SiteConfig,
        source: Arc<dyn ContentSource>,
        i18n: I18n,
        public_dir: PathBuf,
    ) -> Result<Self> {
        let config = Arc::new(config);

        Ok(Self {
            listing: ListingController::new(source.clone(), config.page_size()),
            detail: DetailRenderer::new(source, config.clone()),
            sessions: SessionStore::new(
                Duration::from_secs(config.session_ttl),
                config.max_sessions,
            ),
            renderer: TemplateRenderer::new()?,
            site: SiteData::from(config.as_ref()),
            translations: i18n.get_all_translations(),
            i18n,
            public_dir,
            config,
        })
    }

    /// State for a site directory, with its configured content source
    pub fn from_blog(blog: &Blog) -> Result<Self> {
        Self::new(
            blog.config.clone(),
            blog.content_source()?,
            blog.i18n()?,
            blog.public_dir.clone(),
        )
    }

    fn context(&self, preview: bool) -> Context {
        base_context(&self.site, &self.translations, preview)
    }

    fn render_listing(
        &self,
        listing: &ListingState,
        preview: bool,
        notice: Option<String>,
    ) -> Result<String, AppError> {
        let mut context = self.context(preview);
        context.insert("listing", &ListingView::new(listing, &self.config, notice));
        Ok(self.renderer.render("index.html", &context)?)
    }

    /// Themed page for a failed request
    fn error_page(&self, error: AppError, preview: bool) -> Response {
        let status = error.status();
        if status.is_server_error() {
            tracing::error!("{}", error);
        } else {
            tracing::debug!("{}", error);
        }

        let mut context = self.context(preview);
        let template = match error {
            AppError::NotFound => "not_found.html",
            _ => {
                context.insert("message", &self.i18n.get(error.message_key()));
                "error.html"
            }
        };

        match self.renderer.render(template, &context) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                tracing::error!("Failed to render {}: {}", template, e);
                error.into_response()
            }
        }
    }
}

/// Routes of the blog
pub fn router(state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&state.public_dir);

    Router::new()
        .route("/", get(handlers::index))
        .route("/posts/more", post(handlers::load_more))
        .route("/post/:uid", get(handlers::show_post))
        .route("/api/preview", get(handlers::enter_preview))
        .route("/api/exit-preview", get(handlers::exit_preview))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let state = Arc::new(AppState::from_blog(blog)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
