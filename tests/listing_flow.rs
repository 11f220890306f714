use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use spacetraveling::config::SiteConfig;
use spacetraveling::content::{ContentSection, Cursor, PageResult, PostDetail, PostSummary, RichTextFragment};
use spacetraveling::i18n::I18n;
use spacetraveling::server::{router, AppState, SESSION_COOKIE};
use spacetraveling::source::{ContentSource, FetchError, MemorySource, PublicationOrder};

fn post(n: u32) -> PostDetail {
    PostDetail {
        id: format!("doc-{}", n),
        uid: format!("post-{}", n),
        first_publication_date: Some(Utc.with_ymd_and_hms(2021, 3, n, 12, 0, 0).unwrap()),
        last_publication_date: None,
        title: format!("Title {}", n),
        subtitle: format!("Subtitle {}", n),
        banner: None,
        author: "Author".to_string(),
        content: vec![ContentSection {
            heading: "Heading".to_string(),
            body: vec![RichTextFragment::paragraph(vec!["word"; 250].join(" "))],
        }],
    }
}

fn state_with(source: Arc<dyn ContentSource>, public_dir: PathBuf) -> Arc<AppState> {
    let config = SiteConfig {
        revalidate: 0,
        ..SiteConfig::default()
    };
    let i18n = I18n::new(&config.language);
    Arc::new(AppState::new(config, source, i18n, public_dir).unwrap())
}

fn app(posts: Vec<PostDetail>) -> (Router, Arc<AppState>) {
    let state = state_with(
        Arc::new(MemorySource::new(posts)),
        PathBuf::from("does-not-exist"),
    );
    (router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn load_more(cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/posts/more");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` of the first Set-Cookie header
fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn load_more_appends_in_order() {
    let (app, _) = app(vec![post(1), post(2), post(3)]);

    let response = send(&app, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with(SESSION_COOKIE));

    let html = body(response).await;
    assert!(html.contains("Title 3"));
    assert!(!html.contains("Title 2"));
    assert!(html.contains("Carregar mais posts"));

    let response = send(&app, load_more(Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    let newest = html.find("Title 3").unwrap();
    let second = html.find("Title 2").unwrap();
    assert!(newest < second);
    assert!(!html.contains("Title 1"));
    assert!(html.contains("Carregar mais posts"));

    let response = send(&app, load_more(Some(&cookie))).await;
    let html = body(response).await;
    assert!(html.contains("Title 1"));
    assert!(!html.contains("Carregar mais posts"));

    // Exhausted: nothing is fetched and the listing stays as it is
    let response = send(&app, load_more(Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert_eq!(html.matches("class=\"post-card\"").count(), 3);
}

#[tokio::test]
async fn returning_visitor_keeps_one_session() {
    let (app, state) = app(vec![post(1), post(2), post(3)]);

    let response = send(&app, get("/", None)).await;
    let cookie = set_cookie(&response);
    send(&app, load_more(Some(&cookie))).await;

    let response = send(&app, get("/", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(state.sessions.len().await, 1);

    // The listing starts over from the first page
    let html = body(response).await;
    assert!(html.contains("Title 3"));
    assert!(!html.contains("Title 2"));

    let html = body(send(&app, load_more(Some(&cookie))).await).await;
    assert_eq!(html.matches("class=\"post-card\"").count(), 2);

    // Visitors without the cookie each get their own session
    send(&app, get("/", None)).await;
    assert_eq!(state.sessions.len().await, 2);
}

#[tokio::test]
async fn single_page_hides_load_more() {
    let (app, _) = app(vec![post(1)]);
    let html = body(send(&app, get("/", None)).await).await;
    assert!(html.contains("Title 1"));
    assert!(!html.contains("Carregar mais posts"));
}

#[tokio::test]
async fn empty_listing() {
    let (app, _) = app(Vec::new());
    let html = body(send(&app, get("/", None)).await).await;
    assert!(html.contains("Nenhum post publicado ainda."));
    assert!(!html.contains("Carregar mais posts"));
}

#[tokio::test]
async fn load_more_without_session_starts_over() {
    let (app, _) = app(vec![post(1), post(2)]);

    let response = send(&app, load_more(None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookie = format!("{}=unknown", SESSION_COOKIE);
    let response = send(&app, load_more(Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn overlapping_load_more_is_refused() {
    let (app, state) = app(vec![post(1), post(2), post(3)]);

    let response = send(&app, get("/", None)).await;
    let cookie = set_cookie(&response);
    let id = cookie.split_once('=').unwrap().1.to_string();

    let session = state.sessions.get(&id).await.unwrap();
    let guard = session.try_begin().unwrap();

    let response = send(&app, load_more(Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body(response).await.contains("Já estamos carregando mais posts."));

    drop(guard);
    let response = send(&app, load_more(Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Serves the first page, fails every cursor fetch
struct BrokenCursors(MemorySource);

#[async_trait]
impl ContentSource for BrokenCursors {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn first_page(
        &self,
        page_size: usize,
        preview: Option<&str>,
    ) -> Result<PageResult, FetchError> {
        self.0.first_page(page_size, preview).await
    }

    async fn fetch_cursor(&self, cursor: &Cursor) -> Result<PageResult, FetchError> {
        Err(FetchError::Status {
            status: 503,
            url: cursor.to_string(),
        })
    }

    async fn get_post(
        &self,
        uid: &str,
        preview: Option<&str>,
    ) -> Result<Option<PostDetail>, FetchError> {
        self.0.get_post(uid, preview).await
    }

    async fn adjacent_post(
        &self,
        _document_id: &str,
        _order: PublicationOrder,
        _preview: Option<&str>,
    ) -> Result<Option<PostSummary>, FetchError> {
        Err(FetchError::MissingRef)
    }
}

#[tokio::test]
async fn failed_load_keeps_prior_posts() {
    let state = state_with(
        Arc::new(BrokenCursors(MemorySource::new(vec![post(1), post(2)]))),
        PathBuf::from("does-not-exist"),
    );
    let app = router(state);

    let response = send(&app, get("/", None)).await;
    let cookie = set_cookie(&response);

    for _ in 0..2 {
        let response = send(&app, load_more(Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let html = body(response).await;
        assert!(html.contains("Title 2"));
        assert!(!html.contains("Title 1"));
        assert!(html.contains("Não foi possível carregar mais posts."));
        // Retry stays possible
        assert!(html.contains("Carregar mais posts"));
    }

    // Detail fetch failures surface as a gateway error page
    let response = send(&app, get("/post/post-2", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn post_page() {
    let (app, _) = app(vec![post(1), post(2), post(3)]);

    let response = send(&app, get("/post/post-2", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;

    assert!(html.contains("<title>Title 2 | spacetraveling</title>"));
    assert!(html.contains("02 mar 2021"));
    assert!(html.contains("2 min"));
    assert!(html.contains(r#"href="/post/post-1""#));
    assert!(html.contains(r#"href="/post/post-3""#));
    assert!(html.contains("Post anterior"));
    assert!(html.contains("Próximo post"));
    assert_eq!(html.matches("utteranc.es/client.js").count(), 1);
    assert!(html.contains(r#"data-thread="/post/post-2""#));
    assert!(!html.contains("/api/exit-preview"));
}

#[tokio::test]
async fn post_page_at_the_edges() {
    let (app, _) = app(vec![post(1), post(2)]);

    let html = body(send(&app, get("/post/post-2", None)).await).await;
    assert!(html.contains("Post anterior"));
    assert!(!html.contains("Próximo post"));

    let html = body(send(&app, get("/post/post-1", None)).await).await;
    assert!(!html.contains("Post anterior"));
    assert!(html.contains("Próximo post"));
}

#[tokio::test]
async fn unknown_post_is_not_found() {
    let (app, _) = app(vec![post(1)]);

    let response = send(&app, get("/post/nope", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body(response).await.contains("Post não encontrado"));
}

#[tokio::test]
async fn preview_cookie_round_trip() {
    let (app, _) = app(vec![post(1)]);

    let response = send(
        &app,
        get("/api/preview?token=preview-ref&redirect=/post/post-1", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/post/post-1");
    let cookie = set_cookie(&response);
    assert_eq!(cookie, "spacetraveling.preview=preview-ref");

    let html = body(send(&app, get("/post/post-1", Some(&cookie))).await).await;
    assert!(html.contains("Sair do modo Preview"));
    assert!(html.contains(r#"href="/api/exit-preview""#));

    let html = body(send(&app, get("/", Some(&cookie))).await).await;
    assert!(html.contains("Sair do modo Preview"));

    let response = send(&app, get("/api/exit-preview", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/");
    assert_eq!(set_cookie(&response), "spacetraveling.preview=");
}

#[tokio::test]
async fn preview_only_redirects_locally() {
    let (app, _) = app(vec![post(1)]);

    let response = send(
        &app,
        get("/api/preview?token=preview-ref&redirect=//evil.example", None),
    )
    .await;
    assert_eq!(location(&response), "/");

    let response = send(&app, get("/api/preview?redirect=/", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn static_files_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("styles.css"), "body {}").unwrap();

    let state = state_with(
        Arc::new(MemorySource::new(Vec::new())),
        dir.path().to_path_buf(),
    );
    let app = router(state);

    let response = send(&app, get("/styles.css", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await, "body {}");

    let response = send(&app, get("/missing.css", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
