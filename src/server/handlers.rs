//! Route handlers

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use super::{AppError, AppState, SESSION_COOKIE};
use crate::listing::Session;

/// Preview ref carried by the request, if any
fn preview_ref(state: &AppState, jar: &CookieJar) -> Option<String> {
    jar.get(&state.config.preview.cookie)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

async fn current_session(state: &AppState, jar: &CookieJar) -> Option<Arc<Session>> {
    let id = jar.get(SESSION_COOKIE)?;
    state.sessions.get(id.value()).await
}

fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// `GET /`
pub async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let preview = preview_ref(&state, &jar);

    let listing = match state.listing.first_page(preview.as_deref()).await {
        Ok(listing) => listing,
        Err(e) => return state.error_page(e.into(), preview.is_some()),
    };

    let html = match state.render_listing(&listing, preview.is_some(), None) {
        Ok(html) => html,
        Err(e) => return state.error_page(e, preview.is_some()),
    };

    // A visitor coming back to the listing starts over in the session they hold
    if let Some(session) = current_session(&state, &jar).await {
        session.reset(listing).await;
        return Html(html).into_response();
    }

    let id = state.sessions.create(listing).await;
    tracing::debug!("New listing session, {} held", state.sessions.len().await);
    (jar.add(session_cookie(id)), Html(html)).into_response()
}

/// `POST /posts/more`
pub async fn load_more(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let preview = preview_ref(&state, &jar);

    let Some(session) = current_session(&state, &jar).await else {
        tracing::debug!("Load more without a live session, starting over");
        return Redirect::to("/").into_response();
    };

    let mut listing = match session.try_begin() {
        Ok(guard) => guard,
        Err(busy) => return state.error_page(busy.into(), preview.is_some()),
    };

    let (status, notice) = match state.listing.load_more(&listing).await {
        Ok(next) => {
            *listing = next;
            (StatusCode::OK, None)
        }
        Err(e) => {
            tracing::warn!("Keeping {} loaded posts after failure: {}", listing.posts().len(), e);
            (StatusCode::BAD_GATEWAY, Some(state.i18n.get("load_more_failed")))
        }
    };

    match state.render_listing(&listing, preview.is_some(), notice) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => state.error_page(e, preview.is_some()),
    }
}

/// `GET /post/:uid`
pub async fn show_post(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    jar: CookieJar,
) -> Response {
    let preview = preview_ref(&state, &jar);

    let view = match state.detail.render(&uid, preview.as_deref()).await {
        Ok(Some(view)) => view,
        Ok(None) => return state.error_page(AppError::NotFound, preview.is_some()),
        Err(e) => return state.error_page(e.into(), preview.is_some()),
    };

    let mut context = state.context(preview.is_some());
    context.insert("post", &view);
    match state.renderer.render("post.html", &context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => state.error_page(e.into(), preview.is_some()),
    }
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    token: Option<String>,
    redirect: Option<String>,
}

/// Only same-site absolute paths are followed
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// `GET /api/preview`
pub async fn enter_preview(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PreviewParams>,
    jar: CookieJar,
) -> Response {
    let Some(token) = params.token.filter(|token| !token.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing preview token").into_response();
    };

    let target = params
        .redirect
        .filter(|path| is_local_path(path))
        .unwrap_or_else(|| "/".to_string());

    tracing::info!("Entering preview, redirecting to {}", target);
    let cookie = Cookie::build((state.config.preview.cookie.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    (jar.add(cookie), Redirect::temporary(&target)).into_response()
}

/// `GET /api/exit-preview`
pub async fn exit_preview(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let cookie = Cookie::build((state.config.preview.cookie.clone(), ""))
        .path("/")
        .build();
    (jar.remove(cookie), Redirect::temporary("/")).into_response()
}
