//! HTTP server: the exported site, the dashboard and optional live reload

mod auth;
mod dashboard;

pub use auth::TOKEN_COOKIE;

use anyhow::Result;
use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{Request, StatusCode},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::is_safe_file_slug;
use crate::generator::Generator;
use crate::helpers;
use crate::templates::TemplateRenderer;
use crate::{Blog, CONFIG_FILE};

/// Live reload script injected into HTML pages
const LIVE_RELOAD_SCRIPT: &str = r#"
<script>
(function() {
    var ws = new WebSocket('ws://' + location.host + '/__livereload');
    ws.onmessage = function(msg) {
        if (msg.data === 'reload') {
            location.reload();
        }
    };
    ws.onclose = function() {
        console.log('Live reload disconnected. Attempting to reconnect...');
        setTimeout(function() { location.reload(); }, 1000);
    };
})();
</script>
</body>
"#;

/// Server state shared by all handlers
pub struct ServerState {
    generator: Generator,
    reload_tx: broadcast::Sender<()>,
    live_reload: bool,
    /// Held for the length of a regeneration so dashboard writes and the
    /// file watcher never rebuild `public/` at the same time
    generating: Mutex<()>,
}

pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(generator: Generator, live_reload: bool) -> Self {
        let (reload_tx, _) = broadcast::channel::<()>(16);
        Self {
            generator,
            reload_tx,
            live_reload,
            generating: Mutex::new(()),
        }
    }

    pub fn blog(&self) -> &Blog {
        self.generator.blog()
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        self.generator.renderer()
    }

    /// Rebuild the exported site and tell open pages to reload.
    ///
    /// Blocks: call from the watcher thread or through [`regenerate_blocking`].
    pub fn regenerate(&self) {
        match self.try_regenerate() {
            Ok(()) => {
                let _ = self.reload_tx.send(());
            }
            Err(e) => tracing::error!("Regeneration failed: {:#}", e),
        }
    }

    fn try_regenerate(&self) -> Result<()> {
        let _guard = self
            .generating
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.generator.generate()
    }

    /// Turn a handler result into a response, rendering errors as dashboard pages
    fn respond(&self, result: crate::Result<Response>) -> Response {
        match result {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!("Dashboard request failed: {}", error);
                dashboard::error_page(self, &error).unwrap_or_else(|render_error| {
                    tracing::error!("Failed to render error page: {}", render_error);
                    (error.status_code(), error.to_string()).into_response()
                })
            }
        }
    }
}

/// Regenerate on the blocking pool, for use from async handlers
pub(crate) async fn regenerate_blocking(state: &SharedState) {
    let state = state.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || state.regenerate()).await {
        tracing::error!("Regeneration task failed: {}", e);
    }
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    let dashboard = Router::new()
        .route("/dashboard", get(dashboard::home))
        .route(
            "/dashboard/posts/",
            get(dashboard::new_post_page).post(dashboard::create_post),
        )
        .route(
            "/dashboard/posts/edit/:slug",
            get(dashboard::edit_post_page).post(dashboard::update_post),
        )
        .route("/dashboard/posts/delete/:slug", post(dashboard::delete_post))
        .route(
            "/dashboard/settings",
            get(dashboard::settings_page).post(dashboard::save_settings),
        )
        .route("/dashboard/profile", get(dashboard::profile_page))
        .route(
            "/dashboard/profile/edit",
            get(dashboard::edit_profile_page).post(dashboard::save_profile),
        )
        .route_layer(middleware::from_fn(auth::require_token));

    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/__livereload", get(livereload_handler))
        .merge(dashboard)
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Regenerate the site, then serve it together with the dashboard
pub async fn start(blog: &Blog, ip: &str, port: u16, watch: bool, open: bool) -> Result<()> {
    let generator = Generator::new(blog)?;
    generator.generate()?;

    let state = Arc::new(ServerState::new(generator, watch));
    let app = router(state.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    println!("Dashboard at {}/dashboard", url);
    if watch {
        println!("Live reload enabled. Watching for changes...");
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    if watch {
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_reload(&state) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch the posts directory and config file, regenerating on change
fn watch_and_reload(state: &ServerState) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    let blog = state.blog();
    if blog.posts_dir.exists() {
        debouncer
            .watcher()
            .watch(&blog.posts_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", blog.posts_dir);
    }

    let config_path = blog.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        let path_str = e.path.to_string_lossy();
                        !path_str.contains(".git")
                            && !path_str.contains(".DS_Store")
                            && !path_str.ends_with('~')
                    })
                    .collect();

                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }
                state.regenerate();
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// WebSocket handler for live reload
async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let reload_rx = state.reload_tx.subscribe();
    ws.on_upgrade(move |socket| handle_livereload_socket(socket, reload_rx))
}

async fn handle_livereload_socket(mut socket: WebSocket, mut reload_rx: broadcast::Receiver<()>) {
    tracing::debug!("Live reload client connected");

    loop {
        tokio::select! {
            result = reload_rx.recv() => {
                match result {
                    Ok(_) => {
                        if socket.send(Message::Text("reload".to_string())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Live reload client disconnected");
}

/// Serve exported files, falling back to a live lookup for `/blog/...` pages
async fn fallback_handler(State(state): State<SharedState>, request: Request<Body>) -> Response {
    let public_dir = &state.blog().public_dir;
    let segments = helpers::decode_segments(request.uri().path());

    if segments.first().is_some_and(|s| s == "dashboard") {
        if !auth::has_token(request.headers()) {
            return Redirect::to("/login").into_response();
        }
        return state.respond(Err(crate::Error::NotFound(request.uri().path().to_string())));
    }

    let Some(file_path) = resolve_public_file(public_dir, &segments) else {
        return not_found(&state, &segments);
    };

    let is_html = file_path
        .extension()
        .map(|ext| ext == "html" || ext == "htm")
        .unwrap_or(false);

    if is_html {
        match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => state.html_page(content).into_response(),
            Err(e) => {
                tracing::error!("Failed to read {:?}: {}", file_path, e);
                not_found(&state, &segments)
            }
        }
    } else {
        let mut service = ServeDir::new(public_dir);
        match service.try_call(request).await {
            Ok(response) => response.into_response(),
            Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
        }
    }
}

impl ServerState {
    fn html_page(&self, content: String) -> Html<String> {
        if self.live_reload {
            Html(inject_live_reload(&content))
        } else {
            Html(content)
        }
    }
}

/// Render a post that is not exported yet, or the not-found page
fn not_found(state: &ServerState, segments: &[String]) -> Response {
    if let Some(("blog", slug)) = segments.split_first().map(|(first, rest)| (first.as_str(), rest)) {
        if !slug.is_empty() {
            if let Some(post) = state.blog().posts().find_by_segments(slug) {
                match state.generator.render_post(&post) {
                    Ok(html) => return state.html_page(html).into_response(),
                    Err(e) => tracing::error!("Failed to render post {:?}: {:#}", post.slug, e),
                }
            }
        }
    }

    let page = std::fs::read_to_string(state.blog().public_dir.join("404.html"))
        .map_err(anyhow::Error::from)
        .or_else(|_| state.generator.render_not_found(None));
    match page {
        Ok(html) => (StatusCode::NOT_FOUND, state.html_page(html)).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Map request path segments onto an existing file in the public directory
fn resolve_public_file(public_dir: &Path, segments: &[String]) -> Option<PathBuf> {
    let mut candidate = public_dir.to_path_buf();
    for segment in segments {
        if !is_safe_file_slug(segment) {
            return None;
        }
        candidate.push(segment);
    }

    if candidate.is_dir() {
        let index = candidate.join("index.html");
        return index.is_file().then_some(index);
    }
    if candidate.is_file() {
        return Some(candidate);
    }

    // Try adding .html extension
    let last = segments.last()?;
    let with_html = candidate.with_file_name(format!("{}.html", last));
    with_html.is_file().then_some(with_html)
}

/// Inject live reload script into HTML content
fn inject_live_reload(html: &str) -> String {
    if html.contains("</body>") {
        html.replace("</body>", LIVE_RELOAD_SCRIPT)
    } else {
        format!("{}{}", html, LIVE_RELOAD_SCRIPT)
    }
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
