//! In-memory reference implementation of the posts/users API
//!
//! Serves the endpoints the suite consumes so it can be exercised without
//! the real service. Behavior follows a json-server style API with an auth
//! layer: missing entities answer 404 with `{}`, registration returns an
//! access token, and the `/664/posts` route needs that token for writes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::distr::{Alphanumeric, SampleString};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::common::Result;

/// Number of posts the store starts with
pub const SEED_POSTS: i64 = 100;

/// Shortest password accepted by `/register`
pub const MIN_PASSWORD_LEN: usize = 4;

type Post = Map<String, Value>;

/// Mutable state behind the mock API
#[derive(Debug)]
pub struct MockStore {
    posts: BTreeMap<i64, Post>,
    /// Next server-assigned post id; never moves back, so deleted ids stay gone
    next_id: i64,
    users: Vec<(i64, String)>,
    emails: HashSet<String>,
    tokens: HashMap<String, i64>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            posts: BTreeMap::new(),
            next_id: 1,
            users: Vec::new(),
            emails: HashSet::new(),
            tokens: HashMap::new(),
        }
    }
}

impl MockStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding posts 1..=`count`, ten per user
    pub fn seeded(count: i64) -> Self {
        let mut store = Self::new();
        for id in 1..=count {
            let mut post = Map::new();
            post.insert("userId".to_string(), json!((id - 1) / 10 + 1));
            post.insert("id".to_string(), json!(id));
            post.insert("title".to_string(), json!(format!("seed post {}", id)));
            post.insert("body".to_string(), json!(format!("body of seed post {}", id)));
            store.posts.insert(id, post);
        }
        store.next_id = store.next_id.max(count.saturating_add(1));
        store
    }

    /// Store `post` under its own id when that id is free, else the next one
    ///
    /// Returns `None` when the id space is exhausted.
    fn insert_post(&mut self, mut post: Post) -> Option<Post> {
        let id = match post.get("id").and_then(Value::as_i64) {
            Some(id) if !self.posts.contains_key(&id) => id,
            _ => self.next_id,
        };
        self.next_id = self.next_id.max(id.checked_add(1)?);
        post.insert("id".to_string(), json!(id));
        self.posts.insert(id, post.clone());
        Some(post)
    }

    fn user_for_token(&self, headers: &HeaderMap) -> std::result::Result<i64, &'static str> {
        let header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or("Missing authorization header")?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or("Incorrect authorization header")?;
        self.tokens.get(token.trim()).copied().ok_or("jwt malformed")
    }
}

type SharedStore = Arc<Mutex<MockStore>>;

/// Router over a store seeded with [`SEED_POSTS`] posts
pub fn router() -> Router {
    router_with(MockStore::seeded(SEED_POSTS))
}

/// Router over the given store
pub fn router_with(store: MockStore) -> Router {
    let state: SharedStore = Arc::new(Mutex::new(store));
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(replace_post).delete(delete_post),
        )
        .route("/register", post(register))
        .route("/664/posts", get(list_posts).post(create_guarded_post))
        .with_state(state)
}

/// A mock API listening on a local port
pub struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Serve `router` on `addr` (port 0 picks a free port)
    pub async fn start(addr: SocketAddr, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "mock API listening");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("mock API stopped: {}", e);
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait until the server task ends
    pub async fn wait(mut self) {
        let _ = (&mut self.handle).await;
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({}))).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!(message))).into_response()
}

fn ids_exhausted() -> Response {
    bad_request("No post ids left")
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// GET /posts
async fn list_posts(State(store): State<SharedStore>) -> Json<Vec<Post>> {
    let store = store.lock().await;
    Json(store.posts.values().cloned().collect())
}

/// GET /posts/{id}
async fn get_post(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    let store = store.lock().await;
    match parse_id(&id).and_then(|id| store.posts.get(&id)) {
        Some(post) => Json(post.clone()).into_response(),
        None => not_found(),
    }
}

/// POST /posts
async fn create_post(State(store): State<SharedStore>, Json(body): Json<Value>) -> Response {
    let Value::Object(post) = body else {
        return bad_request("Body must be a JSON object");
    };
    let Some(created) = store.lock().await.insert_post(post) else {
        return ids_exhausted();
    };
    debug!(id = ?created.get("id"), "created post");
    (StatusCode::CREATED, Json(created)).into_response()
}

/// PUT /posts/{id}
async fn replace_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let Value::Object(mut post) = body else {
        return bad_request("Body must be a JSON object");
    };
    let mut store = store.lock().await;
    let Some(id) = parse_id(&id).filter(|id| store.posts.contains_key(id)) else {
        return not_found();
    };
    post.insert("id".to_string(), json!(id));
    store.posts.insert(id, post.clone());
    Json(post).into_response()
}

/// DELETE /posts/{id}
async fn delete_post(State(store): State<SharedStore>, Path(id): Path<String>) -> Response {
    let mut store = store.lock().await;
    match parse_id(&id).and_then(|id| store.posts.remove(&id)) {
        Some(_) => Json(json!({})).into_response(),
        None => not_found(),
    }
}

/// POST /register
async fn register(State(store): State<SharedStore>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or("");
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");

    if email.is_empty() || password.is_empty() {
        return bad_request("Email and password are required");
    }
    if !email.contains('@') {
        return bad_request("Email format is invalid");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return bad_request("Password is too short");
    }

    let mut store = store.lock().await;
    if !store.emails.insert(email.to_string()) {
        return bad_request("Email already exists");
    }

    let id = store.users.len() as i64 + 1;
    store.users.push((id, email.to_string()));
    let token = Alphanumeric.sample_string(&mut rand::rng(), 40);
    store.tokens.insert(token.clone(), id);
    info!(user_id = id, "registered user");

    (
        StatusCode::CREATED,
        Json(json!({
            "accessToken": token,
            "user": { "email": email, "id": id }
        })),
    )
        .into_response()
}

/// POST /664/posts
async fn create_guarded_post(
    State(store): State<SharedStore>,
    headers: HeaderMap,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let mut store = store.lock().await;
    let user_id = match store.user_for_token(&headers) {
        Ok(id) => id,
        Err(reason) => {
            debug!(reason, "rejected guarded write");
            return (StatusCode::UNAUTHORIZED, Json(json!(reason))).into_response();
        }
    };

    let Ok(Json(Value::Object(mut post))) = body else {
        return bad_request("Body must be a JSON object");
    };
    post.entry("userId").or_insert_with(|| json!(user_id));
    let Some(created) = store.insert_post(post) else {
        return ids_exhausted();
    };
    (StatusCode::CREATED, Json(created)).into_response()
}
