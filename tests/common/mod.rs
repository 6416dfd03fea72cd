//! In-process stand-in for the albums gateway and notifications service.
//!
//! One axum server on `127.0.0.1:0` serves both the HTTP endpoints and
//! `/ws`. Every request is recorded as `"METHOD /path[?query]"` so tests can
//! assert on what the client actually sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use albums_client::config::Config;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};

pub const USER_EMAIL: &str = "user@example.com";
pub const USER_PASSWORD: &str = "secret";
pub const USER_JWT: &str = "user-jwt";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin";
pub const ADMIN_JWT: &str = "admin-jwt";
/// Logs in, but the response lacks `isAdmin`.
pub const BROKEN_EMAIL: &str = "broken@example.com";
pub const BROKEN_PASSWORD: &str = "broken";

/// Album id the gateway refuses to add.
pub const UNAVAILABLE_ALBUM: i64 = 666;
/// Entity id that does not exist.
pub const MISSING_ID: i64 = 404;
/// Total entries in the purchase log.
pub const LOGS_COUNT: u64 = 23;
pub const DUMP_FILENAME: &str = "dump-2024-05-01.sql";
pub const DUMP_BODY: &str = "-- albums dump\nINSERT INTO albums VALUES (10, 'Nevermind');\n";
/// Sent through the push channel to make the server close the socket.
pub const CLOSE_SIGNAL: &str = "__close__";

const USER_BASIC: &str = "Basic dXNlckBleGFtcGxlLmNvbTpzZWNyZXQ=";
const ADMIN_BASIC: &str = "Basic YWRtaW5AZXhhbXBsZS5jb206YWRtaW4=";
const BROKEN_BASIC: &str = "Basic YnJva2VuQGV4YW1wbGUuY29tOmJyb2tlbg==";

#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    /// Albums already sitting in an unpaid order.
    pub unpaid_albums: Vec<i64>,
    /// `POST /buy` answers 402.
    pub insufficient_funds: bool,
    /// `save-dump` omits `Content-Disposition`.
    pub dump_without_filename: bool,
}

pub struct MockState {
    options: MockOptions,
    hits: Mutex<Vec<String>>,
    unpaid: Mutex<Vec<i64>>,
    registrations: Mutex<Vec<Value>>,
    uploads: Mutex<Vec<String>>,
    push: broadcast::Sender<String>,
}

impl MockState {
    fn record(&self, hit: impl Into<String>) {
        self.hits.lock().unwrap().push(hit.into());
    }
}

pub struct MockGateway {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGateway {
    pub async fn start() -> Self {
        Self::start_with(MockOptions::default()).await
    }

    pub async fn start_with(options: MockOptions) -> Self {
        let (push, _) = broadcast::channel(64);
        let state = Arc::new(MockState {
            unpaid: Mutex::new(options.unpaid_albums.clone()),
            options,
            hits: Mutex::new(Vec::new()),
            registrations: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            push,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// HTTP and WebSocket share the port.
    pub fn config(&self) -> Config {
        Config::new("127.0.0.1", self.port(), self.port())
    }

    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self, hit: &str) -> usize {
        self.hits().iter().filter(|h| *h == hit).count()
    }

    pub fn registrations(&self) -> Vec<Value> {
        self.state.registrations.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.state.uploads.lock().unwrap().clone()
    }

    /// Broadcast a raw frame to every authenticated socket.
    pub fn push(&self, frame: &str) {
        let _ = self.state.push.send(frame.to_string());
    }

    /// Poll until `hit` has been recorded `count` times.
    pub async fn wait_for_hits(&self, hit: &str, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.hit_count(hit) < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {count} x {hit:?}; got {:?}", self.hits()));
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn build_router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/", post(catalog_handler))
        .route("/login", get(login_handler))
        .route("/logout", post(logout_handler))
        .route("/registration", post(registration_handler))
        .route("/search", post(search_handler))
        .route("/profile", get(profile_handler))
        .route("/artists/{id}", get(artist_handler))
        .route("/albums/{id}", get(album_handler))
        .route("/add/{id}", post(add_handler))
        .route("/remove/{id}", post(remove_handler))
        .route("/orders/", get(orders_handler))
        .route("/buy", post(buy_handler))
        .route("/deposit", post(deposit_handler))
        .route("/admin-panel/delete/{id}", delete(delete_handler))
        .route("/admin-panel/logs/{page}", get(logs_handler))
        .route("/admin-panel/save-dump", get(save_dump_handler))
        .route("/admin-panel/load-dump", post(load_dump_handler))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn is_valid_jwt(jwt: &str) -> bool {
    jwt == USER_JWT || jwt == ADMIN_JWT
}

fn authorize(headers: &HeaderMap) -> Result<&str, Response> {
    match bearer(headers) {
        Some(jwt) if is_valid_jwt(jwt) => Ok(jwt),
        _ => Err(error(StatusCode::UNAUTHORIZED, "unauthorized")),
    }
}

fn authorize_admin(headers: &HeaderMap) -> Result<(), Response> {
    match authorize(headers)? {
        ADMIN_JWT => Ok(()),
        _ => Err(error(StatusCode::FORBIDDEN, "admin only")),
    }
}

fn artist(id: i64) -> Value {
    json!({ "id": id, "name": format!("Artist {id}"), "genre": "rock", "imageURL": "" })
}

fn album(id: i64) -> Value {
    let name = if id == 10 { "Nevermind".to_string() } else { format!("Album {id}") };
    json!({ "id": id, "name": name, "price": 9.99, "imageURL": format!("https://img.example.com/{id}.png") })
}

fn order(id: i64, is_paid: bool, albums: &[i64]) -> Value {
    json!({
        "id": id,
        "totalPrice": 9.99 * albums.len() as f64,
        "isPaid": is_paid,
        "date": "2024-05-01T12:00:00+00:00",
        "albums": albums.iter().map(|id| album(*id)).collect::<Vec<_>>(),
    })
}

async fn catalog_handler(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record("POST /");
    let albums = body["albumsCount"].as_i64().unwrap_or(0);
    let artists = body["artistsCount"].as_i64().unwrap_or(0);
    Json(json!({
        "artists": (1..=artists).map(artist).collect::<Vec<_>>(),
        "albums": (10..10 + albums).map(album).collect::<Vec<_>>(),
    }))
    .into_response()
}

async fn login_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET /login");
    let basic = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    match basic {
        USER_BASIC => Json(json!({ "jwt": USER_JWT, "isAdmin": false })).into_response(),
        ADMIN_BASIC => Json(json!({ "jwt": ADMIN_JWT, "isAdmin": true })).into_response(),
        BROKEN_BASIC => Json(json!({ "jwt": "broken-jwt" })).into_response(),
        _ => error(StatusCode::UNAUTHORIZED, "wrong email or password"),
    }
}

async fn logout_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("POST /logout");
    match authorize(&headers) {
        Ok(_) => StatusCode::OK.into_response(),
        Err(resp) => resp,
    }
}

async fn registration_handler(
    State(state): State<Arc<MockState>>,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST /registration");
    if body["email"] == "taken@example.com" {
        return error(StatusCode::CONFLICT, "user already exists");
    }
    state.registrations.lock().unwrap().push(body);
    StatusCode::OK.into_response()
}

async fn search_handler(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record("POST /search");
    let query = body["query"].as_str().unwrap_or_default().to_lowercase();
    if query.contains("nevermind") || query.contains("nirvana") {
        Json(json!({ "artists": [artist(1)], "albums": [album(10)] })).into_response()
    } else {
        Json(json!({ "artists": [], "albums": [] })).into_response()
    }
}

async fn profile_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET /profile");
    let jwt = match authorize(&headers) {
        Ok(jwt) => jwt,
        Err(resp) => return resp,
    };
    let is_admin = jwt == ADMIN_JWT;
    Json(json!({
        "user": {
            "id": 5, "email": USER_EMAIL, "isAdmin": is_admin,
            "nickname": "kurt", "balance": 42.5, "imageURL": "-"
        },
        "purchasedAlbums": [album(11)],
    }))
    .into_response()
}

async fn artist_handler(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    state.record(format!("GET /artists/{id}"));
    if id == MISSING_ID {
        return error(StatusCode::NOT_FOUND, "artist not found");
    }
    Json(json!({ "artist": artist(id), "albums": [album(10), album(11)] })).into_response()
}

async fn album_handler(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Response {
    state.record(format!("GET /albums/{id}"));
    if id == MISSING_ID {
        return error(StatusCode::NOT_FOUND, "album not found");
    }
    let mut body = album(id);
    body["tracks"] = json!([
        { "number": 1, "name": "Smells Like Teen Spirit" },
        { "number": 2, "name": "In Bloom" },
    ]);
    body["author"] = artist(1);
    Json(json!({ "album": body })).into_response()
}

async fn add_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record(format!("POST /add/{id}"));
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    if id == UNAVAILABLE_ALBUM {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "album not available");
    }
    state.unpaid.lock().unwrap().push(id);
    StatusCode::OK.into_response()
}

async fn remove_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record(format!("POST /remove/{id}"));
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    state.unpaid.lock().unwrap().retain(|album| *album != id);
    StatusCode::OK.into_response()
}

async fn orders_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET /orders/");
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let unpaid = state.unpaid.lock().unwrap().clone();
    let mut orders = vec![order(1, true, &[11])];
    if !unpaid.is_empty() {
        orders.push(order(2, false, &unpaid));
    }
    Json(json!({ "orders": orders })).into_response()
}

async fn buy_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("POST /buy");
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    if state.options.insufficient_funds {
        return error(StatusCode::PAYMENT_REQUIRED, "not enough money");
    }
    state.unpaid.lock().unwrap().clear();
    StatusCode::OK.into_response()
}

async fn deposit_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("POST /deposit");
    if let Err(resp) = authorize(&headers) {
        return resp;
    }
    let money = body["money"].as_u64().unwrap_or(0);
    let note = json!({ "success": true, "message": format!("Deposit of {money} completed") });
    let _ = state.push.send(note.to_string());
    StatusCode::OK.into_response()
}

async fn delete_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    state.record(format!("DELETE /admin-panel/delete/{id}"));
    match authorize_admin(&headers) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(resp) => resp,
    }
}

async fn logs_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(page): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let page_size: u64 = query
        .get("pageSize")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    state.record(format!("GET /admin-panel/logs/{page}?pageSize={page_size}"));
    if let Err(resp) = authorize_admin(&headers) {
        return resp;
    }
    let first = (page.saturating_sub(1) * page_size).min(LOGS_COUNT);
    let last = (page * page_size).min(LOGS_COUNT);
    let logs: Vec<Value> = (first..last)
        .map(|n| {
            json!({
                "id": n,
                "buyer": { "id": 5, "nickname": format!("buyer{n}") },
                "album": album(100 + n as i64),
                "loggingTime": "2024-05-01T12:00:00Z",
            })
        })
        .collect();
    Json(json!({ "logs": logs, "logsCount": LOGS_COUNT })).into_response()
}

async fn save_dump_handler(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET /admin-panel/save-dump");
    if let Err(resp) = authorize_admin(&headers) {
        return resp;
    }
    if state.options.dump_without_filename {
        return DUMP_BODY.into_response();
    }
    (
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={DUMP_FILENAME}"),
        )],
        DUMP_BODY,
    )
        .into_response()
}

async fn load_dump_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record("POST /admin-panel/load-dump");
    if let Err(resp) = authorize_admin(&headers) {
        return resp;
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("multipart/form-data") {
        return error(StatusCode::BAD_REQUEST, "expected multipart body");
    }
    state
        .uploads
        .lock()
        .unwrap()
        .push(String::from_utf8_lossy(&body).into_owned());
    StatusCode::OK.into_response()
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<MockState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Expects `{"jwt": ...}` first, then forwards pushed frames until the
/// client leaves or [`CLOSE_SIGNAL`] is pushed.
async fn handle_socket(socket: WebSocket, state: Arc<MockState>) {
    let (mut sender, mut receiver) = socket.split();

    let jwt = match receiver.next().await {
        Some(Ok(Message::Text(text))) => serde_json::from_str::<Value>(text.as_str())
            .ok()
            .and_then(|v| v["jwt"].as_str().map(str::to_string))
            .unwrap_or_default(),
        _ => return,
    };
    if !is_valid_jwt(&jwt) {
        state.record("WS rejected");
        let reply = json!({ "error": "unable to authorize" }).to_string();
        let _ = sender.send(Message::Text(reply.into())).await;
        let _ = sender.send(Message::Close(None)).await;
        return;
    }

    let mut rx = state.push.subscribe();
    state.record(format!("WS auth {jwt}"));

    loop {
        tokio::select! {
            pushed = rx.recv() => match pushed {
                Ok(frame) if frame == CLOSE_SIGNAL => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
                Ok(frame) => {
                    if sender.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                    state.record("WS closed by client");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}
