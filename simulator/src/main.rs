mod telemetry;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use clap::Parser;
use serde::Deserialize;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use telemetry::{generate_reading, SockReading};
use tracing::{debug, error, info, warn};

/// Mock vendor cloud serving synthetic sock telemetry.
#[derive(Debug, Parser)]
#[command(name = "simulator")]
struct Args {
    #[arg(long, env = "SIM_ADDR", default_value = "127.0.0.1:8090")]
    addr: String,

    #[arg(long, env = "OWLET_EMAIL", default_value = "parent@example.com")]
    email: String,

    #[arg(long, env = "OWLET_PASSWORD", default_value = "password")]
    password: String,

    /// Number of sock monitors on the account
    #[arg(long, env = "SIM_DEVICES", default_value_t = 1)]
    devices: usize,

    /// Null readings served before each live one
    #[arg(long, env = "SIM_SETTLE_POLLS", default_value_t = 0)]
    settle_polls: u64,
}

/// Tokens accepted by the simulator. Oldest tokens are forgotten once the
/// store is full, since every status request signs in again.
struct TokenStore {
    capacity: usize,
    tokens: Mutex<VecDeque<String>>,
}

impl TokenStore {
    const DEFAULT_CAPACITY: usize = 64;

    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tokens: Mutex::new(VecDeque::new()),
        }
    }

    fn issue(&self) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        if let Ok(mut tokens) = self.tokens.lock() {
            while tokens.len() >= self.capacity {
                tokens.pop_front();
            }
            tokens.push_back(token.clone());
        }
        token
    }

    fn contains(&self, token: &str) -> bool {
        self.tokens
            .lock()
            .map(|tokens| tokens.iter().any(|t| t == token))
            .unwrap_or(false)
    }

    fn len(&self) -> usize {
        self.tokens.lock().map(|tokens| tokens.len()).unwrap_or(0)
    }
}

struct SimState {
    email: String,
    password: String,
    tokens: TokenStore,
    dsns: Vec<String>,
    settle_polls: u64,
    polls: AtomicU64,
}

impl SimState {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(token) = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("auth_token "))
        else {
            return false;
        };

        self.tokens.contains(token)
    }

    fn settling(&self) -> bool {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        self.settle_polls > 0 && poll % (self.settle_polls + 1) < self.settle_polls
    }
}

type SharedState = Arc<SimState>;

#[derive(Debug, Deserialize)]
struct SignInRequest {
    user: SignInUser,
}

#[derive(Debug, Deserialize)]
struct SignInUser {
    email: String,
    password: String,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    info!("Starting vendor cloud simulator");
    info!(
        "Address: {}, Devices: {}, Settle polls: {}",
        args.addr, args.devices, args.settle_polls
    );

    let dsns = (0..args.devices.max(1))
        .map(|i| format!("AC000W{:06}", 100 + i))
        .collect();

    let state = Arc::new(SimState {
        email: args.email,
        password: args.password,
        tokens: TokenStore::new(TokenStore::DEFAULT_CAPACITY),
        dsns,
        settle_polls: args.settle_polls,
        polls: AtomicU64::new(0),
    });

    let app = Router::new()
        .route("/users/sign_in.json", post(sign_in))
        .route("/apiv1/devices.json", get(devices))
        .route("/apiv1/dsns/:dsn/properties.json", get(properties))
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(&args.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", args.addr, e);
            std::process::exit(1);
        }
    };

    info!("Simulator listening on {}", args.addr);

    tokio::select! {
        result = async { axum::serve(listener, app).await } => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }
}

async fn sign_in(State(state): State<SharedState>, Json(req): Json<SignInRequest>) -> Response {
    if req.user.email != state.email || req.user.password != state.password {
        warn!("Rejected sign-in for {}", req.user.email);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid email or password" })),
        )
            .into_response();
    }

    let token = state.tokens.issue();
    debug!(
        "Issued token for {} ({} live)",
        req.user.email,
        state.tokens.len()
    );
    Json(json!({
        "access_token": token,
        "refresh_token": uuid::Uuid::new_v4().simple().to_string(),
        "expires_in": 86400,
        "role": "EndUser",
    }))
    .into_response()
}

async fn devices(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let mut list: Vec<_> = state
        .dsns
        .iter()
        .map(|dsn| {
            json!({
                "device": {
                    "dsn": dsn,
                    "product_name": "Dream Sock",
                    "model": "SS3",
                    "connection_status": "Online",
                }
            })
        })
        .collect();

    // A camera on the same account, which the client must skip.
    list.insert(
        0,
        json!({
            "device": {
                "dsn": "OC000C000001",
                "product_name": "Owlet Cam",
                "model": "OC2",
                "connection_status": "Online",
            }
        }),
    );

    Json(list).into_response()
}

async fn properties(
    State(state): State<SharedState>,
    Path(dsn): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    if !state.dsns.contains(&dsn) {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "device not found" })))
            .into_response();
    }

    let reading = if state.settling() {
        SockReading::settling()
    } else {
        generate_reading(&mut rand::thread_rng())
    };

    debug!("Serving {:?} for {}", reading, dsn);
    Json(reading.properties(&dsn, Utc::now())).into_response()
}
