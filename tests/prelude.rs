//! Shared harness for the black-box daemon specs.
//!
//! Each spec spins up two in-process mock HTTP servers (object store,
//! mediator), writes a staging tree plus fake tool binaries under a
//! temp directory, then drives the real compiled `osmdbtd` binary via
//! `assert_cmd`. Nothing here talks to the engine directly — these
//! tests exercise the wired-together process exactly as an operator
//! would run it.

#![allow(dead_code)]

use assert_cmd::Command;
use axum::body::Bytes;
use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::fs::Permissions;
use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const WAIT_MAX_MS: u64 = 5_000;

#[derive(Default)]
pub struct ObjectStoreState {
    pub objects: HashMap<String, Vec<u8>>,
}

#[derive(Default)]
pub struct MediatorState {
    pub actions: HashMap<String, serde_json::Value>,
    pub locks_issued: u32,
    pub locks_released: u32,
    next_action_id: u64,
}

/// The two mock servers a daemon process under test talks to, each
/// bound to an OS-assigned ephemeral port so specs can run in
/// parallel.
pub struct MockServers {
    pub object_store: Arc<Mutex<ObjectStoreState>>,
    pub mediator: Arc<Mutex<MediatorState>>,
    pub object_store_addr: SocketAddr,
    pub mediator_addr: SocketAddr,
}

impl MockServers {
    /// Start both servers on a background thread with their own
    /// single-threaded tokio runtime. The thread is intentionally never
    /// joined — it lives for the rest of the test process.
    pub fn start() -> Self {
        let object_store = Arc::new(Mutex::new(ObjectStoreState::default()));
        let mediator = Arc::new(Mutex::new(MediatorState::default()));

        let object_store_listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("bind object store mock");
        let object_store_addr = object_store_listener.local_addr().expect("object store local addr");
        let mediator_listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind mediator mock");
        let mediator_addr = mediator_listener.local_addr().expect("mediator local addr");

        object_store_listener.set_nonblocking(true).expect("nonblocking object store listener");
        mediator_listener.set_nonblocking(true).expect("nonblocking mediator listener");

        let os_state = object_store.clone();
        let med_state = mediator.clone();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("build mock server runtime");
            runtime.block_on(async move {
                let object_store_listener =
                    tokio::net::TcpListener::from_std(object_store_listener).expect("tokio object store listener");
                let mediator_listener =
                    tokio::net::TcpListener::from_std(mediator_listener).expect("tokio mediator listener");

                let object_store_app = object_store_router(os_state);
                let mediator_app = mediator_router(med_state);

                tokio::join!(
                    axum::serve(object_store_listener, object_store_app),
                    axum::serve(mediator_listener, mediator_app),
                );
            });
        });

        Self { object_store, mediator, object_store_addr, mediator_addr }
    }

    pub fn object_store_base_url(&self) -> String {
        format!("http://{}", self.object_store_addr)
    }

    pub fn mediator_base_url(&self) -> String {
        format!("http://{}", self.mediator_addr)
    }

    /// Seed the remote pointer object (`state.txt`) before the daemon
    /// ever runs; `pull` (phase 3) always reads this first.
    pub fn seed_pointer(&self, contents: &str) {
        self.object_store.lock().objects.insert("state.txt".to_string(), contents.as_bytes().to_vec());
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.object_store.lock().objects.get(key).cloned()
    }

    pub fn object_text(&self, key: &str) -> Option<String> {
        self.object(key).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }
}

async fn object_store_get(
    State(state): State<Arc<Mutex<ObjectStoreState>>>,
    AxumPath(key): AxumPath<String>,
) -> Result<Vec<u8>, StatusCode> {
    state.lock().objects.get(&key).cloned().ok_or(StatusCode::NOT_FOUND)
}

async fn object_store_put(
    State(state): State<Arc<Mutex<ObjectStoreState>>>,
    AxumPath(key): AxumPath<String>,
    body: Bytes,
) -> StatusCode {
    state.lock().objects.insert(key, body.to_vec());
    StatusCode::OK
}

fn object_store_router(state: Arc<Mutex<ObjectStoreState>>) -> Router {
    Router::new().route("/{*key}", get(object_store_get).put(object_store_put)).with_state(state)
}

async fn reserve_access(
    State(state): State<Arc<Mutex<MediatorState>>>,
    Json(_body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    state.lock().locks_issued += 1;
    (StatusCode::OK, Json(serde_json::json!({ "token": "test-lease-token" })))
}

async fn remove_lock(
    State(state): State<Arc<Mutex<MediatorState>>>,
    AxumPath(_token): AxumPath<String>,
) -> StatusCode {
    state.lock().locks_released += 1;
    StatusCode::OK
}

async fn create_action(
    State(state): State<Arc<Mutex<MediatorState>>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut state = state.lock();
    state.next_action_id += 1;
    let id = format!("action-{}", state.next_action_id);
    state.actions.insert(id.clone(), body);
    (StatusCode::OK, Json(serde_json::json!({ "id": id })))
}

async fn update_action(
    State(state): State<Arc<Mutex<MediatorState>>>,
    AxumPath(id): AxumPath<String>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    state.lock().actions.insert(id, body);
    StatusCode::OK
}

fn mediator_router(state: Arc<Mutex<MediatorState>>) -> Router {
    Router::new()
        .route("/locks", post(reserve_access))
        .route("/locks/{token}", delete(remove_lock))
        .route("/actions", post(create_action))
        .route("/actions/{id}", patch(update_action))
        .with_state(state)
}

/// A disposable staging tree plus config file, wired to a pair of mock
/// servers. Each spec builds one of these and then calls `run()`.
pub struct Daemon {
    temp: TempDir,
    config_path: PathBuf,
    servers: MockServers,
}

impl Daemon {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("create temp staging dir");
        let servers = MockServers::start();

        for dir in ["changes", "changes/backup", "logs", "run", "bin"] {
            fs::create_dir_all(temp.path().join(dir)).expect("create staging subdir");
        }
        install_fake_tools(&temp.path().join("bin"));

        let config_path = temp.path().join("osmdbt.toml");
        fs::write(&config_path, render_config(temp.path(), &servers)).expect("write config");

        Self { temp, config_path, servers }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    pub fn servers(&self) -> &MockServers {
        &self.servers
    }

    /// Set the sequence number the fake diff-builder should advance the
    /// staging state to, read by `tests/fixtures/osmdbt-create-diff.sh`.
    pub fn set_sequence_end(&self, end: u64) {
        fs::write(self.path("run/test_sequence_end"), end.to_string()).expect("write test_sequence_end");
    }

    /// Force the fake catchup tool to exit non-zero, simulating a
    /// commit-phase failure.
    pub fn set_catchup_exit(&self, code: i32) {
        fs::write(self.path("run/test_catchup_exit"), code.to_string()).expect("write test_catchup_exit");
    }

    /// Run the daemon once in one-shot mode (the config's
    /// `app.cron.enabled` is always `false` here) and return the
    /// finished `assert_cmd::assert::Assert`.
    pub fn run(&self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("osmdbtd").expect("locate osmdbtd binary");
        cmd.env("OSMDBT_CONFIG", &self.config_path)
            .env("OSMDBT_LOG_PATH", self.path("osmdbtd.log"))
            .env("OSMDBT_LIVENESS_ADDR", "127.0.0.1:0")
            .env("OSMDBT_SHUTDOWN_TIMEOUT_SECONDS", "5");
        cmd.assert()
    }
}

fn render_config(root: &Path, servers: &MockServers) -> String {
    format!(
        r#"
[osmdbt]
changesDir = "{changes}"
runDir = "{run}"
logDir = "{logs}"
binDir = "{bin}"
getLogMaxChanges = 1000
verbose = true

[osmium]
verbose = false
progress = false

[app]
shouldCollectInfo = false

[app.cron]
enabled = false

[objectStorage]
endpoint = "{object_store_url}"
bucketName = "osmdbt-test"
acl = "public-read"
region = "us-east-1"

[objectStorage.credentials]
accessKey = "test-access-key"
secretKey = "test-secret-key"

[arstotzka]
enabled = true
serviceId = "osmdbt-test"

[arstotzka.mediator]
baseUrl = "{mediator_url}"

[telemetry]
logger = "warn"
"#,
        changes = root.join("changes").display(),
        run = root.join("run").display(),
        logs = root.join("logs").display(),
        bin = root.join("bin").display(),
        object_store_url = servers.object_store_base_url(),
        mediator_url = servers.mediator_base_url(),
    )
}

const LOG_CUTTER_SCRIPT: &str = include_str!("fixtures/osmdbt-get-log.sh");
const DIFF_BUILDER_SCRIPT: &str = include_str!("fixtures/osmdbt-create-diff.sh");
const CATCHUP_SCRIPT: &str = include_str!("fixtures/osmdbt-catchup.sh");

fn install_fake_tools(bin_dir: &Path) {
    for (name, script) in [
        ("osmdbt-get-log", LOG_CUTTER_SCRIPT),
        ("osmdbt-create-diff", DIFF_BUILDER_SCRIPT),
        ("osmdbt-catchup", CATCHUP_SCRIPT),
    ] {
        let path = bin_dir.join(name);
        fs::write(&path, script).expect("write fake tool script");
        fs::set_permissions(&path, Permissions::from_mode(0o755)).expect("make fake tool executable");
    }
}

/// Poll `check` every 50ms until it returns `true` or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    loop {
        if check() {
            return true;
        }
        if start.elapsed().as_millis() as u64 >= max_ms {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
