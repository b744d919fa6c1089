//! Connection pool setup and health reporting.
//!
//! Every docflow request performs at most one status write, so the pool is
//! sized for short transactions: a bounded acquire wait and an optional
//! per-connection `statement_timeout` keep a stuck query from holding a
//! connection indefinitely.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;
use tracing::{debug, info, warn};

use docflow_core::{logging, Error, Result};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// Pool tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: u32,
    /// Never above `max_connections`
    pub min_connections: u32,
    /// How long a request waits for a free connection
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Option<Duration>,
    /// Server-side limit applied to every statement on each new connection
    pub statement_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            max_lifetime: Some(Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS)),
            statement_timeout: None,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// At least one connection; lowers `min_connections` if needed.
    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n.max(1);
        self.min_connections = self.min_connections.min(self.max_connections);
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n.min(self.max_connections);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    pub fn statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// `SET` statement run on each new connection, if any.
    fn session_setup(&self) -> Option<String> {
        self.statement_timeout
            .map(|t| format!("SET statement_timeout = {}", t.as_millis()))
    }
}

/// Point-in-time connection counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
}

impl PoolStatus {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle(),
        }
    }

    /// Every open connection is checked out, so the next request waits.
    pub fn is_saturated(&self) -> bool {
        self.size > 0 && self.idle == 0
    }
}

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();
    info!(
        subsystem = logging::SUBSYSTEM_DATABASE,
        component = logging::COMPONENT_POOL,
        op = "create",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        statement_timeout_ms = config.statement_timeout.map(|t| t.as_millis() as u64),
        "Creating database connection pool"
    );

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .max_lifetime(config.max_lifetime);

    if let Some(setup) = config.session_setup() {
        options = options.after_connect(move |conn, _meta| {
            let setup = setup.clone();
            Box::pin(async move {
                conn.execute(setup.as_str()).await?;
                Ok(())
            })
        });
    }

    let pool = options
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    let status = PoolStatus::of(&pool);
    info!(
        subsystem = logging::SUBSYSTEM_DATABASE,
        component = logging::COMPONENT_POOL,
        op = "established",
        pool_size = status.size,
        pool_idle = status.idle,
        duration_ms = start.elapsed().as_millis() as u64,
        "Database connection pool established"
    );
    Ok(pool)
}

/// Log current connection counts; warns when the pool is saturated.
pub fn log_pool_metrics(pool: &PgPool) -> PoolStatus {
    let status = PoolStatus::of(pool);
    if status.is_saturated() {
        warn!(
            subsystem = logging::SUBSYSTEM_DATABASE,
            component = logging::COMPONENT_POOL,
            op = "metrics",
            pool_size = status.size,
            "Connection pool has no idle connections"
        );
    } else {
        debug!(
            subsystem = logging::SUBSYSTEM_DATABASE,
            component = logging::COMPONENT_POOL,
            op = "metrics",
            pool_size = status.size,
            pool_idle = status.idle,
            "Pool health check"
        );
    }
    status
}
