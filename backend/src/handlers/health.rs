//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub database: DatabaseHealth,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: usize,
    /// Latest applied migration, if the migrations table exists
    pub schema_version: Option<i64>,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    let schema_version = if connected {
        sqlx::query_scalar::<_, i64>("SELECT MAX(version) FROM _sqlx_migrations WHERE success")
            .fetch_one(&state.db)
            .await
            .ok()
    } else {
        None
    };

    if !connected {
        tracing::warn!("Health check could not reach the database");
    }

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        database: DatabaseHealth {
            connected,
            pool_size: state.db.size(),
            idle_connections: state.db.num_idle(),
            schema_version,
        },
    })
}
