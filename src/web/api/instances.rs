//! API endpoints for instances.

use axum::{extract::State, Json};
use serde::Serialize;

use super::ApiError;
use crate::store::Instance;
use crate::web::AppState;

/// Instance API response. The token is never returned in full.
#[derive(Serialize)]
pub struct InstanceResponse {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub token: String,
}

impl From<Instance> for InstanceResponse {
    fn from(instance: Instance) -> Self {
        Self {
            token: instance.masked_token(),
            id: instance.id,
            name: instance.name,
            base_url: instance.base_url,
        }
    }
}

/// List all instances.
pub async fn list_instances(State(state): State<AppState>) -> Result<Json<Vec<InstanceResponse>>, ApiError> {
    let instances = state
        .store
        .list_instances()?
        .into_iter()
        .map(InstanceResponse::from)
        .collect();

    Ok(Json(instances))
}
