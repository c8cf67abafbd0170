//! API endpoints for command execution.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::command::{self, dispatch, Operation};
use crate::gateway;
use crate::interpreter::{CommandResult, Interpreter};
use crate::web::AppState;

/// Run command request.
#[derive(Deserialize)]
pub struct CommandRequest {
    #[serde(alias = "instanceId", alias = "instance_id")]
    pub instance: String,
    pub command: String,
}

/// Parse command request.
#[derive(Deserialize)]
pub struct ParseRequest {
    pub command: String,
}

/// Either a command outcome or a marker that the line is plain text.
#[derive(Serialize)]
#[serde(untagged)]
pub enum CommandReply {
    NotCommand {
        #[serde(rename = "isCommand")]
        is_command: bool,
    },
    Result(CommandResult),
}

impl CommandReply {
    fn not_command() -> Self {
        CommandReply::NotCommand { is_command: false }
    }
}

/// Parse-only response.
#[derive(Serialize)]
pub struct ParseReply {
    #[serde(rename = "isCommand")]
    pub is_command: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
}

/// Execute a command line for an instance.
pub async fn run_command(
    State(state): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandReply>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let Some(parsed) = command::parse_command(&request.command) else {
        return Ok(Json(CommandReply::not_command()));
    };
    let Some(dispatched) = dispatch(&parsed) else {
        return Ok(Json(CommandReply::not_command()));
    };
    let name = parsed.name().to_string();

    let operation = match dispatched {
        Ok(operation) => operation,
        Err(usage) => return Ok(Json(CommandReply::Result(CommandResult::fail(&name, usage)))),
    };

    let instance = state.store.require_instance(&request.instance)?;
    let gateway = gateway::for_instance(&instance, &state.settings.gateway)?;
    let interpreter = Interpreter::new(gateway).with_settle_delay(state.settings.gateway.settle_delay());

    tracing::info!("Instance {}: #{}", instance.id, name);
    let result = interpreter.execute(&name, &operation).await;

    Ok(Json(CommandReply::Result(result)))
}

/// Tokenize and dispatch a line without executing it.
pub async fn parse_line(
    payload: Result<Json<ParseRequest>, JsonRejection>,
) -> Result<Json<ParseReply>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let Some(parsed) = command::parse_command(&request.command) else {
        return Ok(Json(ParseReply {
            is_command: false,
            command: None,
            params: None,
            operation: None,
            usage: None,
        }));
    };

    let (is_command, operation, usage) = match dispatch(&parsed) {
        None => (false, None, None),
        Some(Ok(operation)) => (true, Some(operation), None),
        Some(Err(usage)) => (true, None, Some(usage.to_string())),
    };

    Ok(Json(ParseReply {
        is_command,
        command: Some(parsed.command),
        params: Some(parsed.params),
        operation,
        usage,
    }))
}
