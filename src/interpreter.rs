//! Command execution against a gateway instance.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::command::{dispatch, parse_command, LinkTarget, Operation};
use crate::gateway::endpoints::{self, ParticipantAction};
use crate::gateway::{decode, Gateway, Probe, ProbeFailure, ProbeSuccess};
use crate::resolver::{self, GroupRef};

/// Default pause between creating a group and editing it.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Outcome of one command, shown to the end user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    /// Token without the leading '#'.
    pub command: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandResult {
    pub fn ok(command: &str, message: impl Into<String>) -> Self {
        Self {
            success: true,
            command: command.to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn fail(command: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            command: command.to_string(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Why an operation stopped.
#[derive(Debug)]
enum StepError {
    GroupNotFound(String),
    Upstream {
        action: &'static str,
        failure: ProbeFailure,
    },
    MissingData(&'static str),
}

impl StepError {
    fn message(&self) -> String {
        match self {
            StepError::GroupNotFound(name) => format!("Grupo \"{}\" não encontrado", name),
            StepError::Upstream { action, failure } => {
                format!("Erro ao {}: {}", action, failure.last_error)
            }
            StepError::MissingData(what) => what.to_string(),
        }
    }
}

/// Interprets command lines for one gateway instance.
pub struct Interpreter {
    gateway: Arc<dyn Gateway>,
    settle_delay: Duration,
}

impl Interpreter {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Interpret a line. `None` when the line is not a known command and
    /// should be sent as literal text.
    pub async fn interpret(&self, line: &str) -> Option<CommandResult> {
        let parsed = parse_command(line)?;
        let dispatched = dispatch(&parsed)?;
        let command = parsed.name().to_string();

        let result = match dispatched {
            Err(usage) => CommandResult::fail(&command, usage),
            Ok(operation) => self.execute(&command, &operation).await,
        };
        Some(result)
    }

    /// Execute an operation. Never fails: errors become `success: false`.
    pub async fn execute(&self, command: &str, operation: &Operation) -> CommandResult {
        tracing::info!("Executing #{}", command);

        match self.run(command, operation).await {
            Ok(result) => result,
            Err(e) => {
                let message = e.message();
                tracing::warn!("#{} failed: {}", command, message);
                CommandResult::fail(command, message)
            }
        }
    }

    async fn run(&self, command: &str, operation: &Operation) -> Result<CommandResult, StepError> {
        match operation {
            Operation::CreateGroup {
                name,
                description,
                photo_url,
                phones,
            } => self.create_group(command, name, description, photo_url, phones).await,
            Operation::AddMember { group, phone } => {
                self.participant(command, group, phone, ParticipantAction::Add).await
            }
            Operation::RemoveMember { group, phone } => {
                self.participant(command, group, phone, ParticipantAction::Remove).await
            }
            Operation::PromoteAdmin { group, phone } => {
                self.participant(command, group, phone, ParticipantAction::Promote).await
            }
            Operation::DemoteAdmin { group, phone } => {
                self.participant(command, group, phone, ParticipantAction::Demote).await
            }
            Operation::SetPhoto { group, photo_url } => {
                let group = self.group(group).await?;
                self.probe("atualizar foto do grupo", endpoints::set_photo(&group.id, photo_url))
                    .await?;
                Ok(done(command, &group, format!("Foto do grupo \"{}\" atualizada", group.name)))
            }
            Operation::Rename { group, new_name } => {
                let group = self.group(group).await?;
                self.probe("renomear grupo", endpoints::rename(&group.id, new_name))
                    .await?;
                Ok(done(
                    command,
                    &group,
                    format!("Grupo \"{}\" renomeado para \"{}\"", group.name, new_name),
                ))
            }
            Operation::SetDescription { group, description } => {
                let group = self.group(group).await?;
                self.probe(
                    "atualizar descrição do grupo",
                    endpoints::set_description(&group.id, description),
                )
                .await?;
                Ok(done(
                    command,
                    &group,
                    format!("Descrição do grupo \"{}\" atualizada", group.name),
                ))
            }
            Operation::AdminsOnlyMessages { group, enabled } => {
                let group = self.group(group).await?;
                self.probe(
                    "alterar permissão de mensagens",
                    endpoints::set_announce(&group.id, *enabled),
                )
                .await?;
                let message = if *enabled {
                    format!("Somente admins podem enviar mensagens no grupo \"{}\"", group.name)
                } else {
                    format!("Mensagens liberadas para todos no grupo \"{}\"", group.name)
                };
                Ok(done(command, &group, message))
            }
            Operation::AdminsOnlyEdit { group, enabled } => {
                let group = self.group(group).await?;
                self.probe(
                    "alterar permissão de edição",
                    endpoints::set_locked(&group.id, *enabled),
                )
                .await?;
                let message = if *enabled {
                    format!("Somente admins podem editar o grupo \"{}\"", group.name)
                } else {
                    format!("Edição liberada para todos no grupo \"{}\"", group.name)
                };
                Ok(done(command, &group, message))
            }
            Operation::InviteLink { group, target } => self.invite_link(command, group, target).await,
            Operation::SendToGroup { group, message } => {
                let group = self.group(group).await?;
                self.probe("enviar mensagem", endpoints::send_text(&group.id, message))
                    .await?;
                Ok(done(
                    command,
                    &group,
                    format!("Mensagem enviada para o grupo \"{}\"", group.name),
                ))
            }
        }
    }

    async fn group(&self, name_or_jid: &str) -> Result<GroupRef, StepError> {
        resolver::resolve(self.gateway.as_ref(), name_or_jid)
            .await
            .map_err(|failure| StepError::Upstream {
                action: "buscar grupos",
                failure,
            })?
            .ok_or_else(|| StepError::GroupNotFound(name_or_jid.trim().to_string()))
    }

    async fn probe(&self, action: &'static str, probe: Probe) -> Result<ProbeSuccess, StepError> {
        probe
            .run(self.gateway.as_ref())
            .await
            .map_err(|failure| StepError::Upstream { action, failure })
    }

    async fn participant(
        &self,
        command: &str,
        group: &str,
        phone: &str,
        action: ParticipantAction,
    ) -> Result<CommandResult, StepError> {
        let group = self.group(group).await?;
        let (verb, message) = match action {
            ParticipantAction::Add => (
                "adicionar participante",
                format!("Participante {} adicionado ao grupo \"{}\"", phone, group.name),
            ),
            ParticipantAction::Remove => (
                "remover participante",
                format!("Participante {} removido do grupo \"{}\"", phone, group.name),
            ),
            ParticipantAction::Promote => (
                "promover admin",
                format!("Participante {} promovido a admin no grupo \"{}\"", phone, group.name),
            ),
            ParticipantAction::Demote => (
                "revogar admin",
                format!("Admin revogado de {} no grupo \"{}\"", phone, group.name),
            ),
        };

        self.probe(
            verb,
            endpoints::update_participants(&group.id, action, &[phone.to_string()]),
        )
        .await?;
        Ok(done(command, &group, message))
    }

    async fn create_group(
        &self,
        command: &str,
        name: &str,
        description: &str,
        photo_url: &str,
        phones: &[String],
    ) -> Result<CommandResult, StepError> {
        let created = self
            .probe("criar grupo", endpoints::create_group(name, phones))
            .await?;

        let Some(id) = decode::decode_created_group_id(&created.response.json()) else {
            tracing::warn!("Group {:?} created but no id in response", name);
            return Ok(CommandResult::ok(
                command,
                format!(
                    "Grupo \"{}\" criado, mas o servidor não retornou o ID; descrição e foto não aplicadas",
                    name
                ),
            ));
        };

        let description = description.trim();
        let photo_url = photo_url.trim();
        let mut warnings = Vec::new();

        if !description.is_empty() || !photo_url.is_empty() {
            // The gateway rejects edits on a group it has not finished creating.
            tokio::time::sleep(self.settle_delay).await;
        }
        if !description.is_empty() {
            if let Err(e) = self
                .probe("definir descrição", endpoints::set_description(&id, description))
                .await
            {
                warnings.push(e.message());
            }
        }
        if !photo_url.is_empty() {
            if let Err(e) = self.probe("definir foto", endpoints::set_photo(&id, photo_url)).await {
                warnings.push(e.message());
            }
        }

        let mut message = format!(
            "Grupo \"{}\" criado com {} participante(s)",
            name,
            phones.len()
        );
        if !warnings.is_empty() {
            message.push_str(&format!(" ({})", warnings.join("; ")));
        }

        Ok(CommandResult::ok(command, message).with_data(json!({
            "id": id,
            "name": name,
            "participants": phones,
        })))
    }

    async fn invite_link(
        &self,
        command: &str,
        group: &str,
        target: &LinkTarget,
    ) -> Result<CommandResult, StepError> {
        let group = self.group(group).await?;
        let fetched = self
            .probe("buscar link do grupo", endpoints::invite_link(&group.id))
            .await?;
        let link = decode::decode_invite_link(&fetched.response.body)
            .ok_or(StepError::MissingData("Link do grupo não retornado pelo servidor"))?;

        let data = json!({ "group": group, "link": link });
        match target {
            LinkTarget::Clipboard => Ok(CommandResult::ok(
                command,
                format!("Link do grupo \"{}\": {}", group.name, link),
            )
            .with_data(data)),
            LinkTarget::Phone(phone) => {
                self.probe("enviar link", endpoints::send_text(phone, &link))
                    .await?;
                Ok(CommandResult::ok(
                    command,
                    format!("Link do grupo \"{}\" enviado para {}: {}", group.name, phone, link),
                )
                .with_data(data))
            }
        }
    }
}

fn done(command: &str, group: &GroupRef, message: String) -> CommandResult {
    CommandResult::ok(command, message).with_data(json!({ "group": group }))
}
