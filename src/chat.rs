//! Chat-side command grammar.
//!
//! These are the commands an agent types into the CRM chat box. They act on
//! the chat that is currently open, so group commands here carry no group
//! name; the server-side grammar in [`crate::command`] always takes the
//! group as its first parameter. Only the token spelling is shared.

use serde::Serialize;
use thiserror::Error;

use crate::command::{join_command, parse_with_separator, ParsedCommand, PARAM_SEPARATOR};

/// One chat command and its form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChatCommandSpec {
    pub token: &'static str,
    pub label: &'static str,
    /// Field labels, in positional order. All are required.
    pub fields: &'static [&'static str],
    pub separator: char,
}

pub const CHAT_COMMANDS: &[ChatCommandSpec] = &[
    ChatCommandSpec {
        token: "#pix",
        label: "Enviar chave PIX",
        fields: &["tipo", "chave", "nome"],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#sairgrupo",
        label: "Sair do grupo",
        fields: &[],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#addnogrupo",
        label: "Adicionar participante",
        fields: &["telefone"],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#removerdogrupo",
        label: "Remover participante",
        fields: &["telefone"],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#promoveradmin",
        label: "Promover a admin",
        fields: &["telefone"],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#revogaradmin",
        label: "Revogar admin",
        fields: &["telefone"],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#attnomegrupo",
        label: "Alterar nome do grupo",
        fields: &["novo nome"],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#attdescricao",
        label: "Alterar descrição do grupo",
        fields: &["nova descrição"],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#attfotogrupo",
        label: "Alterar foto do grupo",
        fields: &["url da foto"],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#somenteadminmsg",
        label: "Somente admins enviam mensagens",
        fields: &[],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#msgliberada",
        label: "Liberar mensagens",
        fields: &[],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#somenteadminedit",
        label: "Somente admins editam o grupo",
        fields: &[],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#editliberado",
        label: "Liberar edição",
        fields: &[],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#linkgrupo",
        label: "Link de convite",
        fields: &[],
        separator: PARAM_SEPARATOR,
    },
    ChatCommandSpec {
        token: "#trocarinstancia",
        label: "Trocar instância",
        fields: &["instância", "telefone"],
        separator: ':',
    },
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    #[error("Valor de {field} não pode conter '{separator}'")]
    SeparatorInValue { field: &'static str, separator: char },

    #[error("Campos a mais: esperado {expected}, recebido {got}")]
    TooManyValues { expected: usize, got: usize },
}

/// Catalog entry for a token (case-insensitive).
pub fn find(token: &str) -> Option<&'static ChatCommandSpec> {
    let token = token.trim().to_lowercase();
    CHAT_COMMANDS.iter().find(|spec| spec.token == token)
}

/// Tokenize a chat line using the separator its command declares.
pub fn parse(line: &str) -> Option<ParsedCommand> {
    let token = line.split_whitespace().next()?;
    let separator = find(token).map_or(PARAM_SEPARATOR, |spec| spec.separator);
    parse_with_separator(line, separator)
}

/// Build a command line from form values.
pub fn build(spec: &ChatCommandSpec, values: &[&str]) -> Result<String, BuildError> {
    if values.len() > spec.fields.len() {
        return Err(BuildError::TooManyValues {
            expected: spec.fields.len(),
            got: values.len(),
        });
    }

    let mut params = Vec::with_capacity(spec.fields.len());
    for (index, field) in spec.fields.iter().copied().enumerate() {
        let value = values.get(index).map(|v| v.trim()).unwrap_or_default();
        if value.is_empty() {
            return Err(BuildError::MissingField(field));
        }
        if value.contains(spec.separator) {
            return Err(BuildError::SeparatorInValue {
                field,
                separator: spec.separator,
            });
        }
        params.push(value.to_string());
    }

    Ok(join_command(spec.token, &params, spec.separator))
}
