//! Command dispatcher: maps a parsed token to a group operation.

use serde::Serialize;

use super::ParsedCommand;

/// Where `#linkgrupo` delivers the invite link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTarget {
    /// Return the link to the caller without sending it anywhere.
    Clipboard,
    Phone(String),
}

/// Group operation with its positional parameters decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    CreateGroup {
        name: String,
        description: String,
        photo_url: String,
        phones: Vec<String>,
    },
    AddMember { group: String, phone: String },
    RemoveMember { group: String, phone: String },
    PromoteAdmin { group: String, phone: String },
    DemoteAdmin { group: String, phone: String },
    SetPhoto { group: String, photo_url: String },
    Rename { group: String, new_name: String },
    SetDescription { group: String, description: String },
    /// Only admins may send messages when `enabled`.
    AdminsOnlyMessages { group: String, enabled: bool },
    /// Only admins may edit group info when `enabled`.
    AdminsOnlyEdit { group: String, enabled: bool },
    InviteLink { group: String, target: LinkTarget },
    SendToGroup { group: String, message: String },
}

/// Usage text returned verbatim for malformed input.
pub type Usage = &'static str;

struct CommandSpec {
    token: &'static str,
    min_params: usize,
    usage: Usage,
    build: fn(&[String]) -> Option<Operation>,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        token: "#criargrupo",
        min_params: 4,
        usage: "Uso: #criargrupo nome|descrição|url da foto|telefone1|telefone2...",
        build: build_create_group,
    },
    CommandSpec {
        token: "#removerdogrupo",
        min_params: 2,
        usage: "Uso: #removerdogrupo nome do grupo|telefone",
        build: |p| member(p, |group, phone| Operation::RemoveMember { group, phone }),
    },
    CommandSpec {
        token: "#addnogrupo",
        min_params: 2,
        usage: "Uso: #addnogrupo nome do grupo|telefone",
        build: |p| member(p, |group, phone| Operation::AddMember { group, phone }),
    },
    CommandSpec {
        token: "#promoveradmin",
        min_params: 2,
        usage: "Uso: #promoveradmin nome do grupo|telefone",
        build: |p| member(p, |group, phone| Operation::PromoteAdmin { group, phone }),
    },
    CommandSpec {
        token: "#revogaradmin",
        min_params: 2,
        usage: "Uso: #revogaradmin nome do grupo|telefone",
        build: |p| member(p, |group, phone| Operation::DemoteAdmin { group, phone }),
    },
    CommandSpec {
        token: "#attfotogrupo",
        min_params: 2,
        usage: "Uso: #attfotogrupo nome do grupo|url da foto",
        build: |p| {
            Some(Operation::SetPhoto {
                group: required(p, 0)?,
                photo_url: required(p, 1)?,
            })
        },
    },
    CommandSpec {
        token: "#attnomegrupo",
        min_params: 2,
        usage: "Uso: #attnomegrupo nome atual|novo nome",
        build: |p| {
            Some(Operation::Rename {
                group: required(p, 0)?,
                new_name: required(p, 1)?,
            })
        },
    },
    CommandSpec {
        token: "#attdescricao",
        min_params: 2,
        usage: "Uso: #attdescricao nome do grupo|nova descrição",
        build: |p| {
            Some(Operation::SetDescription {
                group: required(p, 0)?,
                description: required(p, 1)?,
            })
        },
    },
    CommandSpec {
        token: "#somenteadminmsg",
        min_params: 1,
        usage: "Uso: #somenteadminmsg nome do grupo",
        build: |p| {
            Some(Operation::AdminsOnlyMessages {
                group: required(p, 0)?,
                enabled: true,
            })
        },
    },
    CommandSpec {
        token: "#msgliberada",
        min_params: 1,
        usage: "Uso: #msgliberada nome do grupo",
        build: |p| {
            Some(Operation::AdminsOnlyMessages {
                group: required(p, 0)?,
                enabled: false,
            })
        },
    },
    CommandSpec {
        token: "#somenteadminedit",
        min_params: 1,
        usage: "Uso: #somenteadminedit nome do grupo",
        build: |p| {
            Some(Operation::AdminsOnlyEdit {
                group: required(p, 0)?,
                enabled: true,
            })
        },
    },
    CommandSpec {
        token: "#editliberado",
        min_params: 1,
        usage: "Uso: #editliberado nome do grupo",
        build: |p| {
            Some(Operation::AdminsOnlyEdit {
                group: required(p, 0)?,
                enabled: false,
            })
        },
    },
    CommandSpec {
        token: "#linkgrupo",
        min_params: 2,
        usage: "Uso: #linkgrupo nome do grupo|telefone (ou clipboard)",
        build: build_invite_link,
    },
    CommandSpec {
        token: "#enviargrupo",
        min_params: 2,
        usage: "Uso: #enviargrupo id do grupo|mensagem",
        build: |p| {
            let group = required(p, 0)?;
            let message = p[1..].join("|").trim().to_string();
            if message.is_empty() {
                return None;
            }
            Some(Operation::SendToGroup { group, message })
        },
    },
];

/// All tokens the dispatcher recognizes.
pub fn known_commands() -> impl Iterator<Item = (&'static str, Usage)> {
    COMMANDS.iter().map(|spec| (spec.token, spec.usage))
}

/// Map a parsed command to an operation.
///
/// `None` for unknown tokens; `Some(Err(usage))` when parameters are missing.
pub fn dispatch(parsed: &ParsedCommand) -> Option<Result<Operation, Usage>> {
    let spec = COMMANDS.iter().find(|spec| spec.token == parsed.command)?;

    if parsed.params.len() < spec.min_params {
        return Some(Err(spec.usage));
    }

    Some((spec.build)(&parsed.params).ok_or(spec.usage))
}

/// Keep only the digits of a phone number.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

fn required(params: &[String], index: usize) -> Option<String> {
    params
        .get(index)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

fn member(params: &[String], make: fn(String, String) -> Operation) -> Option<Operation> {
    let group = required(params, 0)?;
    let phone = normalize_phone(&required(params, 1)?)?;
    Some(make(group, phone))
}

fn build_create_group(params: &[String]) -> Option<Operation> {
    let name = required(params, 0)?;
    let phones: Vec<String> = params[3..]
        .iter()
        .filter_map(|p| normalize_phone(p))
        .collect();
    if phones.is_empty() {
        return None;
    }

    Some(Operation::CreateGroup {
        name,
        description: params[1].clone(),
        photo_url: params[2].clone(),
        phones,
    })
}

fn build_invite_link(params: &[String]) -> Option<Operation> {
    let group = required(params, 0)?;
    let target = required(params, 1)?;
    let target = if target.eq_ignore_ascii_case("clipboard") {
        LinkTarget::Clipboard
    } else {
        LinkTarget::Phone(normalize_phone(&target)?)
    };
    Some(Operation::InviteLink { group, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::parse_command;

    fn run(line: &str) -> Option<Result<Operation, Usage>> {
        dispatch(&parse_command(line).unwrap())
    }

    #[test]
    fn test_unknown_command() {
        assert!(run("#pix EVP|chave|João").is_none());
        assert!(run("#naoexiste").is_none());
    }

    #[test]
    fn test_member_commands() {
        assert_eq!(
            run("#removerdogrupo Equipe Vendas|+55 (11) 99999-9999").unwrap().unwrap(),
            Operation::RemoveMember {
                group: "Equipe Vendas".to_string(),
                phone: "5511999999999".to_string(),
            }
        );
        assert!(matches!(
            run("#promoveradmin G|5511").unwrap().unwrap(),
            Operation::PromoteAdmin { .. }
        ));
        assert!(matches!(
            run("#revogaradmin G|5511").unwrap().unwrap(),
            Operation::DemoteAdmin { .. }
        ));
    }

    #[test]
    fn test_missing_params_return_usage() {
        for line in [
            "#criargrupo Nome|desc|foto",
            "#removerdogrupo Equipe",
            "#addnogrupo",
            "#attfotogrupo G",
            "#attnomegrupo Velho",
            "#attdescricao G",
            "#somenteadminmsg",
            "#editliberado",
            "#linkgrupo G",
            "#enviargrupo 1@g.us",
        ] {
            let usage = run(line).unwrap().unwrap_err();
            assert!(usage.starts_with("Uso: #"), "{line}: {usage}");
        }
    }

    #[test]
    fn test_blank_required_fields_return_usage() {
        assert!(run("#removerdogrupo |5511").unwrap().is_err());
        assert!(run("#addnogrupo G|sem numero").unwrap().is_err());
        assert!(run("#criargrupo |d|f|5511").unwrap().is_err());
        assert!(run("#criargrupo Nome|d|f| |").unwrap().is_err());
        assert!(run("#enviargrupo 1@g.us| ").unwrap().is_err());
    }

    #[test]
    fn test_create_group_phones() {
        let op = run("#criargrupo Time||https://x/p.png|5511 9999|| 5521-8888")
            .unwrap()
            .unwrap();
        assert_eq!(
            op,
            Operation::CreateGroup {
                name: "Time".to_string(),
                description: String::new(),
                photo_url: "https://x/p.png".to_string(),
                phones: vec!["55119999".to_string(), "55218888".to_string()],
            }
        );
    }

    #[test]
    fn test_toggles() {
        assert_eq!(
            run("#somenteadminmsg grupox").unwrap().unwrap(),
            Operation::AdminsOnlyMessages { group: "grupox".to_string(), enabled: true }
        );
        assert_eq!(
            run("#msgliberada grupox").unwrap().unwrap(),
            Operation::AdminsOnlyMessages { group: "grupox".to_string(), enabled: false }
        );
        assert_eq!(
            run("#somenteadminedit grupox").unwrap().unwrap(),
            Operation::AdminsOnlyEdit { group: "grupox".to_string(), enabled: true }
        );
    }

    #[test]
    fn test_invite_link_targets() {
        assert_eq!(
            run("#linkgrupo MeuGrupo|Clipboard").unwrap().unwrap(),
            Operation::InviteLink { group: "MeuGrupo".to_string(), target: LinkTarget::Clipboard }
        );
        assert_eq!(
            run("#linkgrupo MeuGrupo|5511988887777").unwrap().unwrap(),
            Operation::InviteLink {
                group: "MeuGrupo".to_string(),
                target: LinkTarget::Phone("5511988887777".to_string()),
            }
        );
    }

    #[test]
    fn test_send_to_group_rejoins_message() {
        assert_eq!(
            run("#enviargrupo 1203@g.us|Promoção | hoje|só").unwrap().unwrap(),
            Operation::SendToGroup {
                group: "1203@g.us".to_string(),
                message: "Promoção|hoje|só".to_string(),
            }
        );
    }

    #[test]
    fn test_known_commands_cover_table() {
        let tokens: Vec<_> = known_commands().map(|(t, _)| t).collect();
        assert_eq!(tokens.len(), 14);
        assert!(tokens.iter().all(|t| t.starts_with('#')));
    }
}
