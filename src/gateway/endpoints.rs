//! Known endpoint variants per group operation, in preference order.
//!
//! Newer UAZAPI servers come first, older path spellings and PUT variants
//! after them.

use serde_json::json;

use super::client::GatewayRequest;
use super::probe::Probe;

/// Participant update action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantAction {
    Add,
    Remove,
    Promote,
    Demote,
}

impl ParticipantAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantAction::Add => "add",
            ParticipantAction::Remove => "remove",
            ParticipantAction::Promote => "promote",
            ParticipantAction::Demote => "demote",
        }
    }
}

pub fn list_groups() -> Probe {
    Probe::new(
        "list_groups",
        vec![
            GatewayRequest::get("/group/list?force=false&noparticipants=true"),
            GatewayRequest::get("/group/list"),
            GatewayRequest::get("/group/fetchAllGroups?getParticipants=false"),
        ],
    )
}

pub fn create_group(name: &str, participants: &[String]) -> Probe {
    Probe::new(
        "create_group",
        vec![
            GatewayRequest::post(
                "/group/create",
                json!({ "name": name, "participants": participants }),
            ),
            GatewayRequest::post(
                "/group/create",
                json!({ "subject": name, "participants": participants }),
            ),
        ],
    )
}

pub fn rename(group_jid: &str, name: &str) -> Probe {
    Probe::new(
        "rename_group",
        vec![
            GatewayRequest::post("/group/updateName", json!({ "groupjid": group_jid, "name": name })),
            GatewayRequest::put("/group/updateName", json!({ "groupjid": group_jid, "name": name })),
            GatewayRequest::post(
                "/group/updateSubject",
                json!({ "groupjid": group_jid, "subject": name }),
            ),
            GatewayRequest::post(
                "/group/updateGroupSubject",
                json!({ "groupJid": group_jid, "subject": name }),
            ),
        ],
    )
}

pub fn set_description(group_jid: &str, description: &str) -> Probe {
    Probe::new(
        "set_group_description",
        vec![
            GatewayRequest::post(
                "/group/updateDescription",
                json!({ "groupjid": group_jid, "description": description }),
            ),
            GatewayRequest::put(
                "/group/updateDescription",
                json!({ "groupjid": group_jid, "description": description }),
            ),
            GatewayRequest::post(
                "/group/updateGroupDescription",
                json!({ "groupJid": group_jid, "description": description }),
            ),
        ],
    )
}

pub fn set_photo(group_jid: &str, image_url: &str) -> Probe {
    Probe::new(
        "set_group_photo",
        vec![
            GatewayRequest::post("/group/updateImage", json!({ "groupjid": group_jid, "image": image_url })),
            GatewayRequest::put("/group/updateImage", json!({ "groupjid": group_jid, "image": image_url })),
            GatewayRequest::post(
                "/group/updatePicture",
                json!({ "groupjid": group_jid, "image": image_url }),
            ),
            GatewayRequest::post(
                "/group/updateGroupPicture",
                json!({ "groupJid": group_jid, "url": image_url }),
            ),
        ],
    )
}

pub fn update_participants(group_jid: &str, action: ParticipantAction, participants: &[String]) -> Probe {
    let action = action.as_str();
    Probe::new(
        "update_participants",
        vec![
            GatewayRequest::post(
                "/group/updateParticipants",
                json!({ "groupjid": group_jid, "action": action, "participants": participants }),
            ),
            GatewayRequest::put(
                "/group/updateParticipants",
                json!({ "groupjid": group_jid, "action": action, "participants": participants }),
            ),
            GatewayRequest::post(
                format!("/group/participants/{}", action),
                json!({ "groupjid": group_jid, "participants": participants }),
            ),
            GatewayRequest::post(
                "/group/updateParticipant",
                json!({ "groupJid": group_jid, "action": action, "participants": participants }),
            ),
        ],
    )
}

/// Only admins may send messages when `announce` is true.
pub fn set_announce(group_jid: &str, announce: bool) -> Probe {
    let setting = if announce { "announcement" } else { "not_announcement" };
    Probe::new(
        "set_group_announce",
        vec![
            GatewayRequest::post(
                "/group/updateAnnounce",
                json!({ "groupjid": group_jid, "announce": announce }),
            ),
            GatewayRequest::put(
                "/group/updateAnnounce",
                json!({ "groupjid": group_jid, "announce": announce }),
            ),
            GatewayRequest::post(
                "/group/updateSetting",
                json!({ "groupJid": group_jid, "action": setting }),
            ),
        ],
    )
}

/// Only admins may edit group info when `locked` is true.
pub fn set_locked(group_jid: &str, locked: bool) -> Probe {
    let setting = if locked { "locked" } else { "unlocked" };
    Probe::new(
        "set_group_locked",
        vec![
            GatewayRequest::post("/group/updateLocked", json!({ "groupjid": group_jid, "locked": locked })),
            GatewayRequest::put("/group/updateLocked", json!({ "groupjid": group_jid, "locked": locked })),
            GatewayRequest::post(
                "/group/updateSetting",
                json!({ "groupJid": group_jid, "action": setting }),
            ),
        ],
    )
}

pub fn invite_link(group_jid: &str) -> Probe {
    Probe::new(
        "invite_link",
        vec![
            GatewayRequest::get(format!("/group/invitelink/{}", group_jid)),
            GatewayRequest::post(
                "/group/info",
                json!({ "groupjid": group_jid, "getInviteLink": true }),
            ),
            GatewayRequest::get(format!("/group/inviteCode?groupJid={}", group_jid)),
        ],
    )
}

/// Plain text message to a phone number or group JID.
pub fn send_text(number: &str, text: &str) -> Probe {
    Probe::new(
        "send_text",
        vec![
            GatewayRequest::post("/send/text", json!({ "number": number, "text": text })),
            GatewayRequest::post("/message/sendText", json!({ "number": number, "text": text })),
            GatewayRequest::post(
                "/chat/send/text",
                json!({ "phone": number, "body": text }),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn test_participant_payload_carries_action() {
        let probe = update_participants("1@g.us", ParticipantAction::Promote, &["5511999".to_string()]);
        let first = &probe.candidates()[0];

        assert_eq!(first.method, Method::POST);
        assert_eq!(first.path, "/group/updateParticipants");
        let body = first.body.as_ref().unwrap();
        assert_eq!(body["action"], "promote");
        assert_eq!(body["participants"][0], "5511999");
        assert_eq!(probe.candidates()[2].path, "/group/participants/promote");
    }

    #[test]
    fn test_every_mutation_has_fallbacks() {
        for probe in [
            rename("1@g.us", "x"),
            set_description("1@g.us", "x"),
            set_photo("1@g.us", "https://x/y.png"),
            set_announce("1@g.us", true),
            set_locked("1@g.us", false),
        ] {
            assert!(probe.candidates().len() >= 3, "{} has too few variants", probe.operation());
        }
    }

    #[test]
    fn test_setting_variants() {
        let probe = set_announce("1@g.us", false);
        assert_eq!(probe.candidates()[0].body.as_ref().unwrap()["announce"], false);
        assert_eq!(probe.candidates()[2].body.as_ref().unwrap()["action"], "not_announcement");
    }
}
