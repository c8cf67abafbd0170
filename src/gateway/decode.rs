//! Tolerant decoding of gateway responses.
//!
//! Field names differ between gateway server versions (`JID`/`jid`/`id`,
//! `subject`/`name`/`groupName`, ...). Everything that reads a gateway
//! payload goes through here and gets one normalized shape back.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::resolver::GroupRef;

const GROUP_ID_FIELDS: &[&str] = &["JID", "jid", "id", "groupId", "groupJid", "gid"];
const GROUP_NAME_FIELDS: &[&str] = &["subject", "Subject", "name", "Name", "groupName", "title"];
const WRAPPER_FIELDS: &[&str] = &["groups", "data", "result", "group"];
const LINK_FIELDS: &[&str] = &["inviteLink", "invite_link", "InviteLink", "link", "url"];
const CODE_FIELDS: &[&str] = &["inviteCode", "invite_code", "code"];

static INVITE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://chat\.whatsapp\.com/[A-Za-z0-9_-]+").expect("valid invite link pattern")
});

static INVITE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("valid invite code pattern"));

/// Base URL of WhatsApp group invite links.
pub const INVITE_BASE: &str = "https://chat.whatsapp.com/";

fn first_str(value: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        value
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Decode one group object.
pub fn decode_group(value: &Value) -> Option<GroupRef> {
    let id = first_str(value, GROUP_ID_FIELDS)?;
    let name = first_str(value, GROUP_NAME_FIELDS).unwrap_or_default();
    Some(GroupRef { id, name })
}

/// Decode a group listing: a bare array, or an array under a wrapper field
/// (possibly nested once, e.g. `{"data": {"groups": [...]}}`).
pub fn decode_groups(value: &Value) -> Vec<GroupRef> {
    group_array(value)
        .map(|items| items.iter().filter_map(decode_group).collect())
        .unwrap_or_default()
}

fn group_array(value: &Value) -> Option<&Vec<Value>> {
    if let Some(items) = value.as_array() {
        return Some(items);
    }
    WRAPPER_FIELDS.iter().find_map(|field| {
        let inner = value.get(field)?;
        inner.as_array().or_else(|| {
            WRAPPER_FIELDS
                .iter()
                .find_map(|nested| inner.get(nested).and_then(Value::as_array))
        })
    })
}

/// Identifier of a freshly created group.
pub fn decode_created_group_id(value: &Value) -> Option<String> {
    first_str(value, GROUP_ID_FIELDS).or_else(|| {
        WRAPPER_FIELDS
            .iter()
            .filter_map(|field| value.get(field))
            .find_map(|inner| first_str(inner, GROUP_ID_FIELDS))
    })
}

/// Invite link from a response body, JSON or not.
///
/// Full links win over bare codes anywhere in the body; a code field is only
/// trusted when it looks like an invite code.
pub fn decode_invite_link(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);

    let mut scopes = vec![&value];
    scopes.extend(WRAPPER_FIELDS.iter().filter_map(|field| value.get(field)));

    let link = scopes.iter().find_map(|scope| {
        LINK_FIELDS
            .iter()
            .chain(CODE_FIELDS)
            .filter_map(|field| scope.get(field).and_then(Value::as_str))
            .find_map(|s| INVITE_LINK.find(s).map(|m| m.as_str().to_string()))
    });
    if link.is_some() {
        return link;
    }

    if let Some(m) = INVITE_LINK.find(body) {
        return Some(m.as_str().to_string());
    }

    scopes
        .iter()
        .filter_map(|scope| first_str(scope, CODE_FIELDS))
        .find(|code| INVITE_CODE.is_match(code))
        .map(|code| format!("{}{}", INVITE_BASE, code))
}
