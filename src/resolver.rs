//! Group name resolution.

use serde::Serialize;

use crate::gateway::{decode, endpoints, Gateway, ProbeFailure};

/// Suffix of WhatsApp group identifiers.
pub const GROUP_JID_SUFFIX: &str = "@g.us";

/// A gateway group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

/// Whether the input is already a group identifier.
pub fn is_group_jid(input: &str) -> bool {
    input.contains(GROUP_JID_SUFFIX)
}

/// Fetch every group the instance belongs to.
pub async fn list_groups(gateway: &dyn Gateway) -> Result<Vec<GroupRef>, ProbeFailure> {
    let success = endpoints::list_groups().run(gateway).await?;
    let groups = decode::decode_groups(&success.response.json());
    tracing::debug!("Gateway returned {} groups", groups.len());
    Ok(groups)
}

/// Resolve a group name or JID.
///
/// JIDs pass through untouched without a gateway call. Names are matched
/// exactly, ignoring case, against a fresh group listing.
pub async fn resolve(gateway: &dyn Gateway, name_or_jid: &str) -> Result<Option<GroupRef>, ProbeFailure> {
    let input = name_or_jid.trim();
    if is_group_jid(input) {
        return Ok(Some(GroupRef {
            id: input.to_string(),
            name: input.to_string(),
        }));
    }

    let wanted = input.to_lowercase();
    let found = list_groups(gateway)
        .await?
        .into_iter()
        .find(|group| group.name.trim().to_lowercase() == wanted);

    if found.is_none() {
        tracing::info!("No group named {:?}", input);
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::MockGateway;

    const LIST: &str = "/group/list?force=false&noparticipants=true";

    #[tokio::test]
    async fn test_jid_passes_through_without_network() {
        let gateway = MockGateway::new();
        let group = resolve(&gateway, "123456@g.us").await.unwrap().unwrap();

        assert_eq!(
            group,
            GroupRef {
                id: "123456@g.us".to_string(),
                name: "123456@g.us".to_string(),
            }
        );
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_group_list() {
        let gateway = MockGateway::new().respond("GET", LIST, 200, "[]");
        assert!(resolve(&gateway, "Nonexistent Group").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_case_insensitive_exact_match() {
        let gateway = MockGateway::new().respond(
            "GET",
            LIST,
            200,
            r#"[{"JID": "1@g.us", "Name": "Vendas 2024"}, {"JID": "2@g.us", "Name": "Vendas"}]"#,
        );

        let group = resolve(&gateway, " vendas ").await.unwrap().unwrap();
        assert_eq!(group.id, "2@g.us");
        assert_eq!(group.name, "Vendas");

        assert!(resolve(&gateway, "Vend").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_falls_back_to_older_listing_endpoint() {
        let gateway = MockGateway::new()
            .respond("GET", LIST, 404, "")
            .respond("GET", "/group/list", 404, "")
            .respond(
                "GET",
                "/group/fetchAllGroups?getParticipants=false",
                200,
                r#"{"groups": [{"id": "7@g.us", "subject": "Suporte"}]}"#,
            );

        let group = resolve(&gateway, "SUPORTE").await.unwrap().unwrap();
        assert_eq!(group.id, "7@g.us");
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let gateway = MockGateway::new().respond("GET", LIST, 401, "invalid token");
        let err = resolve(&gateway, "Vendas").await.unwrap_err();
        assert!(err.last_error.contains("401"));
    }
}
