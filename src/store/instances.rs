//! Tenant gateway instances.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::Store;
use crate::error::{Error, Result};

/// A tenant's gateway session: where to reach it and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Instance {
    pub fn new(id: &str, name: &str, base_url: &str, token: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            created_at: Utc::now(),
        }
    }

    /// Token with all but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at: i64 = row.get(4)?;
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            base_url: row.get(2)?,
            token: row.get(3)?,
            created_at: Utc
                .timestamp_millis_opt(created_at)
                .single()
                .unwrap_or_default(),
        })
    }
}

impl Store {
    pub fn add_instance(&self, instance: &Instance) -> Result<()> {
        if instance.id.trim().is_empty() {
            return Err(Error::Config("instance id must not be empty".to_string()));
        }
        if !instance.base_url.starts_with("http://") && !instance.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "instance base URL must be http(s): {}",
                instance.base_url
            )));
        }

        let conn = self.connect()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO instances (id, name, base_url, token, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    instance.id,
                    instance.name,
                    instance.base_url,
                    instance.token,
                    instance.created_at.timestamp_millis()
                ],
            )
            .map_err(|e| Error::Store(format!("sqlite insert instance: {}", e)))?;

        if inserted == 0 {
            return Err(Error::Store(format!("instance '{}' already exists", instance.id)));
        }
        tracing::info!("Registered instance {} ({})", instance.id, instance.base_url);
        Ok(())
    }

    pub fn get_instance(&self, id: &str) -> Result<Option<Instance>> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT id, name, base_url, token, created_at FROM instances WHERE id = ?1",
            params![id],
            Instance::from_row,
        )
        .optional()
        .map_err(|e| Error::Store(format!("sqlite get instance: {}", e)))
    }

    /// Like [`Store::get_instance`] but missing instances are an error.
    pub fn require_instance(&self, id: &str) -> Result<Instance> {
        self.get_instance(id)?
            .ok_or_else(|| Error::NotFound(format!("instance '{}'", id)))
    }

    pub fn list_instances(&self) -> Result<Vec<Instance>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT id, name, base_url, token, created_at FROM instances ORDER BY id")
            .map_err(|e| Error::Store(format!("sqlite prepare instances: {}", e)))?;
        let rows = stmt
            .query_map([], Instance::from_row)
            .map_err(|e| Error::Store(format!("sqlite query instances: {}", e)))?;

        let mut instances = Vec::new();
        for row in rows {
            instances.push(row?);
        }
        Ok(instances)
    }

    pub fn remove_instance(&self, id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn
            .execute("DELETE FROM instances WHERE id = ?1", params![id])
            .map_err(|e| Error::Store(format!("sqlite delete instance: {}", e)))?;
        Ok(removed > 0)
    }
}
