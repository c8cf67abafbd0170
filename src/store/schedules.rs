//! Scheduled message rows.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::Store;
use crate::error::{Error, Result};
use crate::schedule::Recurrence;

/// Input for a new scheduled message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSchedule {
    pub instance_id: String,
    /// Phone number or group JID.
    pub target: String,
    pub message: String,
    pub next_run: DateTime<Utc>,
    pub recurrence: Recurrence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledMessage {
    pub id: String,
    pub instance_id: String,
    pub target: String,
    pub message: String,
    /// Recurrences are counted from here, so monthly runs keep their day.
    pub first_run: DateTime<Utc>,
    pub next_run: DateTime<Utc>,
    pub recurrence: Recurrence,
    pub active: bool,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str =
    "id, instance_id, target, message, first_run, next_run, recurrence, active, last_error, created_at";

fn millis(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts).single().unwrap_or_default()
}

impl ScheduledMessage {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let recurrence: String = row.get(6)?;
        Ok(Self {
            id: row.get(0)?,
            instance_id: row.get(1)?,
            target: row.get(2)?,
            message: row.get(3)?,
            first_run: millis(row.get(4)?),
            next_run: millis(row.get(5)?),
            recurrence: recurrence.parse().unwrap_or(Recurrence::None),
            active: row.get::<_, i64>(7)? != 0,
            last_error: row.get(8)?,
            created_at: millis(row.get(9)?),
        })
    }
}

impl Store {
    pub fn add_schedule(&self, new: &NewSchedule) -> Result<ScheduledMessage> {
        if new.target.trim().is_empty() || new.message.trim().is_empty() {
            return Err(Error::Other(
                "scheduled message needs a target and a message".to_string(),
            ));
        }

        let scheduled = ScheduledMessage {
            id: ulid::Ulid::new().to_string(),
            instance_id: new.instance_id.clone(),
            target: new.target.trim().to_string(),
            message: new.message.clone(),
            first_run: millis(new.next_run.timestamp_millis()),
            next_run: millis(new.next_run.timestamp_millis()),
            recurrence: new.recurrence,
            active: true,
            last_error: None,
            created_at: millis(Utc::now().timestamp_millis()),
        };

        let conn = self.connect()?;
        conn.execute(
            &format!(
                "INSERT INTO scheduled_messages ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, 1, NULL, ?7)",
                COLUMNS
            ),
            params![
                scheduled.id,
                scheduled.instance_id,
                scheduled.target,
                scheduled.message,
                scheduled.next_run.timestamp_millis(),
                scheduled.recurrence.as_str(),
                scheduled.created_at.timestamp_millis()
            ],
        )
        .map_err(|e| Error::Store(format!("sqlite insert schedule: {}", e)))?;

        Ok(scheduled)
    }

    pub fn list_schedules(&self) -> Result<Vec<ScheduledMessage>> {
        self.query_schedules(
            &format!("SELECT {} FROM scheduled_messages ORDER BY next_run", COLUMNS),
            params![],
        )
    }

    /// Active messages whose next run is at or before `now`.
    pub fn due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledMessage>> {
        self.query_schedules(
            &format!(
                "SELECT {} FROM scheduled_messages WHERE active = 1 AND next_run <= ?1 ORDER BY next_run",
                COLUMNS
            ),
            params![now.timestamp_millis()],
        )
    }

    fn query_schedules(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<ScheduledMessage>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| Error::Store(format!("sqlite prepare schedules: {}", e)))?;
        let rows = stmt
            .query_map(args, ScheduledMessage::from_row)
            .map_err(|e| Error::Store(format!("sqlite query schedules: {}", e)))?;

        let mut scheduled = Vec::new();
        for row in rows {
            scheduled.push(row?);
        }
        Ok(scheduled)
    }

    pub fn remove_schedule(&self, id: &str) -> Result<bool> {
        let conn = self.connect()?;
        let removed = conn
            .execute("DELETE FROM scheduled_messages WHERE id = ?1", params![id])
            .map_err(|e| Error::Store(format!("sqlite delete schedule: {}", e)))?;
        Ok(removed > 0)
    }

    /// Move to the next run, or deactivate when there is none.
    pub fn reschedule(&self, id: &str, next: Option<DateTime<Utc>>) -> Result<()> {
        let conn = self.connect()?;
        let updated = match next {
            Some(next) => conn.execute(
                "UPDATE scheduled_messages SET next_run = ?2, last_error = NULL WHERE id = ?1",
                params![id, next.timestamp_millis()],
            ),
            None => conn.execute(
                "UPDATE scheduled_messages SET active = 0, last_error = NULL WHERE id = ?1",
                params![id],
            ),
        };
        updated.map_err(|e| Error::Store(format!("sqlite reschedule: {}", e)))?;
        Ok(())
    }

    pub fn record_schedule_failure(&self, id: &str, error: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "UPDATE scheduled_messages SET last_error = ?2 WHERE id = ?1",
            params![id, error],
        )
        .map_err(|e| Error::Store(format!("sqlite record failure: {}", e)))?;
        Ok(())
    }
}
