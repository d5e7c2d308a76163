use super::enums::Status;
use super::identifier::normalize;
use super::schedule::{parse_schedule, Schedule, ScheduleValue};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tracked unit of work (a machine/site visit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique ID within the owning tab
    pub id: Uuid,
    /// Raw identifier as typed or imported (WSID / machine data)
    pub identifier: String,
    /// Matching key derived from `identifier`; recomputed on every change
    #[serde(default)]
    pub identifier_key: String,
    /// User-owned notes; reconciliation never touches these
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub status: Status,
    #[serde(default = "Local::now")]
    pub created_at: DateTime<Local>,
}

impl Item {
    pub fn new(identifier: String) -> Self {
        let identifier_key = normalize(&identifier);
        Self {
            id: Uuid::new_v4(),
            identifier,
            identifier_key,
            notes: String::new(),
            schedule: Schedule::unscheduled(),
            status: Status::Outstanding,
            created_at: Local::now(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_schedule(mut self, value: &ScheduleValue) -> Self {
        self.schedule = parse_schedule(value);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Replace the raw identifier and refresh its key
    pub fn set_identifier(&mut self, identifier: String) {
        self.identifier_key = normalize(&identifier);
        self.identifier = identifier;
    }

    pub fn set_schedule(&mut self, value: &ScheduleValue) {
        self.schedule = parse_schedule(value);
    }

    /// Recompute derived fields after loading from storage
    pub fn refresh_key(&mut self) {
        self.identifier_key = normalize(&self.identifier);
    }

    pub fn toggle_status(&mut self) {
        self.status = self.status.toggled();
    }
}
