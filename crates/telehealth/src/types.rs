use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentType {
    #[default]
    Video,
    Chat,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub doctor_name: String,
    /// Local date-time of the visit, `%Y-%m-%dT%H:%M:%S`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    #[serde(default)]
    pub reminder: bool,
    #[serde(default)]
    pub status: AppointmentStatus,
}

impl Appointment {
    pub fn at(&self) -> Option<NaiveDateTime> {
        healthhub_notification::parse_date(&self.date)
    }
}

/// What the booking form collects.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub doctor_name: String,
    pub at: NaiveDateTime,
    pub notes: Option<String>,
    pub kind: AppointmentType,
    pub reminder: bool,
}

impl NewAppointment {
    pub fn new(doctor_name: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            doctor_name: doctor_name.into(),
            at,
            notes: None,
            kind: AppointmentType::default(),
            reminder: true,
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn kind(mut self, kind: AppointmentType) -> Self {
        self.kind = kind;
        self
    }

    pub fn reminder(mut self, reminder: bool) -> Self {
        self.reminder = reminder;
        self
    }
}
