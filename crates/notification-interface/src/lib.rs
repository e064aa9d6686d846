use chrono::{DateTime, NaiveDateTime};

mod error;
pub use error::*;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Appointment,
    Medication,
    Report,
    Reminder,
    #[default]
    System,
}

impl NotificationKind {
    pub fn default_priority(&self) -> Priority {
        match self {
            NotificationKind::Medication => Priority::High,
            NotificationKind::System => Priority::Low,
            NotificationKind::Appointment | NotificationKind::Report | NotificationKind::Reminder => {
                Priority::Medium
            }
        }
    }

    /// `date` holds the time of the thing being announced rather than the
    /// moment the notification was made.
    pub fn dates_target_event(&self) -> bool {
        matches!(
            self,
            NotificationKind::Reminder | NotificationKind::Appointment
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub label: String,
    pub link: String,
}

impl Action {
    pub fn new(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: link.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    /// Entries saved without a `type` read back as `system`.
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// ISO 8601 text, kept as given by the producer.
    ///
    /// For reminders and appointments this is the time of the event itself,
    /// for every other kind it is when the notification was created. Use
    /// [`Notification::event_at`] and [`Notification::created_at`] to read it
    /// without guessing.
    pub date: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl Notification {
    pub fn builder() -> NotificationBuilder {
        NotificationBuilder::default()
    }

    pub fn event_at(&self) -> Option<NaiveDateTime> {
        if self.kind.dates_target_event() {
            parse_date(&self.date)
        } else {
            None
        }
    }

    pub fn created_at(&self) -> Option<NaiveDateTime> {
        if self.kind.dates_target_event() {
            None
        } else {
            parse_date(&self.date)
        }
    }
}

/// Accepts RFC 3339 as well as the offset-less `YYYY-MM-DDTHH:MM[:SS[.f]]`
/// form the reminder dialog produces. Offsets are normalized to UTC.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

#[derive(Default)]
pub struct NotificationBuilder {
    id: Option<String>,
    kind: Option<NotificationKind>,
    title: Option<String>,
    message: Option<String>,
    date: Option<String>,
    priority: Option<Priority>,
    action: Option<Action>,
}

impl NotificationBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn action(mut self, label: impl Into<String>, link: impl Into<String>) -> Self {
        self.action = Some(Action::new(label, link));
        self
    }

    /// Kind defaults to `system`, date to now, priority to the kind's default.
    pub fn build(self) -> Result<Notification, Error> {
        let id = self.id.ok_or(Error::MissingField("id"))?;
        let title = self.title.ok_or(Error::MissingField("title"))?;
        let message = self.message.ok_or(Error::MissingField("message"))?;
        let kind = self.kind.unwrap_or_default();

        Ok(Notification {
            id,
            kind,
            title,
            message,
            date: self
                .date
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
            is_read: false,
            priority: self.priority.unwrap_or_else(|| kind.default_priority()),
            action: self.action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_builder_defaults() {
        let n = Notification::builder()
            .id("med-1")
            .kind(NotificationKind::Medication)
            .title("Medication Reminder")
            .message("Time to take Aspirin")
            .build()
            .unwrap();

        assert_eq!(n.priority, Priority::High);
        assert!(!n.is_read);
        assert!(n.action.is_none());
        assert!(n.created_at().is_some());
    }

    #[test]
    fn test_builder_missing_title() {
        let err = Notification::builder()
            .id("x")
            .message("m")
            .build()
            .unwrap_err();
        assert_eq!(err, Error::MissingField("title"));
    }

    #[test]
    fn test_wire_format() {
        let n = Notification::builder()
            .id("r1")
            .kind(NotificationKind::Reminder)
            .title("Take pill")
            .message("Morning dose")
            .date("2024-01-01T08:00:00")
            .priority(Priority::High)
            .build()
            .unwrap();

        insta::assert_json_snapshot!(n, @r#"
        {
          "id": "r1",
          "type": "reminder",
          "title": "Take pill",
          "message": "Morning dose",
          "date": "2024-01-01T08:00:00",
          "isRead": false,
          "priority": "high"
        }
        "#);
    }

    #[test]
    fn test_deserialize_with_action() {
        let n: Notification = serde_json::from_str(
            r#"{
                "id": "appt-notification-1",
                "type": "appointment",
                "title": "Upcoming Appointment",
                "message": "You have a video appointment",
                "date": "2024-03-01T10:00:00.000Z",
                "isRead": true,
                "priority": "medium",
                "action": { "label": "View Appointments", "link": "/telehealth" }
            }"#,
        )
        .unwrap();

        assert!(n.is_read);
        assert_eq!(n.action, Some(Action::new("View Appointments", "/telehealth")));
        assert_eq!(
            n.event_at(),
            Some(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(n.created_at(), None);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let res = serde_json::from_str::<Notification>(
            r#"{"id":"1","type":"billing","title":"t","message":"m","date":"","isRead":false,"priority":"low"}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_missing_kind_reads_as_system() {
        let n: Notification = serde_json::from_str(
            r#"{"id":"appt-1","title":"Upcoming Appointment","message":"m","date":"2024-03-01T10:00:00"}"#,
        )
        .unwrap();

        assert_eq!(n.kind, NotificationKind::System);
        assert_eq!(n.priority, Priority::Medium);
        assert!(!n.is_read);
    }

    #[test]
    fn test_parse_date_forms() {
        assert!(parse_date("2024-01-01T08:00").is_some());
        assert!(parse_date("2024-01-01T08:00:00+02:00").is_some());
        assert!(parse_date("tomorrow").is_none());
        assert_eq!("medication".parse::<NotificationKind>().unwrap(), NotificationKind::Medication);
    }
}
