use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::{parse_date, Hub, Notification, NotificationKind, Priority};

static LAST_ISSUED_MS: AtomicI64 = AtomicI64::new(0);

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Milliseconds since the epoch, strictly increasing for the lifetime of the
/// process. Calls landing in the same millisecond borrow the next free one.
pub fn next_timestamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_ISSUED_MS.load(Ordering::Relaxed);

    loop {
        let candidate = now.max(last + 1);
        match LAST_ISSUED_MS.compare_exchange_weak(
            last,
            candidate,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(actual) => last = actual,
        }
    }
}

/// `<prefix>-<millis>` built on [`next_timestamp`], so ids never collide
/// within a process.
pub fn next_id(prefix: &str) -> String {
    format!("{}-{}", prefix, next_timestamp())
}

/// A point in time as producers receive it: either already-formatted text or
/// a typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum When {
    Text(String),
    At(DateTime<Utc>),
    Local(NaiveDateTime),
}

impl When {
    pub fn to_iso(&self) -> String {
        match self {
            When::Text(s) => s.clone(),
            When::At(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            When::Local(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Human-readable form; unparseable text is shown as given.
    pub fn display(&self) -> String {
        match self {
            When::Text(s) => parse_date(s)
                .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
                .unwrap_or_else(|| s.clone()),
            When::At(dt) => dt.format(DISPLAY_FORMAT).to_string(),
            When::Local(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        }
    }
}

impl From<&str> for When {
    fn from(s: &str) -> Self {
        When::Text(s.to_string())
    }
}

impl From<String> for When {
    fn from(s: String) -> Self {
        When::Text(s)
    }
}

impl From<DateTime<Utc>> for When {
    fn from(dt: DateTime<Utc>) -> Self {
        When::At(dt)
    }
}

impl From<NaiveDateTime> for When {
    fn from(dt: NaiveDateTime) -> Self {
        When::Local(dt)
    }
}

fn now_iso() -> String {
    When::At(Utc::now()).to_iso()
}

pub fn create_reminder(
    title: impl Into<String>,
    message: impl Into<String>,
    date: impl Into<When>,
    priority: Priority,
) -> Notification {
    Notification {
        id: next_id("reminder"),
        kind: NotificationKind::Reminder,
        title: title.into(),
        message: message.into(),
        date: date.into().to_iso(),
        is_read: false,
        priority,
        action: None,
    }
}

pub fn create_appointment_notification(
    doctor_name: &str,
    appointment_date: impl Into<When>,
    appointment_type: &str,
) -> Notification {
    let when = appointment_date.into().display();

    Notification {
        id: next_id("appt-notification"),
        kind: NotificationKind::Appointment,
        title: "Upcoming Appointment".to_string(),
        message: format!(
            "You have a {} appointment with {} on {}.",
            appointment_type, doctor_name, when
        ),
        date: now_iso(),
        is_read: false,
        priority: Priority::Medium,
        action: Some(crate::Action::new("View Appointments", "/telehealth")),
    }
}

pub fn create_medication_reminder(
    medication_name: &str,
    dosage: &str,
    time: NaiveTime,
) -> Notification {
    Notification {
        id: next_id("med-reminder"),
        kind: NotificationKind::Medication,
        title: "Medication Reminder".to_string(),
        message: format!(
            "Time to take {} ({}) at {}.",
            medication_name,
            dosage,
            time.format("%H:%M")
        ),
        date: now_iso(),
        is_read: false,
        priority: Priority::High,
        action: None,
    }
}

pub fn add_reminder(
    hub: &Hub,
    title: impl Into<String>,
    message: impl Into<String>,
    date: impl Into<When>,
    priority: Priority,
) -> bool {
    hub.publish(create_reminder(title, message, date, priority))
}

pub fn add_appointment_notification(
    hub: &Hub,
    doctor_name: &str,
    appointment_date: impl Into<When>,
    appointment_type: &str,
) -> bool {
    hub.publish(create_appointment_notification(
        doctor_name,
        appointment_date,
        appointment_type,
    ))
}

pub fn add_medication_reminder(
    hub: &Hub,
    medication_name: &str,
    dosage: &str,
    time: NaiveTime,
) -> bool {
    hub.publish(create_medication_reminder(medication_name, dosage, time))
}
