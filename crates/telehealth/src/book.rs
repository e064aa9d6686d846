use chrono::NaiveDateTime;

use healthhub_notification::{
    create_appointment_notification, next_timestamp, Action, Hub, Notification, NotificationKind,
    Priority,
};

use crate::{
    Appointment, AppointmentStatus, Error, NewAppointment, StoreKey, TelehealthStore,
};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Scheduled visits, persisted under `telehealth_appointments`. Booking a
/// visit publishes its notifications on the hub.
pub struct AppointmentBook {
    store: TelehealthStore,
    hub: Hub,
    appointments: Vec<Appointment>,
}

impl AppointmentBook {
    pub fn load(store: TelehealthStore, hub: Hub) -> Result<Self, Error> {
        let appointments: Vec<Appointment> = store
            .get(StoreKey::Appointments)?
            .unwrap_or_default();

        tracing::info!(count = appointments.len(), "appointments_loaded");

        Ok(Self {
            store,
            hub,
            appointments,
        })
    }

    #[tracing::instrument(skip_all, fields(doctor = %new.doctor_name))]
    pub fn schedule(&mut self, new: NewAppointment) -> Result<Appointment, Error> {
        let doctor_name = new.doctor_name.trim();
        if doctor_name.is_empty() {
            return Err(Error::MissingDoctor);
        }

        let appointment = Appointment {
            id: next_timestamp().to_string(),
            doctor_name: doctor_name.to_string(),
            date: new.at.format(DATE_FORMAT).to_string(),
            notes: new.notes.filter(|n| !n.trim().is_empty()),
            kind: new.kind,
            reminder: new.reminder,
            status: AppointmentStatus::Scheduled,
        };

        self.appointments.push(appointment.clone());
        self.save()?;

        self.hub.publish(create_appointment_notification(
            &appointment.doctor_name,
            new.at,
            &appointment.kind.to_string(),
        ));

        if appointment.reminder {
            self.hub.publish(reminder_for(&appointment, new.at));
        }

        tracing::info!(id = %appointment.id, "appointment_scheduled");
        Ok(appointment)
    }

    /// Publishes a `cancel-<id>-<ts>` notice once the visit is cancelled.
    pub fn cancel(&mut self, id: &str) -> Result<Appointment, Error> {
        let cancelled = self.transition(id, AppointmentStatus::Cancelled)?;
        self.hub.publish(cancellation_for(&cancelled));
        Ok(cancelled)
    }

    pub fn complete(&mut self, id: &str) -> Result<Appointment, Error> {
        self.transition(id, AppointmentStatus::Completed)
    }

    pub fn list(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn get(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    /// Scheduled visits at or after `now`, soonest first.
    pub fn upcoming(&self, now: NaiveDateTime) -> Vec<Appointment> {
        let mut upcoming: Vec<(NaiveDateTime, Appointment)> = self
            .appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Scheduled)
            .filter_map(|a| a.at().map(|at| (at, a.clone())))
            .filter(|(at, _)| *at >= now)
            .collect();

        upcoming.sort_by_key(|(at, _)| *at);
        upcoming.into_iter().map(|(_, a)| a).collect()
    }

    fn transition(&mut self, id: &str, status: AppointmentStatus) -> Result<Appointment, Error> {
        let appointment = self
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if appointment.status != AppointmentStatus::Scheduled {
            return Err(Error::NotScheduled {
                id: id.to_string(),
                status: appointment.status,
            });
        }

        appointment.status = status;
        let updated = appointment.clone();
        self.save()?;

        tracing::info!(id = %id, status = %status, "appointment_status_changed");
        Ok(updated)
    }

    fn save(&self) -> Result<(), Error> {
        self.store
            .set(StoreKey::Appointments, &self.appointments)
            .map_err(Error::from)
    }
}

fn reminder_for(appointment: &Appointment, at: NaiveDateTime) -> Notification {
    Notification {
        id: format!("reminder-{}", appointment.id),
        kind: NotificationKind::Reminder,
        title: "Appointment Reminder".to_string(),
        message: format!(
            "Don't forget your appointment with {} on {} at {}.",
            appointment.doctor_name,
            at.format("%Y-%m-%d"),
            at.format("%H:%M"),
        ),
        date: appointment.date.clone(),
        is_read: false,
        priority: Priority::Medium,
        action: Some(Action::new("View Details", "/telehealth")),
    }
}

fn cancellation_for(appointment: &Appointment) -> Notification {
    let when = appointment
        .at()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| appointment.date.clone());

    Notification {
        id: format!("cancel-{}-{}", appointment.id, next_timestamp()),
        kind: NotificationKind::System,
        title: "Appointment Cancelled".to_string(),
        message: format!(
            "Your {} appointment with {} on {} has been cancelled.",
            appointment.kind, appointment.doctor_name, when
        ),
        date: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        is_read: false,
        priority: Priority::Medium,
        action: Some(Action::new("View Appointments", "/telehealth")),
    }
}

/// One `appt-<id>` notification per scheduled visit. The ids are stable, so
/// feeding the digest to an inbox on every start adds each visit once.
pub fn appointment_digest(appointments: &[Appointment]) -> Vec<Notification> {
    let created = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Scheduled)
        .map(|a| {
            let when = a
                .at()
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| a.date.clone());

            Notification {
                id: format!("appt-{}", a.id),
                kind: NotificationKind::Appointment,
                title: "Upcoming Appointment".to_string(),
                message: format!(
                    "You have a {} appointment with {} on {}",
                    a.kind, a.doctor_name, when
                ),
                date: created.clone(),
                is_read: false,
                priority: Priority::Medium,
                action: Some(Action::new("View Appointment", "/telehealth")),
            }
        })
        .collect()
}
