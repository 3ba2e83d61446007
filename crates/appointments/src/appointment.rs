use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aurora_core::{AppointmentId, DomainError, DomainResult, UserId};

/// Appointment status lifecycle.
///
/// `Pending → Confirmed → Completed`, with `Cancelled` reachable from
/// `Pending` and `Confirmed`. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Completed) | (Confirmed, Cancelled)
        )
    }
}

impl core::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to book an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookAppointment {
    pub user_id: UserId,
    pub appointment_date: DateTime<Utc>,
    pub message: String,
}

/// A dermatologist appointment requested by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    id: AppointmentId,
    user_id: UserId,
    appointment_date: DateTime<Utc>,
    message: String,
    assigned_dermatologist: Option<String>,
    status: AppointmentStatus,
    created_at: DateTime<Utc>,
}

impl Appointment {
    /// Book a new appointment. The date must lie after `now`.
    pub fn book(id: AppointmentId, cmd: BookAppointment, now: DateTime<Utc>) -> DomainResult<Self> {
        if cmd.message.trim().is_empty() {
            return Err(DomainError::validation("message must not be empty"));
        }
        if cmd.appointment_date <= now {
            return Err(DomainError::validation("appointment_date must be in the future"));
        }

        Ok(Self {
            id,
            user_id: cmd.user_id,
            appointment_date: cmd.appointment_date,
            message: cmd.message.trim().to_string(),
            assigned_dermatologist: None,
            status: AppointmentStatus::Pending,
            created_at: now,
        })
    }

    pub fn id(&self) -> AppointmentId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn appointment_date(&self) -> DateTime<Utc> {
        self.appointment_date
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn assigned_dermatologist(&self) -> Option<&str> {
        self.assigned_dermatologist.as_deref()
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Confirm a pending appointment, optionally assigning a dermatologist.
    pub fn confirm(&mut self, dermatologist: Option<String>) -> DomainResult<()> {
        let dermatologist = match dermatologist {
            Some(name) if name.trim().is_empty() => {
                return Err(DomainError::validation("assigned_dermatologist must not be empty"));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };

        self.transition(AppointmentStatus::Confirmed)?;
        if dermatologist.is_some() {
            self.assigned_dermatologist = dermatologist;
        }
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        self.transition(AppointmentStatus::Completed)
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        self.transition(AppointmentStatus::Cancelled)
    }

    fn transition(&mut self, next: AppointmentStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::conflict(format!(
                "cannot move appointment from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}
