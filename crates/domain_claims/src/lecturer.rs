//! Lecturer directory
//!
//! HR keeps a register of lecturers and their contact details. The name is
//! fixed at registration; email and phone can be edited later.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, LecturerId, PortError};

/// A registered lecturer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lecturer {
    pub id: LecturerId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Clone)]
pub struct RegisterLecturer {
    pub id: LecturerId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl RegisterLecturer {
    pub fn validate(&self) -> Result<(), PortError> {
        if self.name.trim().is_empty() {
            return Err(PortError::validation_field("name is required", "name"));
        }
        validate_email(&self.email)
    }

    pub fn into_lecturer(self, now: DateTime<Utc>) -> Lecturer {
        Lecturer {
            id: self.id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: normalize_phone(self.phone),
            updated_at: now,
        }
    }
}

/// Contact detail changes; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct UpdateLecturer {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UpdateLecturer {
    pub fn validate(&self) -> Result<(), PortError> {
        match &self.email {
            Some(email) => validate_email(email),
            None => Ok(()),
        }
    }

    pub fn apply(self, lecturer: &mut Lecturer, now: DateTime<Utc>) {
        if let Some(email) = self.email {
            lecturer.email = email.trim().to_string();
        }
        if self.phone.is_some() {
            lecturer.phone = normalize_phone(self.phone);
        }
        lecturer.updated_at = now;
    }
}

fn validate_email(email: &str) -> Result<(), PortError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(PortError::validation_field(
            format!("'{}' is not a valid email address", email),
            "email",
        )),
    }
}

fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

/// Storage for the lecturer register
#[async_trait]
pub trait LecturerDirectory: DomainPort + HealthCheckable {
    /// Fails with `Conflict` if the id is already registered
    async fn register(&self, request: RegisterLecturer) -> Result<Lecturer, PortError>;

    async fn get(&self, id: &LecturerId) -> Result<Lecturer, PortError>;

    async fn update(&self, id: &LecturerId, changes: UpdateLecturer) -> Result<Lecturer, PortError>;

    /// All lecturers ordered by id
    async fn list(&self) -> Result<Vec<Lecturer>, PortError>;
}

/// In-memory lecturer register
#[derive(Debug, Default)]
pub struct InMemoryLecturerDirectory {
    lecturers: RwLock<BTreeMap<LecturerId, Lecturer>>,
}

impl InMemoryLecturerDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryLecturerDirectory {}

#[async_trait]
impl HealthCheckable for InMemoryLecturerDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("memory-lecturer-directory")
    }
}

#[async_trait]
impl LecturerDirectory for InMemoryLecturerDirectory {
    async fn register(&self, request: RegisterLecturer) -> Result<Lecturer, PortError> {
        request.validate()?;
        let mut lecturers = self.lecturers.write().await;
        if lecturers.contains_key(&request.id) {
            return Err(PortError::conflict(format!(
                "lecturer {} is already registered",
                request.id
            )));
        }
        let lecturer = request.into_lecturer(Utc::now());
        lecturers.insert(lecturer.id.clone(), lecturer.clone());
        Ok(lecturer)
    }

    async fn get(&self, id: &LecturerId) -> Result<Lecturer, PortError> {
        self.lecturers
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Lecturer", id))
    }

    async fn update(&self, id: &LecturerId, changes: UpdateLecturer) -> Result<Lecturer, PortError> {
        changes.validate()?;
        let mut lecturers = self.lecturers.write().await;
        let lecturer = lecturers
            .get_mut(id)
            .ok_or_else(|| PortError::not_found("Lecturer", id))?;
        changes.apply(lecturer, Utc::now());
        Ok(lecturer.clone())
    }

    async fn list(&self) -> Result<Vec<Lecturer>, PortError> {
        Ok(self.lecturers.read().await.values().cloned().collect())
    }
}
