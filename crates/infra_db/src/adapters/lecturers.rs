//! PostgreSQL Lecturer Directory

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, LecturerId, PortError};
use domain_claims::{Lecturer, LecturerDirectory, RegisterLecturer, UpdateLecturer};

use crate::adapters::claims::ping;
use crate::error::DatabaseError;
use crate::repositories::lecturers::{LecturerRow, LecturersRepository};

/// PostgreSQL-backed implementation of the `LecturerDirectory` port
#[derive(Debug, Clone)]
pub struct PostgresLecturerDirectory {
    repository: LecturersRepository,
}

impl PostgresLecturerDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: LecturersRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresLecturerDirectory {}

#[async_trait]
impl HealthCheckable for PostgresLecturerDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        ping(self.repository.pool(), "postgres-lecturer-directory").await
    }
}

#[async_trait]
impl LecturerDirectory for PostgresLecturerDirectory {
    #[instrument(skip(self, request), fields(lecturer = %request.id))]
    async fn register(&self, request: RegisterLecturer) -> Result<Lecturer, PortError> {
        request.validate()?;
        let row = lecturer_to_row(&request.into_lecturer(Utc::now()));
        let inserted = self.repository.insert(&row).await.map_err(|e| match e {
            DatabaseError::DuplicateEntry(_) => {
                PortError::conflict(format!("lecturer {} is already registered", row.lecturer_id))
            }
            other => other.into(),
        })?;
        Ok(row_to_lecturer(inserted)?)
    }

    async fn get(&self, id: &LecturerId) -> Result<Lecturer, PortError> {
        Ok(row_to_lecturer(self.repository.get(id.as_str()).await?)?)
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: &LecturerId, changes: UpdateLecturer) -> Result<Lecturer, PortError> {
        changes.validate()?;
        let mut lecturer = row_to_lecturer(self.repository.get(id.as_str()).await?)?;
        changes.apply(&mut lecturer, Utc::now());
        let updated = self
            .repository
            .update_contact(&lecturer_to_row(&lecturer))
            .await?;
        Ok(row_to_lecturer(updated)?)
    }

    async fn list(&self) -> Result<Vec<Lecturer>, PortError> {
        self.repository
            .list()
            .await?
            .into_iter()
            .map(|row| row_to_lecturer(row).map_err(PortError::from))
            .collect()
    }
}

fn lecturer_to_row(lecturer: &Lecturer) -> LecturerRow {
    LecturerRow {
        lecturer_id: lecturer.id.as_str().to_string(),
        name: lecturer.name.clone(),
        email: lecturer.email.clone(),
        phone: lecturer.phone.clone(),
        updated_at: lecturer.updated_at,
    }
}

fn row_to_lecturer(row: LecturerRow) -> Result<Lecturer, DatabaseError> {
    Ok(Lecturer {
        id: LecturerId::new(row.lecturer_id).map_err(|e| DatabaseError::corrupt(e.to_string()))?,
        name: row.name,
        email: row.email,
        phone: row.phone,
        updated_at: row.updated_at,
    })
}
