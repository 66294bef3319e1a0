//! Lecturer register repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::error::DatabaseError;

/// A row of the `lecturers` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct LecturerRow {
    pub lecturer_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct LecturersRepository {
    pool: PgPool,
}

impl LecturersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a lecturer; a taken id surfaces as `DuplicateEntry`
    pub async fn insert(&self, row: &LecturerRow) -> Result<LecturerRow, DatabaseError> {
        let inserted = sqlx::query_as(
            r#"
            INSERT INTO lecturers (lecturer_id, name, email, phone, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING lecturer_id, name, email, phone, updated_at
            "#,
        )
        .bind(&row.lecturer_id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(row.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(inserted)
    }

    pub async fn get(&self, lecturer_id: &str) -> Result<LecturerRow, DatabaseError> {
        sqlx::query_as(
            r#"
            SELECT lecturer_id, name, email, phone, updated_at
            FROM lecturers
            WHERE lecturer_id = $1
            "#,
        )
        .bind(lecturer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Lecturer", lecturer_id))
    }

    /// Overwrites the contact columns
    pub async fn update_contact(&self, row: &LecturerRow) -> Result<LecturerRow, DatabaseError> {
        sqlx::query_as(
            r#"
            UPDATE lecturers SET email = $2, phone = $3, updated_at = $4
            WHERE lecturer_id = $1
            RETURNING lecturer_id, name, email, phone, updated_at
            "#,
        )
        .bind(&row.lecturer_id)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(row.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Lecturer", &row.lecturer_id))
    }

    pub async fn list(&self) -> Result<Vec<LecturerRow>, DatabaseError> {
        Ok(sqlx::query_as(
            r#"
            SELECT lecturer_id, name, email, phone, updated_at
            FROM lecturers
            ORDER BY lecturer_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
