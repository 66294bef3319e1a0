//! Lecturer directory DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::LecturerId;
use domain_claims::{ClaimError, Lecturer, RegisterLecturer, UpdateLecturer};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterLecturerRequest {
    #[validate(length(min = 1, max = 64))]
    pub lecturer_id: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

impl RegisterLecturerRequest {
    pub fn into_command(self) -> Result<RegisterLecturer, ClaimError> {
        Ok(RegisterLecturer {
            id: LecturerId::new(self.lecturer_id)?,
            name: self.name,
            email: self.email,
            phone: self.phone,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLecturerRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

impl From<UpdateLecturerRequest> for UpdateLecturer {
    fn from(request: UpdateLecturerRequest) -> Self {
        UpdateLecturer {
            email: request.email,
            phone: request.phone,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LecturerResponse {
    pub lecturer_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lecturer> for LecturerResponse {
    fn from(lecturer: &Lecturer) -> Self {
        Self {
            lecturer_id: lecturer.id.to_string(),
            name: lecturer.name.clone(),
            email: lecturer.email.clone(),
            phone: lecturer.phone.clone(),
            updated_at: lecturer.updated_at,
        }
    }
}
