//! Caller roles and capabilities
//!
//! The authentication collaborator hands the domain a [`Caller`]; the domain
//! never checks credentials itself. Status transitions are authorized by the
//! transition table in [`crate::lifecycle`]; everything else is authorized
//! through [`Role::can`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::LecturerId;

use crate::error::ClaimError;

/// Roles known to the claims workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Submits claims for their own work
    Lecturer,
    /// Programme coordinator, first-line reviewer
    Coordinator,
    /// Academic manager, final approver
    Manager,
    /// Human resources, runs payroll batches and invoices
    Hr,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Lecturer => "Lecturer",
            Role::Coordinator => "Coordinator",
            Role::Manager => "Manager",
            Role::Hr => "HR",
        }
    }

    /// Whether this role holds the given capability
    pub fn can(&self, capability: Capability) -> bool {
        capability.roles().contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ClaimError;

    /// Accepts both the short names and the longer titles used by the
    /// identity provider (e.g. `ProgrammeCoordinator`, `AcademicManager`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "lecturer" | "lecture" => Ok(Role::Lecturer),
            "coordinator" | "programmecoordinator" => Ok(Role::Coordinator),
            "manager" | "academicmanager" => Ok(Role::Manager),
            "hr" | "humanresources" => Ok(Role::Hr),
            _ => Err(ClaimError::validation(format!("unknown role '{}'", s))),
        }
    }
}

/// Non-transition operations that are gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Upload supporting documents
    UploadAttachments,
    /// Submit a claim on behalf of another lecturer
    SubmitOnBehalf,
    /// View claims belonging to other lecturers
    ViewAllClaims,
    /// Generate the payment invoice report
    GenerateInvoice,
    /// Register and edit lecturers
    ManageLecturers,
}

impl Capability {
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Capability::UploadAttachments => &[Role::Lecturer, Role::Coordinator, Role::Manager],
            Capability::SubmitOnBehalf => &[Role::Coordinator, Role::Manager],
            Capability::ViewAllClaims => &[Role::Coordinator, Role::Manager, Role::Hr],
            Capability::GenerateInvoice => &[Role::Manager, Role::Hr],
            Capability::ManageLecturers => &[Role::Manager, Role::Hr],
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Capability::UploadAttachments => "upload attachments",
            Capability::SubmitOnBehalf => "submit claims for another lecturer",
            Capability::ViewAllClaims => "view other lecturers' claims",
            Capability::GenerateInvoice => "generate invoices",
            Capability::ManageLecturers => "manage lecturers",
        }
    }
}

/// The authenticated caller of a workflow operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub identity: String,
    pub role: Role,
}

impl Caller {
    pub fn new(identity: impl Into<String>, role: Role) -> Self {
        Self {
            identity: identity.into(),
            role,
        }
    }

    /// The caller's identity as a lecturer id
    pub fn lecturer_id(&self) -> Result<LecturerId, ClaimError> {
        Ok(LecturerId::new(self.identity.as_str())?)
    }

    /// Fails with `PermissionDenied` unless the caller's role holds `capability`
    pub fn require(&self, capability: Capability) -> Result<(), ClaimError> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(ClaimError::permission_denied(self.role, capability.describe()))
        }
    }

    /// Whether the caller is the given lecturer
    pub fn is_lecturer(&self, lecturer_id: &LecturerId) -> bool {
        self.identity.trim() == lecturer_id.as_str()
    }
}
