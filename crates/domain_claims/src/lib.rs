//! Lecturer Claims Domain
//!
//! This crate implements the monthly claims workflow for contract lecturers:
//! submission, review, batch approval for payroll, and aggregation of
//! approved claims into payment invoices.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Submit -> Pending -> Verified -> Approved
//!              |                     ^
//!              +---------------------+
//!              |
//!              +-> Rejected
//! ```
//!
//! Storage, attachments, the lecturer register and notifications are ports;
//! in-memory adapters live here, durable ones in `infra_db`.

pub mod attachments;
pub mod claim;
pub mod error;
pub mod invoice;
pub mod lecturer;
pub mod lifecycle;
pub mod memory;
pub mod notification;
pub mod role;
pub mod services;
pub mod store;

pub use attachments::{
    AttachmentHandle, AttachmentPolicy, AttachmentUploadReport, BlobStore, MemoryBlobStore,
    RejectedAttachment, StoredAttachment, Upload, DEFAULT_MAX_ATTACHMENT_BYTES,
};
pub use claim::{
    validate_quantities, Claim, ClaimStatus, NewClaim, StatusChange, MAX_HOURLY_RATE,
    MAX_HOURS_WORKED, MAX_INPUT_SCALE, MAX_NOTES_LEN,
};
pub use error::ClaimError;
pub use invoice::{InvoiceAggregator, InvoiceLine, InvoiceReport};
pub use lecturer::{
    InMemoryLecturerDirectory, Lecturer, LecturerDirectory, RegisterLecturer, UpdateLecturer,
};
pub use lifecycle::{
    authorize, BatchOutcome, BatchReport, LifecycleEngine, Submission, TransitionRule,
    TRANSITION_TABLE,
};
pub use memory::InMemoryClaimStore;
pub use notification::{BroadcastNotifier, ClaimNotification, NoopNotifier, NotificationPort};
pub use role::{Caller, Capability, Role};
pub use services::{Decision, SubmitClaim, WorkflowConfig, WorkflowService};
pub use store::{ClaimMutator, ClaimQuery, ClaimStore};
