//! Request and response bodies

pub mod attachments;
pub mod claims;
pub mod invoices;
pub mod lecturers;
