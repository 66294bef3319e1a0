//! Request handlers

pub mod attachments;
pub mod claims;
pub mod health;
pub mod invoices;
pub mod lecturers;
