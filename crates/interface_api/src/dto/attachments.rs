//! Attachment upload DTOs

use serde::Serialize;

use domain_claims::AttachmentUploadReport;

#[derive(Debug, Serialize)]
pub struct AcceptedFileResponse {
    pub file_name: String,
    pub handle: String,
}

#[derive(Debug, Serialize)]
pub struct RejectedFileResponse {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub accepted: Vec<AcceptedFileResponse>,
    pub rejected: Vec<RejectedFileResponse>,
}

impl From<AttachmentUploadReport> for UploadResponse {
    fn from(report: AttachmentUploadReport) -> Self {
        Self {
            accepted: report
                .accepted
                .into_iter()
                .map(|a| AcceptedFileResponse {
                    file_name: a.file_name,
                    handle: a.handle.to_string(),
                })
                .collect(),
            rejected: report
                .rejected
                .into_iter()
                .map(|r| RejectedFileResponse {
                    file_name: r.file_name,
                    reason: r.error.user_message(),
                })
                .collect(),
        }
    }
}
