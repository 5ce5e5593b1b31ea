/// Backend-assigned identifier of a job, download or project.
pub type OperationId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
