//! Domain types shared by the template engine callers and the DocGen API

pub mod audit;
pub mod role;
pub mod types;

pub use audit::{AuditAction, AuditLogEntry, CSV_HEADER};
pub use role::Role;
pub use types::{
    Document, DocumentStatus, Employee, ExportFormat, ParseFormatError, Template, User,
};
