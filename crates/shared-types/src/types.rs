use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Named template content with its extracted variables.
///
/// `variables` always equals the extraction of `content`; `version`
/// starts at 1 and grows by one on every content update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub variables: Vec<String>,
    pub version: i64,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Approved,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Approved => "approved",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "approved" => DocumentStatus::Approved,
            _ => DocumentStatus::Pending,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filled-in template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub template_id: i64,
    pub template_name: String,
    pub filled_data: serde_json::Map<String, serde_json::Value>,
    pub status: DocumentStatus,
    pub created_by: i64,
    pub created_by_name: Option<String>,
    pub approved_by: Option<i64>,
    pub approved_by_name: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub digital_signature: Option<String>,
    pub export_pdf_url: Option<String>,
    pub export_docx_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub email: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub manager_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<f64>,
    pub hire_date: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_designation: Option<String>,
}

/// Export target for a rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid export format '{0}'")]
pub struct ParseFormatError(pub String);

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("pdf".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert_eq!("DOCX".parse::<ExportFormat>(), Ok(ExportFormat::Docx));
        assert!("txt".parse::<ExportFormat>().is_err());
        assert!("".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_document_status_labels() {
        assert_eq!(DocumentStatus::from_label("approved"), DocumentStatus::Approved);
        assert_eq!(DocumentStatus::from_label("pending"), DocumentStatus::Pending);
        assert_eq!(DocumentStatus::Approved.to_string(), "approved");
    }

    #[test]
    fn test_salary_omitted_when_hidden() {
        let employee = Employee {
            employee_id: "E-001".to_string(),
            name: "Grace".to_string(),
            email: None,
            designation: Some("Clerk".to_string()),
            department: Some("Records".to_string()),
            manager_id: None,
            salary: None,
            hire_date: None,
            status: "active".to_string(),
            manager_name: None,
            manager_designation: None,
        };
        let json = serde_json::to_value(&employee).unwrap();
        assert!(json.get("salary").is_none());
        assert!(json.get("manager_name").is_none());
        assert_eq!(json["designation"], "Clerk");
    }

    proptest! {
        #[test]
        fn unknown_formats_are_rejected(format in "[a-z]{1,8}") {
            prop_assume!(format != "pdf" && format != "docx");
            prop_assert!(format.parse::<ExportFormat>().is_err());
        }
    }
}
