//! User roles and the capabilities each one grants

use serde::{Deserialize, Serialize};

/// Access role attached to every user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Approver,
    Encoder,
    /// Default, view-only role
    Viewer,
}

impl Role {
    /// Stored label for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Approver => "Approver",
            Role::Encoder => "Encoder",
            Role::Viewer => "Viewer",
        }
    }

    /// Parse a stored label. Unknown labels fall back to [`Role::Viewer`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "Admin" => Role::Admin,
            "Approver" => Role::Approver,
            "Encoder" => Role::Encoder,
            _ => Role::Viewer,
        }
    }

    pub fn can_manage_templates(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_create_documents(&self) -> bool {
        matches!(self, Role::Admin | Role::Encoder)
    }

    pub fn can_approve_documents(&self) -> bool {
        matches!(self, Role::Admin | Role::Approver)
    }

    /// Roles that see every document rather than only their own
    pub fn can_view_all_documents(&self) -> bool {
        matches!(self, Role::Admin | Role::Approver)
    }

    pub fn can_view_audit_logs(&self) -> bool {
        matches!(self, Role::Admin | Role::Approver)
    }

    pub fn can_export_audit_logs(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_view_salaries(&self) -> bool {
        matches!(self, Role::Admin | Role::Approver)
    }

    /// Headcount and breakdown figures for the employee directory
    pub fn can_view_employee_stats(&self) -> bool {
        matches!(self, Role::Admin | Role::Approver)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Role; 4] = [Role::Admin, Role::Approver, Role::Encoder, Role::Viewer];

    #[test]
    fn test_label_round_trip() {
        for role in ALL {
            assert_eq!(Role::from_label(role.as_str()), role);
        }
    }

    #[test]
    fn test_unknown_label_is_viewer() {
        assert_eq!(Role::from_label("admin"), Role::Viewer);
        assert_eq!(Role::from_label(""), Role::Viewer);
        assert_eq!(Role::from_label("Superuser"), Role::Viewer);
    }

    #[test]
    fn test_capability_matrix() {
        let table = [
            // manage, create, approve, all docs, audit, export, salaries, staff stats
            (Role::Admin, [true, true, true, true, true, true, true, true]),
            (Role::Approver, [false, false, true, true, true, false, true, true]),
            (Role::Encoder, [false, true, false, false, false, false, false, false]),
            (Role::Viewer, [false, false, false, false, false, false, false, false]),
        ];

        for (role, expected) in table {
            let actual = [
                role.can_manage_templates(),
                role.can_create_documents(),
                role.can_approve_documents(),
                role.can_view_all_documents(),
                role.can_view_audit_logs(),
                role.can_export_audit_logs(),
                role.can_view_salaries(),
                role.can_view_employee_stats(),
            ];
            assert_eq!(actual, expected, "capabilities of {}", role);
        }
    }

    #[test]
    fn test_serde_uses_labels() {
        assert_eq!(serde_json::to_string(&Role::Encoder).unwrap(), "\"Encoder\"");
    }
}
