use serde::{Deserialize, Serialize};

/// The signed-in user, as handed over by the authentication layer.
///
/// Authentication itself happens elsewhere; the editor only needs to know
/// who is editing and whether their role is privileged.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserContext {
    /// Email address (stamped into the Technician column)
    pub email: String,

    /// Role name, e.g. "admin" or "technician"
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "technician".to_string()
}

impl UserContext {
    pub fn new(email: &str, role: &str) -> Self {
        UserContext {
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    /// Privileged users (admins and the like) never get auto-assigned as the
    /// row's technician.
    pub fn is_privileged(&self, privileged_roles: &[String]) -> bool {
        privileged_roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(self.role.trim()))
    }
}
