/// Restricción de acceso por nombre de rol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLimit {
    roles: Vec<String>,
    allowed: bool,
}

/// Result of checking a member's roles against a [`RoleLimit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMatch {
    pub matches: bool,
    /// First member role found in the limit, if any.
    pub determinative_role: Option<String>,
}

impl RoleLimit {
    /// Only members with at least one of `roles` pass.
    pub fn allow<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            allowed: true,
        }
    }

    /// Members with any of `roles` are rejected.
    pub fn deny<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            allowed: false,
        }
    }

    pub fn is_allow_list(&self) -> bool {
        self.allowed
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn check(&self, member_roles: &[String]) -> RoleMatch {
        let found = member_roles
            .iter()
            .find(|role| self.roles.iter().any(|r| r == *role));

        RoleMatch {
            matches: self.allowed == found.is_some(),
            determinative_role: found.cloned(),
        }
    }

    pub fn stringify_roles(&self, separator: &str) -> String {
        self.roles.join(separator)
    }

    /// Mensaje de acceso denegado para el comando `command`.
    pub fn access_error_message(&self, command: &str, role_match: &RoleMatch) -> String {
        match (&role_match.determinative_role, self.allowed) {
            (Some(role), false) => format!(
                "Users with \"{}\" role are not allowed to execute \"{}\".",
                role, command
            ),
            _ => format!(
                "Only users with one of \"{}\" roles are allowed to execute \"{}\".",
                self.stringify_roles(", "),
                command
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn roles(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_allow_list() {
        let limit = RoleLimit::allow(["DJ", "Admin"]);

        let ok = limit.check(&roles(&["Member", "DJ"]));
        assert!(ok.matches);
        assert_eq!(ok.determinative_role.as_deref(), Some("DJ"));

        let rejected = limit.check(&roles(&["Member"]));
        assert!(!rejected.matches);
        assert_eq!(
            limit.access_error_message("music", &rejected),
            "Only users with one of \"DJ, Admin\" roles are allowed to execute \"music\"."
        );
    }

    #[test]
    fn test_deny_list() {
        let limit = RoleLimit::deny(["Muted"]);

        assert!(limit.check(&roles(&["Member"])).matches);
        assert!(limit.check(&[]).matches);

        let rejected = limit.check(&roles(&["Member", "Muted"]));
        assert!(!rejected.matches);
        assert_eq!(
            limit.access_error_message("skip", &rejected),
            "Users with \"Muted\" role are not allowed to execute \"skip\"."
        );
    }

    #[test]
    fn test_role_names_are_case_sensitive() {
        assert!(!RoleLimit::allow(["DJ"]).check(&roles(&["dj"])).matches);
    }
}
