// Credentials (immutable, never printed)

/// Login credentials for one tenant
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    login: String,
    password: String,
    tenant: String,
}

impl Credentials {
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        tenant: impl Into<String>,
    ) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            tenant: tenant.into(),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("tenant", &self.tenant)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("ds@acme.io", "hunter2", "acme");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("ds@acme.io"));
        assert!(!printed.contains("hunter2"));
    }
}
