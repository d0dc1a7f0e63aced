//! Routes reachable without a credential.
//!
//! Patterns are matched against the path relative to the API prefix.
//! A plain pattern matches exactly; a pattern ending in `/**` matches the
//! prefix itself and anything below it.

/// Account endpoints a signed-out browser must be able to reach.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/register",
    "/send-reset-otp",
    "/reset-password",
    "/logout",
    "/is-authenticated",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPaths {
    exact: Vec<String>,
    prefixes: Vec<String>,
}

impl PublicPaths {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exact = Vec::new();
        let mut prefixes = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            match pattern.strip_suffix("/**") {
                Some(prefix) => prefixes.push(prefix.to_string()),
                None => exact.push(pattern.to_string()),
            }
        }

        Self { exact, prefixes }
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.exact.iter().any(|p| p == path) {
            return true;
        }

        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PATHS.iter().copied())
    }
}
