use std::fmt;

use super::StoreError;

const APPLICATION_SUFFIX: &str = ".SecureStorage";

/// Name of the logical partition a store's entries live in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        if name.is_empty() {
            return Err(StoreError::InvalidNamespace { name });
        }
        Ok(Self(name))
    }

    /// Namespace derived from an application identifier, e.g.
    /// `com.example.app` becomes `com.example.app.SecureStorage`.
    pub fn for_application(application_id: &str) -> Result<Self, StoreError> {
        if application_id.is_empty() {
            return Err(StoreError::InvalidNamespace {
                name: application_id.to_string(),
            });
        }
        Self::new(format!("{application_id}{APPLICATION_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        let err = Namespace::new("").expect_err("empty name");
        assert!(matches!(err, StoreError::InvalidNamespace { .. }));
    }

    #[test]
    fn derives_from_application_id() {
        let ns = Namespace::for_application("com.example.app").expect("namespace");
        assert_eq!(ns.as_str(), "com.example.app.SecureStorage");
        assert!(Namespace::for_application("").is_err());
    }
}
