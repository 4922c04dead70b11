//! Key layout.

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "dsync";

/// Builds the fixed set of document keys for one namespace.
#[derive(Debug, Clone)]
pub struct Keys {
    namespace: String,
}

impl Keys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Ordered list of every token-set version.
    pub fn versions(&self) -> String {
        format!("{}:versions", self.namespace)
    }

    /// Id of the current version.
    pub fn current_version(&self) -> String {
        format!("{}:current-version", self.namespace)
    }

    /// Token migration rules.
    pub fn mappings(&self) -> String {
        format!("{}:mappings", self.namespace)
    }

    pub fn sync_sources(&self) -> String {
        format!("{}:sync-sources", self.namespace)
    }

    pub fn sync_history(&self) -> String {
        format!("{}:sync-history", self.namespace)
    }

    pub fn bindings(&self) -> String {
        format!("{}:bindings", self.namespace)
    }

    pub fn integration_config(&self) -> String {
        format!("{}:integration-config", self.namespace)
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_keys() {
        let keys = Keys::new("acme");
        assert_eq!(keys.versions(), "acme:versions");
        assert_eq!(keys.current_version(), "acme:current-version");
        assert_eq!(keys.integration_config(), "acme:integration-config");
        assert_eq!(Keys::default().bindings(), "dsync:bindings");
    }
}
