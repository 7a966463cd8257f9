use std::collections::HashMap;

use crate::config::MessengerConfig;

/// Source of declared proxy URLs, keyed by logical peer name.
///
/// In a browser host this is the markup that names a frame and points at
/// its proxy page. A name with no declaration yet returns `None`; lookups
/// are retried on later calls.
pub trait ProxyDirectory {
    /// Proxy URL declared for `name`, if any.
    fn proxy_url(&self, name: &str) -> Option<String>;
}

impl<F> ProxyDirectory for F
where
    F: Fn(&str) -> Option<String>,
{
    fn proxy_url(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Fixed name → URL table.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entries: HashMap<String, String>,
}

impl StaticDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from the `proxies` table of a config.
    pub fn from_config(config: &MessengerConfig) -> Self {
        Self {
            entries: config
                .proxies
                .iter()
                .map(|(name, url)| (name.clone(), url.clone()))
                .collect(),
        }
    }

    /// Declare a proxy URL for `name`.
    pub fn with_proxy(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.entries.insert(name.into(), url.into());
        self
    }

    /// Number of declared peers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no peers are declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProxyDirectory for StaticDirectory {
    fn proxy_url(&self, name: &str) -> Option<String> {
        self.entries.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_directory_lookup() {
        let directory = StaticDirectory::new().with_proxy("child", "https://c.example/p.html");
        assert_eq!(
            directory.proxy_url("child").as_deref(),
            Some("https://c.example/p.html")
        );
        assert_eq!(directory.proxy_url("other"), None);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn from_config_copies_proxies() {
        let config = MessengerConfig::default().with_proxy("a", "https://a.example/");
        let directory = StaticDirectory::from_config(&config);
        assert_eq!(directory.proxy_url("a").as_deref(), Some("https://a.example/"));
    }

    #[test]
    fn closures_are_directories() {
        let directory = |name: &str| (name == "late").then(|| "https://late.example/".to_string());
        assert!(directory.proxy_url("late").is_some());
        assert!(directory.proxy_url("early").is_none());
    }
}
