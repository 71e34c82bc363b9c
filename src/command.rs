use crate::config::CommandConfig;

/// Recognizes status requests by exact, case-insensitive phrase match
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    phrases: Vec<String>,
    names: Vec<String>,
}

impl CommandMatcher {
    pub fn new<P, N>(phrases: P, names: N) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            phrases: phrases.into_iter().map(|p| fold(p.as_ref())).collect(),
            names: names.into_iter().map(|n| fold(n.as_ref())).collect(),
        }
    }

    pub fn from_config(config: &CommandConfig) -> Self {
        Self::new(&config.phrases, &config.names)
    }

    /// True if a chat message is one of the status phrases
    pub fn is_status_request(&self, text: &str) -> bool {
        let text = fold(text);
        self.phrases.iter().any(|p| *p == text)
    }

    /// True if a platform command event names the status command
    pub fn is_status_command(&self, name: &str) -> bool {
        let name = fold(name);
        self.names.iter().any(|n| *n == name)
    }
}

impl Default for CommandMatcher {
    fn default() -> Self {
        Self::from_config(&CommandConfig::default())
    }
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}
