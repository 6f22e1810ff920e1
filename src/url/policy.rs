use crate::config::ScopeConfig;
use crate::url::domain::domain_of;
use crate::url::matcher::matches_any_domain;
use crate::ConfigError;
use regex::Regex;

/// Outcome of evaluating a URL against the scope policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Accepted by the include/exclude patterns
    Allowed,
    /// Rejected by the patterns, but accepted because the host is on the
    /// allowed-domain list
    AllowedByDomain,
    /// Rejected
    Rejected,
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Compiled include/exclude patterns and allowed domains
///
/// `allowed = (no includes || any include matches) && no exclude matches`.
/// When the patterns reject a URL whose host equals or sits under an allowed
/// domain, the URL is accepted anyway. That override also beats exclude
/// patterns.
#[derive(Debug, Clone)]
pub struct ScopePolicy {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    allowed_domains: Vec<String>,
}

impl ScopePolicy {
    /// Compiles the patterns of a scope configuration
    pub fn new(scope: &ScopeConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            include: compile_all(&scope.include_patterns)?,
            exclude: compile_all(&scope.exclude_patterns)?,
            allowed_domains: scope
                .allowed_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
        })
    }

    /// Checks only the include/exclude patterns
    pub fn matches_patterns(&self, url: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(url));
        let excluded = self.exclude.iter().any(|re| re.is_match(url));
        included && !excluded
    }

    /// Checks only the allowed-domain list
    pub fn matches_allowed_domain(&self, url: &str) -> bool {
        domain_of(url).is_some_and(|host| matches_any_domain(&self.allowed_domains, &host))
    }

    /// Evaluates the full policy for a URL
    pub fn evaluate(&self, url: &str) -> PolicyDecision {
        if self.matches_patterns(url) {
            PolicyDecision::Allowed
        } else if self.matches_allowed_domain(url) {
            PolicyDecision::AllowedByDomain
        } else {
            PolicyDecision::Rejected
        }
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        self.evaluate(url).is_allowed()
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| ConfigError::InvalidPattern(format!("Invalid pattern '{}': {}", p, e)))
        })
        .collect()
}
