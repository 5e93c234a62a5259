//! Execution context threaded through every store and source call
//!
//! Runs execute on behalf of a principal (by default the privileged system
//! user) against a branch of the store. The context also carries the
//! cooperative cancellation flag checked between records.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tokio::sync::watch;

/// Branch every run reads and writes
pub const BRANCH_MASTER: &str = "master";

/// Identity a run executes as
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    pub id_provider: String,
    pub login: String,
}

impl Principal {
    pub fn new(id_provider: impl Into<String>, login: impl Into<String>) -> Self {
        Self {
            id_provider: id_provider.into(),
            login: login.into(),
        }
    }

    /// The privileged system identity (`user:system:su`)
    pub fn system_su() -> Self {
        Self::new("system", "su")
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}:{}", self.id_provider, self.login)
    }
}

impl FromStr for Principal {
    type Err = String;

    /// Parses the `user:<id-provider>:<login>` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("user"), Some(provider), Some(login))
                if !provider.is_empty() && !login.is_empty() =>
            {
                Ok(Self::new(provider, login))
            }
            _ => Err(format!(
                "Invalid principal '{s}'. Expected format: user:<id-provider>:<login>"
            )),
        }
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Explicit execution context for one run
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    principal: Principal,
    branch: String,
    dry_run: bool,
    cancel: Option<watch::Receiver<bool>>,
}

impl ExecutionContext {
    /// Context for a run as `principal` on the master branch
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            branch: BRANCH_MASTER.to_string(),
            dry_run: false,
            cancel: None,
        }
    }

    /// Context for a run as the privileged system user
    pub fn system() -> Self {
        Self::new(Principal::system_su())
    }

    /// Attaches a cancellation signal; `true` on the channel stops the run
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Skip store writes while still classifying records
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_principal_display() {
        assert_eq!(Principal::system_su().to_string(), "user:system:su");
    }

    #[test]
    fn test_principal_parse() {
        let p: Principal = "user:system:su".parse().unwrap();
        assert_eq!(p, Principal::system_su());
        assert!("system:su".parse::<Principal>().is_err());
        assert!("user::su".parse::<Principal>().is_err());
    }

    #[test]
    fn test_default_context() {
        let ctx = ExecutionContext::default();
        assert_eq!(ctx.branch(), BRANCH_MASTER);
        assert_eq!(ctx.principal(), &Principal::system_su());
        assert!(!ctx.is_cancelled());
        assert!(!ctx.is_dry_run());
    }

    #[test]
    fn test_cancellation_flag() {
        let (tx, rx) = watch::channel(false);
        let ctx = ExecutionContext::system().with_cancellation(rx);
        assert!(!ctx.is_cancelled());

        tx.send(true).unwrap();
        assert!(ctx.is_cancelled());
    }
}
