use crate::error::SyncError;

/// Validated `owner/repo` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn parse(value: &str) -> Result<Self, SyncError> {
        let value = value.trim();
        let Some((owner, name)) = value.split_once('/') else {
            return Err(SyncError::ConfigInvalid(format!(
                "Repository must be in owner/repo form, got '{}'",
                value
            )));
        };
        let valid = |part: &str| !part.is_empty() && !part.contains('/') && !part.chars().any(char::is_whitespace);
        if !valid(owner) || !valid(name) {
            return Err(SyncError::ConfigInvalid(format!(
                "Repository must be in owner/repo form, got '{}'",
                value
            )));
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
