use serde::{Deserialize, Serialize};

/// Identity of a person known to the certification body.
///
/// Actor identities are referenced by the append-only status log and must
/// therefore outlive the audits they touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ActorId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Staff role held within the certification body. Capabilities that depend
/// on the audit itself (lead auditor of a particular team) are positional
/// and resolved against the audit's team, not this role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Administrator,
    Auditor,
    TechnicalReviewer,
    DecisionMaker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub role: StaffRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: StaffRole) -> Self {
        Self {
            id: ActorId::new(id),
            name: name.into(),
            role,
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.role == StaffRole::Administrator
    }

    pub fn is_technical_reviewer(&self) -> bool {
        self.role == StaffRole::TechnicalReviewer
    }
}
