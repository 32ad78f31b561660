//! Entity ownership: every document belongs to exactly one (type, id) pair.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of entities that can own documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Training,
    Voting,
    LoanRepayment,
    Fine,
    Savings,
    Meeting,
    Member,
    Group,
    Activity,
}

impl EntityType {
    pub const ALL: [EntityType; 9] = [
        EntityType::Training,
        EntityType::Voting,
        EntityType::LoanRepayment,
        EntityType::Fine,
        EntityType::Savings,
        EntityType::Meeting,
        EntityType::Member,
        EntityType::Group,
        EntityType::Activity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Training => "training",
            EntityType::Voting => "voting",
            EntityType::LoanRepayment => "loan_repayment",
            EntityType::Fine => "fine",
            EntityType::Savings => "savings",
            EntityType::Meeting => "meeting",
            EntityType::Member => "member",
            EntityType::Group => "group",
            EntityType::Activity => "activity",
        }
    }

    /// Top-level bucket name under the storage root: `{entityType}s`.
    pub fn dir_name(&self) -> String {
        format!("{}s", self.as_str())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete document owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub entity_id: i64,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, entity_id: i64) -> Self {
        Self {
            entity_type,
            entity_id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.entity_id)
    }
}
