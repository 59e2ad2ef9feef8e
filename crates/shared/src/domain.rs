use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealId(pub Uuid);

impl DealId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DealId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DealId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Pipeline column a deal sits in. Variant order is pipeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Stage {
    #[default]
    #[serde(rename = "novo")]
    New,
    #[serde(rename = "conversando")]
    Talking,
    #[serde(rename = "analisando")]
    Analyzing,
    #[serde(rename = "comite")]
    Committee,
    #[serde(rename = "investido")]
    Invested,
    #[serde(rename = "arquivado")]
    Archived,
}

impl Stage {
    pub const COUNT: usize = 6;

    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::New,
        Stage::Talking,
        Stage::Analyzing,
        Stage::Committee,
        Stage::Invested,
        Stage::Archived,
    ];

    pub fn index(self) -> usize {
        match self {
            Stage::New => 0,
            Stage::Talking => 1,
            Stage::Analyzing => 2,
            Stage::Committee => 3,
            Stage::Invested => 4,
            Stage::Archived => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::New => "New",
            Stage::Talking => "Talking",
            Stage::Analyzing => "Analyzing",
            Stage::Committee => "Committee",
            Stage::Invested => "Invested",
            Stage::Archived => "Archived",
        }
    }

    /// Value used for this stage on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Stage::New => "novo",
            Stage::Talking => "conversando",
            Stage::Analyzing => "analisando",
            Stage::Committee => "comite",
            Stage::Invested => "investido",
            Stage::Archived => "arquivado",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stage '{0}'")]
pub struct ParseStageError(pub String);

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Stage::ALL
            .into_iter()
            .find(|stage| {
                stage.wire_name().eq_ignore_ascii_case(needle)
                    || stage.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}

/// Funding rounds offered as suggestions when editing a deal.
pub const FUNDING_STAGE_OPTIONS: [&str; 5] = ["Pre-Seed", "Seed", "Series A", "Series B", "Series C+"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub company: String,
    #[serde(default)]
    pub sector: Option<String>,
    /// Funding round, e.g. "Seed". Unrelated to the pipeline stage.
    #[serde(rename = "stage", default)]
    pub funding_stage: Option<String>,
    #[serde(default)]
    pub founders: Option<String>,
    #[serde(rename = "column")]
    pub stage: Stage,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub next_step: Option<String>,
    #[serde(default)]
    pub internal_owner: Option<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
