use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    domain::{Deal, Stage},
    error::ApiError,
};

const MAX_COMPANY_CHARS: usize = 255;
const MAX_SECTOR_CHARS: usize = 255;
const MAX_FUNDING_STAGE_CHARS: usize = 100;
const MAX_OWNER_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCreate {
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(rename = "stage", default, skip_serializing_if = "Option::is_none")]
    pub funding_stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founders: Option<String>,
    #[serde(rename = "column", default)]
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_owner: Option<String>,
}

impl DealCreate {
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            sector: None,
            funding_stage: None,
            founders: None,
            stage: Stage::New,
            notes: None,
            next_step: None,
            internal_owner: None,
        }
    }

    pub fn in_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        check_company(&self.company)?;
        check_len("sector", self.sector.as_deref(), MAX_SECTOR_CHARS)?;
        check_len("stage", self.funding_stage.as_deref(), MAX_FUNDING_STAGE_CHARS)?;
        check_len("internal_owner", self.internal_owner.as_deref(), MAX_OWNER_CHARS)?;
        Ok(())
    }
}

/// Partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears it (sent as an explicit `null`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub sector: Option<Option<String>>,
    #[serde(
        rename = "stage",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub funding_stage: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub founders: Option<Option<String>>,
    #[serde(rename = "column", default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_step: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_owner: Option<Option<String>>,
}

impl DealUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(company) = &self.company {
            check_company(company)?;
        }
        check_len("sector", self.sector.as_ref().and_then(Option::as_deref), MAX_SECTOR_CHARS)?;
        check_len(
            "stage",
            self.funding_stage.as_ref().and_then(Option::as_deref),
            MAX_FUNDING_STAGE_CHARS,
        )?;
        check_len(
            "internal_owner",
            self.internal_owner.as_ref().and_then(Option::as_deref),
            MAX_OWNER_CHARS,
        )?;
        Ok(())
    }

    /// Writes every present field onto `deal`. Position is left alone.
    pub fn apply_to(&self, deal: &mut Deal) {
        if let Some(company) = &self.company {
            deal.company = company.clone();
        }
        if let Some(sector) = &self.sector {
            deal.sector = sector.clone();
        }
        if let Some(funding_stage) = &self.funding_stage {
            deal.funding_stage = funding_stage.clone();
        }
        if let Some(founders) = &self.founders {
            deal.founders = founders.clone();
        }
        if let Some(stage) = self.stage {
            deal.stage = stage;
        }
        if let Some(notes) = &self.notes {
            deal.notes = notes.clone();
        }
        if let Some(next_step) = &self.next_step {
            deal.next_step = next_step.clone();
        }
        if let Some(internal_owner) = &self.internal_owner {
            deal.internal_owner = internal_owner.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealMoveRequest {
    pub column: Stage,
    #[serde(default)]
    pub position: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealListResponse {
    pub items: Vec<Deal>,
    pub total: usize,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn check_company(company: &str) -> Result<(), ApiError> {
    if company.is_empty() {
        return Err(ApiError::validation("company must not be empty"));
    }
    check_len("company", Some(company), MAX_COMPANY_CHARS)
}

fn check_len(field: &str, value: Option<&str>, max_chars: usize) -> Result<(), ApiError> {
    match value {
        Some(value) if value.chars().count() > max_chars => Err(ApiError::validation(format!(
            "{field} must be at most {max_chars} characters"
        ))),
        _ => Ok(()),
    }
}
