//! External lead records
//!
//! Companies found outside the platform (directories, trade fairs, imports)
//! that the sales team may invite as suppliers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::users::normalize_category;

/// Max rows accepted by one import call
pub const MAX_IMPORT_BATCH: usize = 500;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Converted,
    Discarded,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Converted => "converted",
            Self::Discarded => "discarded",
        }
    }
}

impl From<String> for LeadStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "contacted" => Self::Contacted,
            "converted" => Self::Converted,
            "discarded" => Self::Discarded,
            _ => Self::New,
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One incoming lead row
#[derive(Debug, Clone, Deserialize)]
pub struct LeadInput {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Bulk import request
#[derive(Debug, Clone, Deserialize)]
pub struct ImportLeadsRequest {
    pub source: String,
    pub leads: Vec<LeadInput>,
}

/// A lead cleaned up and ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanLead {
    pub name: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ImportLeadsRequest {
    /// Validate the batch and return cleaned rows plus the number skipped.
    ///
    /// Rows without a name are skipped, and so are repeats of a name already
    /// seen in this batch (case-insensitive).
    pub fn clean(&self) -> Result<(Vec<CleanLead>, usize), String> {
        if self.source.trim().is_empty() {
            return Err("source is required".into());
        }
        if self.leads.len() > MAX_IMPORT_BATCH {
            return Err(format!(
                "at most {} leads can be imported at once",
                MAX_IMPORT_BATCH
            ));
        }

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.leads.len());
        for lead in &self.leads {
            let name = lead.name.trim();
            if name.is_empty() || !seen.insert(name.to_lowercase()) {
                continue;
            }
            out.push(CleanLead {
                name: name.to_string(),
                category: lead
                    .category
                    .as_deref()
                    .map(normalize_category)
                    .filter(|c| !c.is_empty()),
                location: clean(&lead.location),
                website: clean(&lead.website),
                email: clean(&lead.email).map(|e| e.to_lowercase()),
                phone: clean(&lead.phone),
            });
        }
        let skipped = self.leads.len() - out.len();
        Ok((out, skipped))
    }
}

/// Import outcome
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub received: usize,
    pub inserted: u64,
    pub skipped: usize,
    pub duplicates: u64,
}

/// Response DTO for lead
#[derive(Debug, Clone, Serialize)]
pub struct LeadResponse {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LeadQuery {
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLeadRequest {
    pub status: LeadStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(name: &str) -> LeadInput {
        LeadInput {
            name: name.into(),
            category: Some(" Steel Pipes ".into()),
            location: Some("  ".into()),
            website: None,
            email: Some("Sales@Example.COM".into()),
            phone: None,
        }
    }

    #[test]
    fn clean_skips_blank_and_repeated_names() {
        let req = ImportLeadsRequest {
            source: "indiamart".into(),
            leads: vec![lead("Acme Pipes"), lead(" "), lead("ACME PIPES"), lead("Zenith")],
        };
        let (rows, skipped) = req.clean().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(skipped, 2);
        assert_eq!(rows[0].name, "Acme Pipes");
        assert_eq!(rows[0].category.as_deref(), Some("steel pipes"));
        assert_eq!(rows[0].location, None);
        assert_eq!(rows[0].email.as_deref(), Some("sales@example.com"));
    }

    #[test]
    fn oversized_batch_rejected() {
        let req = ImportLeadsRequest {
            source: "csv".into(),
            leads: (0..=MAX_IMPORT_BATCH).map(|i| lead(&format!("Co {}", i))).collect(),
        };
        assert!(req.clean().is_err());
    }

    #[test]
    fn source_required() {
        let req = ImportLeadsRequest {
            source: " ".into(),
            leads: vec![lead("Acme")],
        };
        assert!(req.clean().is_err());
    }
}
