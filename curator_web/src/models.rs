//! Domain Models
//!
//! Records as they come out of the store, plus the immutable field sets the
//! handlers hand to the store on writes.

use chrono::{DateTime, Utc};
use serde::Serialize;

const HUMAN_DATE: &str = "%d/%m/%Y";

fn human_date(t: &DateTime<Utc>) -> String {
    t.format(HUMAN_DATE).to_string()
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub created: DateTime<Utc>,
}

impl Source {
    pub fn created_on(&self) -> String {
        human_date(&self.created)
    }
}

/// A source as listed on the home page, with its count of open infos.
///
/// Serializes to the `{name, curatifs}` shape the chart expects.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SourceSummary {
    #[serde(skip)]
    pub id: i64,
    pub name: String,
    pub curatifs: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Info {
    pub id: i64,
    pub source_id: i64,
    pub agent: String,
    pub material: String,
    #[sqlx(rename = "details")]
    pub detail: String,
    pub priority: i64,
    pub estimate: Option<String>,
    pub status: String,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

impl Info {
    pub fn created_on(&self) -> String {
        human_date(&self.created)
    }

    pub fn updated_on(&self) -> Option<String> {
        self.updated.as_ref().map(human_date)
    }

    pub fn estimate_or_empty(&self) -> &str {
        self.estimate.as_deref().unwrap_or_default()
    }
}

/// The columns the source page needs for its info table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InfoSummary {
    pub id: i64,
    pub source_id: i64,
    pub material: String,
    pub priority: i64,
    pub status: String,
    pub created: DateTime<Utc>,
}

impl InfoSummary {
    pub fn created_on(&self) -> String {
        human_date(&self.created)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFields {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoFields {
    pub agent: String,
    pub material: String,
    pub detail: String,
    pub priority: i64,
    pub estimate: Option<String>,
    pub status: String,
}
