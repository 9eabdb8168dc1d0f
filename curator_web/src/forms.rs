//! HTML form payloads.
//!
//! Forms keep exactly what the user typed so they can be shown again on a
//! validation failure. A valid form turns into the immutable field set that
//! the database layer takes.

use serde::Deserialize;

use crate::models::{Info, InfoFields, Source, SourceFields};
use crate::validator::{BLANK_FIELD, NOT_A_NUMBER, Validator, is_integer, not_blank};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceForm {
    pub name: String,

    #[serde(skip)]
    pub validator: Validator,
}

impl SourceForm {
    pub fn error(&self, field: &str) -> Option<&str> {
        self.validator.field_error(field)
    }

    pub fn validate(mut self) -> Result<SourceFields, SourceForm> {
        self.validator
            .check_field(not_blank(&self.name), "name", BLANK_FIELD);

        if !self.validator.is_valid() {
            return Err(self);
        }

        Ok(SourceFields {
            name: self.name.trim().to_string(),
        })
    }
}

impl From<&Source> for SourceForm {
    fn from(source: &Source) -> Self {
        Self {
            name: source.name.clone(),
            validator: Validator::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InfoForm {
    pub agent: String,
    pub material: String,
    pub detail: String,
    pub priority: String,
    pub estimate: String,
    pub status: String,

    #[serde(skip)]
    pub validator: Validator,
}

impl InfoForm {
    pub fn error(&self, field: &str) -> Option<&str> {
        self.validator.field_error(field)
    }

    pub fn validate(mut self) -> Result<InfoFields, InfoForm> {
        let required = [
            ("agent", &self.agent),
            ("material", &self.material),
            ("detail", &self.detail),
            ("priority", &self.priority),
            ("status", &self.status),
        ];
        for (field, value) in required {
            self.validator.check_field(not_blank(value), field, BLANK_FIELD);
        }
        self.validator
            .check_field(is_integer(&self.priority), "priority", NOT_A_NUMBER);

        if !self.validator.is_valid() {
            return Err(self);
        }

        let Ok(priority) = self.priority.trim().parse::<i64>() else {
            self.validator.add_field_error("priority", NOT_A_NUMBER);
            return Err(self);
        };

        let estimate = self.estimate.trim();
        Ok(InfoFields {
            agent: self.agent.trim().to_string(),
            material: self.material.trim().to_string(),
            detail: self.detail.trim().to_string(),
            priority,
            estimate: (!estimate.is_empty()).then(|| estimate.to_string()),
            status: self.status.trim().to_string(),
        })
    }
}

impl From<&Info> for InfoForm {
    fn from(info: &Info) -> Self {
        Self {
            agent: info.agent.clone(),
            material: info.material.clone(),
            detail: info.detail.clone(),
            priority: info.priority.to_string(),
            estimate: info.estimate.clone().unwrap_or_default(),
            status: info.status.clone(),
            validator: Validator::default(),
        }
    }
}
