// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::ToolId;

/// One manufacturing-tool entry as the server reports it. Every field except
/// `current_status` is an opaque display string; `current_status` is free
/// text that drives classification into a `StatusCategory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub id: ToolId,
    pub mfg_tool_name: String,
    pub current_status: String,
    pub next_action: String,
    pub responsible_party: String,
    pub eta: String,
    pub last_updated: String,
}

/// Coarse status bucket derived from the free-text `current_status`.
/// `All` is the no-filter selection; records classify into at most one of
/// the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCategory {
    All,
    Operational,
    Maintenance,
    Down,
}

impl StatusCategory {
    pub const ALL: [Self; 4] = [Self::All, Self::Operational, Self::Maintenance, Self::Down];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Operational => "operational",
            Self::Maintenance => "maintenance",
            Self::Down => "down",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "total",
            Self::Operational => "operational",
            Self::Maintenance => "maintenance",
            Self::Down => "down/idle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "operational" => Some(Self::Operational),
            "maintenance" => Some(Self::Maintenance),
            "down" => Some(Self::Down),
            _ => None,
        }
    }

    /// Buckets a raw status string. Case-insensitive: "operational" exactly
    /// is operational, anything containing "maintenance" or "repair" is
    /// maintenance, "down" or "idle" exactly is down. Everything else
    /// belongs to no bucket (still listed under `All`).
    pub fn classify(status: &str) -> Option<Self> {
        let status = status.to_lowercase();
        if status == "operational" {
            Some(Self::Operational)
        } else if status.contains("maintenance") || status.contains("repair") {
            Some(Self::Maintenance)
        } else if status == "down" || status == "idle" {
            Some(Self::Down)
        } else {
            None
        }
    }

    /// Whether a record with this raw status is visible under `self`.
    pub fn matches(self, status: &str) -> bool {
        self == Self::All || Self::classify(status) == Some(self)
    }
}

/// Counter values for the summary strip, always tallied over the full
/// record set regardless of the active filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub operational: usize,
    pub maintenance: usize,
    pub down: usize,
}

impl StatusCounts {
    pub fn tally(records: &[ToolRecord]) -> Self {
        let mut counts = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match StatusCategory::classify(&record.current_status) {
                Some(StatusCategory::Operational) => counts.operational += 1,
                Some(StatusCategory::Maintenance) => counts.maintenance += 1,
                Some(StatusCategory::Down) => counts.down += 1,
                _ => {}
            }
        }
        counts
    }

    pub const fn value_for(self, category: StatusCategory) -> usize {
        match category {
            StatusCategory::All => self.total,
            StatusCategory::Operational => self.operational,
            StatusCategory::Maintenance => self.maintenance,
            StatusCategory::Down => self.down,
        }
    }
}
