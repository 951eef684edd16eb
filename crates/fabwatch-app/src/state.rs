// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::StatusCategory;

/// View state for the dashboard. The active filter decides row visibility
/// on every draw; the status line is the transient notice text, cleared by
/// a scheduled `ClearStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_filter: StatusCategory,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_filter: StatusCategory::All,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SetFilter(StatusCategory),
    NextFilter,
    PrevFilter,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    FilterChanged(StatusCategory),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SetFilter(category) => self.select_filter(category),
            AppCommand::NextFilter => {
                let next = self.rotated_filter(1);
                self.select_filter(next)
            }
            AppCommand::PrevFilter => {
                let previous = self.rotated_filter(-1);
                self.select_filter(previous)
            }
            AppCommand::SetStatus(message) => {
                vec![self.set_status(&message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// Re-selecting the current filter is allowed and re-announces it; the
    /// visible set is unchanged because visibility derives from state.
    fn select_filter(&mut self, category: StatusCategory) -> Vec<AppEvent> {
        self.active_filter = category;
        vec![
            AppEvent::FilterChanged(category),
            self.set_status(filter_notice(category)),
        ]
    }

    fn rotated_filter(&self, delta: isize) -> StatusCategory {
        let filters = StatusCategory::ALL;
        let current = filters
            .iter()
            .position(|filter| *filter == self.active_filter)
            .unwrap_or(0) as isize;
        let len = filters.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        filters[next]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

/// Notice text announcing which category is shown.
pub const fn filter_notice(category: StatusCategory) -> &'static str {
    match category {
        StatusCategory::All => "Showing all tools",
        StatusCategory::Operational => "Showing operational tools only",
        StatusCategory::Maintenance => "Showing tools under maintenance/repair",
        StatusCategory::Down => "Showing down/idle tools only",
    }
}
