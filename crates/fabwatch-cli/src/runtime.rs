// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use fabwatch_api::{ApiOutcome, Client};
use fabwatch_app::{ToolId, ToolRecord};
use fabwatch_testkit::demo_tools;
use fabwatch_tui::{
    DashboardRuntime, InternalEvent, TransferEvent, TransferJob, TransferOutcome, refresh_outcome,
};
use std::sync::mpsc::Sender;
use std::thread;
use time::OffsetDateTime;
use time::macros::format_description;

/// Runtime backed by the dashboard HTTP service. Transfers run on a worker
/// thread so the key loop keeps drawing while a request is pending.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl DashboardRuntime for HttpRuntime {
    fn fetch_tools(&mut self) -> Result<Vec<ToolRecord>> {
        self.client.fetch_tools()
    }

    fn reload(&mut self) -> Result<TransferOutcome> {
        run_http_job(&self.client, TransferJob::Reload)
    }

    fn upload_csv(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<TransferOutcome> {
        run_http_job(
            &self.client,
            TransferJob::Upload {
                file_name: file_name.to_owned(),
                bytes,
            },
        )
    }

    fn spawn_transfer(
        &mut self,
        request_id: u64,
        job: TransferJob,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let action = job.action();
        thread::spawn(move || {
            let event = match run_http_job(&client, job) {
                Ok(outcome) => TransferEvent::Settled {
                    request_id,
                    action,
                    outcome,
                },
                Err(error) => TransferEvent::Failed {
                    request_id,
                    action,
                    error: error.to_string(),
                },
            };
            let _ = tx.send(InternalEvent::Transfer(event));
        });
        Ok(())
    }
}

fn run_http_job(client: &Client, job: TransferJob) -> Result<TransferOutcome> {
    match job {
        TransferJob::Reload => Ok(outcome_from(client.reload()?)),
        TransferJob::Upload { file_name, bytes } => {
            Ok(outcome_from(client.upload_csv(&file_name, bytes)?))
        }
        TransferJob::Refresh => Ok(refresh_outcome(client.fetch_tools()?)),
    }
}

fn outcome_from(outcome: ApiOutcome) -> TransferOutcome {
    TransferOutcome {
        success: outcome.success,
        message: outcome.message,
        tools: outcome.tools,
    }
}

const CSV_COLUMNS: [&str; 5] = [
    "MFGToolName",
    "CurrentStatus",
    "NextAction",
    "ResponsibleParty",
    "ETA",
];

/// Offline runtime over a canned fleet. Reload re-seeds it; upload parses
/// the provided CSV the way the service would, envelope messages included.
pub struct DemoRuntime {
    tools: Vec<ToolRecord>,
}

impl DemoRuntime {
    pub fn new() -> Self {
        Self {
            tools: demo_tools(),
        }
    }
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardRuntime for DemoRuntime {
    fn fetch_tools(&mut self) -> Result<Vec<ToolRecord>> {
        Ok(self.tools.clone())
    }

    fn reload(&mut self) -> Result<TransferOutcome> {
        self.tools = demo_tools();
        Ok(TransferOutcome {
            success: true,
            message: format!("Successfully loaded {} tools from CSV", self.tools.len()),
            tools: Some(self.tools.clone()),
        })
    }

    fn upload_csv(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<TransferOutcome> {
        if !file_name.ends_with(".csv") {
            return Ok(TransferOutcome {
                success: false,
                message: "File must be a CSV".to_owned(),
                tools: None,
            });
        }

        match parse_csv_fleet(&bytes) {
            Ok(tools) => {
                self.tools = tools;
                Ok(TransferOutcome {
                    success: true,
                    message: format!(
                        "Successfully loaded {} tools from uploaded CSV",
                        self.tools.len()
                    ),
                    tools: Some(self.tools.clone()),
                })
            }
            Err(error) => Ok(TransferOutcome {
                success: false,
                message: format!("Error processing upload: {error}"),
                tools: None,
            }),
        }
    }
}

/// Minimal CSV reader for demo uploads: comma-separated, no quoting, first
/// row is the header. Matches the sheet layout the service accepts.
fn parse_csv_fleet(bytes: &[u8]) -> Result<Vec<ToolRecord>> {
    let text = std::str::from_utf8(bytes).context("file is not valid UTF-8")?;
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| anyhow!("file is empty"))?
        .split(',')
        .map(str::trim)
        .collect();

    let mut columns = [0usize; CSV_COLUMNS.len()];
    for (slot, name) in CSV_COLUMNS.into_iter().enumerate() {
        columns[slot] = header
            .iter()
            .position(|column| *column == name)
            .ok_or_else(|| anyhow!("missing column {name:?}"))?;
    }

    let stamp = upload_stamp();
    let mut tools = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let cell = |slot: usize| fields.get(columns[slot]).copied().unwrap_or("").to_owned();
        tools.push(ToolRecord {
            id: ToolId::new(tools.len() as i64 + 1),
            mfg_tool_name: cell(0),
            current_status: cell(1),
            next_action: cell(2),
            responsible_party: cell(3),
            eta: cell(4),
            last_updated: stamp.clone(),
        });
    }
    Ok(tools)
}

fn upload_stamp() -> String {
    OffsetDateTime::now_utc()
        .format(&format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| "1970-01-01 00:00:00".to_owned())
}
