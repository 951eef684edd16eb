// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use fabwatch_app::{ToolId, ToolRecord};
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, Time};

const TOOL_AREAS: [&str; 8] = [
    "Litho Scanner",
    "Etch Chamber",
    "CVD Furnace",
    "CMP Polisher",
    "Ion Implanter",
    "Metrology SEM",
    "Wet Bench",
    "Wire Bonder",
];

// Round-robin status assignment keeps every category represented in any
// fleet of eight or more tools, including one status outside all buckets.
const DEMO_STATUSES: [&str; 8] = [
    "Operational",
    "Under Repair",
    "Operational",
    "Down",
    "Scheduled Maintenance",
    "Idle",
    "Operational",
    "Qualification",
];

const NEXT_ACTIONS: [&str; 6] = [
    "None",
    "Replace worn pad",
    "Awaiting vendor parts",
    "PM due this week",
    "Requalify after repair",
    "Chamber clean",
];

const RESPONSIBLE_PARTIES: [&str; 6] = [
    "K. Imai",
    "R. Soto",
    "Facilities",
    "Night Shift",
    "D. Okafor",
    "Vendor FSE",
];

const ETAS: [&str; 5] = ["N/A", "Aug 24", "Aug 26", "EOD", "Next PM window"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic generator of plausible fab-tool records.
#[derive(Debug, Clone)]
pub struct ToolFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl ToolFaker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: DeterministicRng::new(if seed == 0 { 1 } else { seed }),
            next_id: 1,
        }
    }

    pub fn tool(&mut self) -> ToolRecord {
        let id = self.next_id;
        self.next_id += 1;

        let area = TOOL_AREAS[(id as usize - 1) % TOOL_AREAS.len()];
        let status = DEMO_STATUSES[(id as usize - 1) % DEMO_STATUSES.len()];
        let bay = 1 + (id - 1) / TOOL_AREAS.len() as i64;

        ToolRecord {
            id: ToolId::new(id),
            mfg_tool_name: format!("{area} {bay:02}"),
            current_status: status.to_owned(),
            next_action: self.pick(&NEXT_ACTIONS).to_owned(),
            responsible_party: self.pick(&RESPONSIBLE_PARTIES).to_owned(),
            eta: self.pick(&ETAS).to_owned(),
            last_updated: last_updated_stamp(id),
        }
    }

    pub fn fleet(&mut self, size: usize) -> Vec<ToolRecord> {
        (0..size).map(|_| self.tool()).collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

/// Canned fleet served by demo mode. Big enough that every status
/// category has at least one member.
pub fn demo_tools() -> Vec<ToolRecord> {
    ToolFaker::new(1).fleet(12)
}

fn last_updated_stamp(id: i64) -> String {
    let stamp = reference_now() - time::Duration::minutes(17 * id);
    stamp
        .format(&format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .expect("format reference stamp")
}

fn reference_now() -> OffsetDateTime {
    let date = Date::from_calendar_date(2026, Month::August, 21).expect("valid calendar date");
    let time = Time::from_hms(16, 30, 0).expect("valid time of day");
    date.with_time(time).assume_utc()
}
