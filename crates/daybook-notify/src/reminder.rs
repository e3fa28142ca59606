// SPDX-FileCopyrightText: 2026 Daybook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder description parsing.
//!
//! Entities carry either a legacy free-text reminder ("15 minutes before") or a
//! JSON array of structured reminders. Both forms resolve to a list of
//! [`ReminderDescriptor`]s. Parsing never fails: unknown text falls back to the
//! five-minute default and malformed JSON yields no reminders.

use std::sync::LazyLock;

use daybook_core::ReminderDescriptor;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

/// Offset used when free text is present but not recognized.
pub const DEFAULT_REMINDER_MINUTES: u32 = 5;

static MINUTES_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(5|15|30)\s*min(?:ute)?s?\s+before\b").unwrap());
static HOUR_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b1\s*(?:hour|hr)s?\s+before\b").unwrap());
static DAY_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b1\s*days?\s+before\b").unwrap());
static CUSTOM_HOURS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*h").unwrap());
static CUSTOM_MINUTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*m").unwrap());

/// Parse whichever reminder format `text` is in.
pub fn parse_reminder_spec(text: &str) -> Vec<ReminderDescriptor> {
    if text.trim_start().starts_with('[') {
        parse_reminder_json(text)
    } else {
        parse_reminder_string(text)
    }
}

/// Parse the legacy free-text vocabulary.
pub fn parse_reminder_string(text: &str) -> Vec<ReminderDescriptor> {
    let text = text.trim().to_lowercase();
    if text.is_empty() || text == "no reminder" {
        return Vec::new();
    }

    if let Some(rest) = text.strip_prefix("custom:") {
        if let Some(minutes) = custom_minutes(rest) {
            return vec![ReminderDescriptor::before(minutes)];
        }
    } else if text.contains("at task time") || text.contains("on time") {
        return vec![ReminderDescriptor::at_time()];
    } else if let Some(caps) = MINUTES_BEFORE.captures(&text) {
        if let Ok(minutes) = caps[1].parse() {
            return vec![ReminderDescriptor::before(minutes)];
        }
    } else if HOUR_BEFORE.is_match(&text) {
        return vec![ReminderDescriptor::before(60)];
    } else if DAY_BEFORE.is_match(&text) {
        return vec![ReminderDescriptor::before(24 * 60)];
    }

    debug!(reminder = %text, "unrecognized reminder text, using default offset");
    vec![ReminderDescriptor::before(DEFAULT_REMINDER_MINUTES)]
}

/// Sum the `<H>h` and `<M>m` fragments of a custom reminder.
///
/// Returns `None` when neither fragment is present.
fn custom_minutes(rest: &str) -> Option<u32> {
    let fragment = |re: &Regex| -> Option<u32> {
        re.captures(rest).and_then(|caps| caps[1].parse::<u32>().ok())
    };
    let hours = fragment(&CUSTOM_HOURS);
    let minutes = fragment(&CUSTOM_MINUTES);
    if hours.is_none() && minutes.is_none() {
        return None;
    }
    Some(
        hours
            .unwrap_or(0)
            .saturating_mul(60)
            .saturating_add(minutes.unwrap_or(0)),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredReminder {
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(alias = "minutesBefore")]
    offset_minutes: u32,
    #[serde(default)]
    label: Option<String>,
}

fn enabled_by_default() -> bool {
    true
}

/// Parse a JSON array of structured reminders, keeping only enabled ones.
///
/// Duplicate offsets collapse to the first occurrence since they would map to
/// the same notification id.
pub fn parse_reminder_json(text: &str) -> Vec<ReminderDescriptor> {
    let reminders: Vec<StructuredReminder> = match serde_json::from_str(text) {
        Ok(reminders) => reminders,
        Err(e) => {
            warn!(error = %e, "malformed reminder list, treating as empty");
            return Vec::new();
        }
    };

    let mut descriptors: Vec<ReminderDescriptor> = Vec::new();
    for reminder in reminders.into_iter().filter(|r| r.enabled) {
        if descriptors
            .iter()
            .any(|d| d.offset_minutes == reminder.offset_minutes)
        {
            continue;
        }
        let mut descriptor = ReminderDescriptor::before(reminder.offset_minutes);
        if let Some(label) = reminder.label.filter(|l| !l.trim().is_empty()) {
            descriptor.label = label;
        }
        descriptors.push(descriptor);
    }
    descriptors
}
