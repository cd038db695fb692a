//! Power-exercise gating.
//!
//! Swings and other power work are kept off easy days entirely, and on
//! medium/hard days they are rationed by the configured cadence.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DayType, PowerFrequency, UserState};

/// How the fortnightly cadence decides that "now" is a different period
/// than the last power session.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PowerWindow {
    /// Monday-aligned two-week windows; eligible once the window changes
    #[default]
    WeekAligned,
    /// Eligible once 14 whole days have elapsed
    Rolling,
}

/// Monday-aligned week index in the proleptic Gregorian calendar
fn week_index(at: DateTime<Utc>) -> i64 {
    let date = at.date_naive();
    let days = i64::from(date.num_days_from_ce());
    let weekday_offset = i64::from(date.weekday().num_days_from_monday());
    (days - weekday_offset).div_euclid(7)
}

fn fortnight_index(at: DateTime<Utc>) -> i64 {
    week_index(at).div_euclid(2)
}

/// Whether power work may appear in a session generated now
pub fn power_allowed(
    state: &UserState,
    day_type: DayType,
    now: DateTime<Utc>,
    window: PowerWindow,
) -> bool {
    if day_type == DayType::Easy {
        return false;
    }

    match state.power_frequency {
        PowerFrequency::Weekly => true,
        PowerFrequency::Fortnightly => match state.power_last_used {
            None => true,
            Some(last) => {
                let eligible = match window {
                    PowerWindow::WeekAligned => fortnight_index(now) != fortnight_index(last),
                    PowerWindow::Rolling => (now - last).num_days() >= 14,
                };
                if !eligible {
                    tracing::debug!(
                        last_used = %last,
                        ?window,
                        "Power blocked by fortnightly cadence"
                    );
                }
                eligible
            }
        },
    }
}
