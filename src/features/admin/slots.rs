use chrono::{Duration, NaiveTime};

use crate::core::error::{AppError, Result};
use crate::modules::backend::NewTimeSlot;
use crate::shared::constants::MAX_BULK_SLOTS;
use crate::shared::validation::TIME_OF_DAY_REGEX;

fn parse_time(value: &str, label: &str) -> Result<NaiveTime> {
    if !TIME_OF_DAY_REGEX.is_match(value) {
        return Err(AppError::validation(format!("{} must be HH:MM", label)));
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::validation(format!("{} must be HH:MM", label)))
}

/// Split `[start, end)` into back-to-back slots of `duration_minutes`.
///
/// A trailing remainder shorter than one slot is dropped. Ranges that fit no
/// slot at all, or more than [`MAX_BULK_SLOTS`], are rejected.
pub fn generate_slot_ranges(
    start: &str,
    end: &str,
    duration_minutes: i64,
    is_active: bool,
) -> Result<Vec<NewTimeSlot>> {
    let start_time = parse_time(start, "Start time")?;
    let end_time = parse_time(end, "End time")?;

    if duration_minutes <= 0 {
        return Err(AppError::validation("Slot duration must be positive"));
    }
    if end_time <= start_time {
        return Err(AppError::validation("End time must be after start time"));
    }

    let step = Duration::minutes(duration_minutes);
    let count = (end_time - start_time).num_minutes() / duration_minutes;
    if count == 0 {
        return Err(AppError::validation(
            "The time range is shorter than one slot",
        ));
    }
    if count as usize > MAX_BULK_SLOTS {
        return Err(AppError::validation(format!(
            "That would create {} slots; at most {} can be created at once",
            count, MAX_BULK_SLOTS
        )));
    }

    let mut slots = Vec::with_capacity(count as usize);
    let mut cursor = start_time;
    for _ in 0..count {
        let next = cursor + step;
        slots.push(NewTimeSlot {
            start_time: cursor.format("%H:%M").to_string(),
            end_time: next.format("%H:%M").to_string(),
            duration_minutes,
            is_active,
        });
        cursor = next;
    }

    Ok(slots)
}
