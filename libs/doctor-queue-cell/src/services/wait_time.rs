/// Estimated wait for the patient at `position`, e.g. `"45 minutes"`,
/// `"1 hour"` or `"2 hours 15 minutes"`.
pub fn format_estimated_wait(position: u64, average_minutes: u32) -> String {
    let total = position * u64::from(average_minutes);
    if total < 60 {
        return minutes(total);
    }

    let hours = total / 60;
    let remainder = total % 60;
    let hours_part = if hours == 1 {
        "1 hour".to_string()
    } else {
        format!("{} hours", hours)
    };

    if remainder == 0 {
        hours_part
    } else {
        format!("{} {}", hours_part, minutes(remainder))
    }
}

fn minutes(m: u64) -> String {
    if m == 1 {
        "1 minute".to_string()
    } else {
        format!("{} minutes", m)
    }
}
