use crate::api::Time;

/// Compact relative age, eg. "45min" or "2h"
pub fn time_ago(then: Time, now: Time) -> String {
    let age = now - then;
    if age.num_minutes() < 1 {
        String::from("now")
    } else if age.num_hours() < 1 {
        format!("{}min", age.num_minutes())
    } else if age.num_days() < 1 {
        format!("{}h", age.num_hours())
    } else if age.num_weeks() < 1 {
        format!("{}d", age.num_days())
    } else {
        format!("{}w", age.num_weeks())
    }
}
