use time::Date;

/// Freshness label shown next to inventory items, mirroring the front-end
/// rule: past expiry is "Expired", three days out or less is "Expiring Soon",
/// everything else (including no expiry at all) is "Fresh".
pub fn food_status(expiry_date: Option<Date>, today: Date) -> &'static str {
    let Some(expiry) = expiry_date else {
        return "Fresh";
    };
    let days_left = (expiry - today).whole_days();
    if days_left < 0 {
        "Expired"
    } else if days_left <= 3 {
        "Expiring Soon"
    } else {
        "Fresh"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn status_buckets_follow_the_expiry_distance() {
        let today = date!(2025 - 06 - 10);
        assert_eq!(food_status(None, today), "Fresh");
        assert_eq!(food_status(Some(date!(2025 - 06 - 09)), today), "Expired");
        assert_eq!(food_status(Some(date!(2025 - 06 - 10)), today), "Expiring Soon");
        assert_eq!(food_status(Some(date!(2025 - 06 - 13)), today), "Expiring Soon");
        assert_eq!(food_status(Some(date!(2025 - 06 - 14)), today), "Fresh");
    }
}
