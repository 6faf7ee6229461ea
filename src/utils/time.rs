use chrono::{DateTime, NaiveDate, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn minutes_from_now(minutes: i64) -> DateTime<Utc> {
    now() + chrono::Duration::minutes(minutes)
}
