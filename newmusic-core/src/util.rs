use chrono::NaiveDate;

/// Format a date the way the card header shows it, e.g. "Friday, October 11, 2024".
pub fn long_form_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Format a date as "YYYYMMDD", for file names.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// The file name a card rendered on `date` is written to.
pub fn card_file_name(date: NaiveDate, extension: &str) -> String {
    format!("new-releases-{}.{extension}", compact_date(date))
}
