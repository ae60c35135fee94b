//! Spreadsheet export of registrations as CSV.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{CoreError, CoreResult};
use crate::registration::RegistrationRecord;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const HEADERS: [&str; 12] = [
    "ID",
    "Name",
    "Email",
    "Contact",
    "Program",
    "Semester",
    "Roll No",
    "Event",
    "Team",
    "Transaction ID",
    "Account No",
    "Registration Date",
];

/// Renders `records` as a CSV sheet in the order given.
pub fn registrations_csv(records: &[RegistrationRecord]) -> CoreResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(HEADERS)
        .map_err(|e| CoreError::Export(e.to_string()))?;

    for r in records {
        let id = r.id.to_string();
        let date = format_registration_date(r.created_at);
        wtr.write_record([
            id.as_str(),
            r.name.as_str(),
            r.email.as_str(),
            r.contact.as_str(),
            r.program.as_str(),
            r.semester.as_str(),
            r.rollno.as_str(),
            r.event.as_str(),
            r.team.as_deref().unwrap_or("N/A"),
            r.transaction_id.as_str(),
            r.account_no.as_str(),
            date.as_str(),
        ])
        .map_err(|e| CoreError::Export(e.to_string()))?;
    }

    wtr.into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))
}

/// `MM/DD/YYYY, hh:mm:ss AM`
pub fn format_registration_date(at: DateTime<Utc>) -> String {
    at.format("%m/%d/%Y, %I:%M:%S %p").to_string()
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("Registrations_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: i64, team: Option<&str>) -> RegistrationRecord {
        RegistrationRecord {
            id,
            name: "Bilal, Jr.".to_string(),
            email: "bilal@example.com".to_string(),
            contact: "0300".to_string(),
            program: "BSSE".to_string(),
            semester: "3".to_string(),
            rollno: "22-SE-7".to_string(),
            event: "Capture the Flag (Fee: 200)".to_string(),
            team: team.map(str::to_string),
            transaction_id: "TX1".to_string(),
            account_no: "ACC1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        }
    }

    #[test]
    fn date_uses_twelve_hour_clock() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(format_registration_date(at), "03/09/2024, 02:05:07 PM");
    }

    #[test]
    fn filename_carries_date() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 2).unwrap();
        assert_eq!(export_filename(date), "Registrations_2024-11-02.csv");
    }

    #[test]
    fn empty_export_has_header_only() {
        let out = String::from_utf8(registrations_csv(&[]).unwrap()).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("ID,Name,Email"));
        assert!(out.trim_end().ends_with("Registration Date"));
    }

    #[test]
    fn rows_quote_commas_and_default_team() {
        let out =
            String::from_utf8(registrations_csv(&[record(1, None), record(2, Some("Blue"))]).unwrap())
                .unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,\"Bilal, Jr.\",bilal@example.com"));
        assert!(lines[1].contains(",N/A,"));
        assert!(lines[2].contains(",Blue,"));
        assert!(lines[2].ends_with("\"03/09/2024, 02:05:07 PM\""));
    }
}
