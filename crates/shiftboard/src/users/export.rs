use std::io::Write;

use serde::Serialize;

use super::service::{WorkingHoursSource, WorkingHoursSummary};

/// One CSV line, in [`HEADER`] order.
#[derive(Debug, Serialize)]
struct WorkingHoursRow<'a> {
    user: &'a str,
    name: &'a str,
    date: String,
    hours: String,
    reason: &'a str,
    source: &'static str,
}

const HEADER: [&str; 6] = ["User", "Name", "Date", "Hours", "Reason", "Source"];

/// Write one row per working-hours item, for every summary. The header line is written even
/// when there are no items.
pub fn write_working_hours_csv<W: Write>(
    writer: W,
    summaries: &[WorkingHoursSummary],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(HEADER)?;
    for summary in summaries {
        for item in &summary.items {
            csv_writer.serialize(WorkingHoursRow {
                user: &summary.user.0,
                name: &summary.name,
                date: item.date.format("%Y-%m-%d").to_string(),
                hours: format!("{:.2}", item.hours),
                reason: &item.reason,
                source: match item.source {
                    WorkingHoursSource::Participation => "participation",
                    WorkingHoursSource::Manual => "manual",
                },
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}
