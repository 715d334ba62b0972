use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Command result in both structured and tabular form.
///
/// `data` is emitted for JSON; `columns` and `rows` back the table and CSV
/// renderings.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub data: Value,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn new(data: Value, columns: Vec<&'static str>) -> Self {
        Self {
            data,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

pub fn render(report: &Report, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&report.data)?
            } else {
                serde_json::to_string(&report.data)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Csv => write_csv(report, &mut out)?,
        OutputFormat::Table => write_table(report, &mut out)?,
    }

    Ok(())
}

pub fn write_csv_file(report: &Report, path: &Path) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_path(path)?;
    write_records(report, &mut writer)
}

fn write_csv(report: &Report, out: impl Write) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_writer(out);
    write_records(report, &mut writer)
}

fn write_records<W: Write>(report: &Report, writer: &mut csv::Writer<W>) -> Result<(), CliError> {
    writer.write_record(&report.columns)?;
    for row in &report.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_table(report: &Report, mut out: impl Write) -> Result<(), CliError> {
    if report.rows.is_empty() {
        writeln!(out, "No results.")?;
        return Ok(());
    }

    let mut widths = report
        .columns
        .iter()
        .map(|column| column.len())
        .collect::<Vec<_>>();
    for row in &report.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let header = report
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{column:<width$}"))
        .collect::<Vec<_>>();
    writeln!(out, "{}", header.join("  ").trim_end())?;

    for row in &report.rows {
        let cells = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>();
        writeln!(out, "{}", cells.join("  ").trim_end())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Report {
        let mut report = Report::new(
            json!([]),
            vec!["strategy", "num_assets", "time_seconds"],
        );
        report.push_row(vec!["sequential".into(), "3".into(), "0.1234".into()]);
        report.push_row(vec!["concurrent".into(), "3".into(), "0.0456".into()]);
        report
    }

    #[test]
    fn csv_has_header_then_rows() {
        let mut buffer = Vec::new();
        write_csv(&sample(), &mut buffer).expect("csv written");

        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(
            text,
            "strategy,num_assets,time_seconds\nsequential,3,0.1234\nconcurrent,3,0.0456\n"
        );
    }

    #[test]
    fn table_pads_columns() {
        let mut buffer = Vec::new();
        write_table(&sample(), &mut buffer).expect("table written");

        let text = String::from_utf8(buffer).expect("utf8");
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "strategy    num_assets  time_seconds");
        assert_eq!(lines[1], "sequential  3           0.1234");
    }

    #[test]
    fn csv_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("timings.csv");

        write_csv_file(&sample(), &path).expect("file written");

        let text = std::fs::read_to_string(path).expect("readable");
        assert!(text.starts_with("strategy,num_assets,time_seconds\n"));
        assert_eq!(text.lines().count(), 3);
    }
}
