//! Report serialization.

use super::Report;
use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Tsv,
    Json,
}

/// Write the report in the given format
pub fn write_report<W: Write>(
    report: &Report,
    format: ExportFormat,
    writer: W,
) -> Result<(), ReportError> {
    match format {
        ExportFormat::Tsv => write_tsv(report, writer),
        ExportFormat::Json => write_json(report, writer),
    }
}

/// Columns: keep, delete, ssim, rule
pub fn write_tsv<W: Write>(report: &Report, mut writer: W) -> Result<(), ReportError> {
    writeln!(writer, "keep\tdelete\tssim\trule")?;

    for resolution in &report.resolutions {
        writeln!(
            writer,
            "{}\t{}\t{:.6}\t{}",
            resolution.keep.display(),
            resolution.delete.display(),
            resolution.score,
            resolution.rule
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Pretty-printed JSON of the whole report
pub fn write_json<W: Write>(report: &Report, mut writer: W) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reporter::tests::sample_result;
    use crate::core::resolver::DuplicateAction;

    fn report() -> Report {
        Report::new(&sample_result(), 0.94, DuplicateAction::Delete)
    }

    #[test]
    fn tsv_has_header_and_one_row_per_resolution() {
        let mut buffer = Vec::new();
        write_tsv(&report(), &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "keep\tdelete\tssim\trule",
                "/keep/a.jpg\t/delete/a.jpg\t0.998000\tauthoritative",
                "/delete/big.jpg\t/delete/small.jpg\t0.950000\tlarger-area",
            ]
        );
    }

    #[test]
    fn json_contains_rows_folders_and_totals() {
        let mut buffer = Vec::new();
        write_report(&report(), ExportFormat::Json, &mut buffer).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["action"], "delete");
        assert_eq!(value["resolutions"][1]["rule"], "larger-area");
        assert_eq!(value["folders"][0]["folder"], "/delete");
        assert_eq!(value["totals"]["matched_pairs"], 2);
        assert!(value["generated_at"].is_string());
    }
}
