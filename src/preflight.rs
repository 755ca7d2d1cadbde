use crate::error::QrError;
use crate::models::{QrCodeDetails, RequestRow};
use crate::payload::InstantTransferQr;
use crate::reference::AMOUNT_DIGITS;
use crate::util::{has_partial_hour_offset, is_valid_bic};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct PreflightIssue {
    pub level: IssueLevel,
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct PreflightReport {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub rows_by_kind: HashMap<String, usize>,
    pub issues: Vec<PreflightIssue>,
}

impl PreflightReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.level == IssueLevel::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.level == IssueLevel::Warning)
            .count()
    }
}

pub fn preflight_csv(path: &Path) -> Result<PreflightReport, String> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| err.to_string())?;
    let mut report = PreflightReport {
        total_rows: 0,
        valid_rows: 0,
        rows_by_kind: HashMap::new(),
        issues: Vec::new(),
    };

    for (idx, result) in reader.deserialize::<RequestRow>().enumerate() {
        let row = idx + 1;
        report.total_rows += 1;
        let request = match result {
            Ok(request) => request,
            Err(err) => {
                log::debug!("row {} does not parse: {}", row, err);
                report
                    .issues
                    .push(issue(IssueLevel::Error, row, "row cannot be parsed"));
                continue;
            }
        };

        let (kind, details) = request.into_parts();
        *report.rows_by_kind.entry(kind.to_string()).or_insert(0) += 1;
        let errors_before = report.error_count();
        validate_details(&details, row, &mut report.issues);

        match InstantTransferQr::new(kind, details) {
            Ok(qr) => {
                for (field, value) in qr.fields() {
                    if value.contains('\n') {
                        let message = format!("{} contains a line feed", field.label());
                        report.issues.push(issue(IssueLevel::Warning, row, &message));
                    }
                }
                if let Err(err) = qr.payload() {
                    report
                        .issues
                        .push(issue(IssueLevel::Error, row, error_message(&err)));
                }
            }
            Err(err) => report
                .issues
                .push(issue(IssueLevel::Error, row, error_message(&err))),
        }
        if report.error_count() == errors_before {
            report.valid_rows += 1;
        }
    }

    Ok(report)
}

fn validate_details(details: &QrCodeDetails, row: usize, issues: &mut Vec<PreflightIssue>) {
    if details.bic.trim().is_empty() {
        issues.push(issue(IssueLevel::Warning, row, "bic is empty"));
    } else if !is_valid_bic(&details.bic) {
        issues.push(issue(
            IssueLevel::Warning,
            row,
            "bic is not a valid BIC format",
        ));
    }
    if details.name.trim().is_empty() {
        issues.push(issue(IssueLevel::Warning, row, "name is empty"));
    }
    if details.iban.trim().is_empty() {
        issues.push(issue(IssueLevel::Warning, row, "iban is empty"));
    }
    if let Some(amount) = details.amount {
        if amount > 0 && amount.to_string().len() > AMOUNT_DIGITS {
            issues.push(issue(
                IssueLevel::Warning,
                row,
                "amount is wider than 12 digits",
            ));
        }
    }
    if let Some(ts) = details.valid_until.as_ref() {
        if has_partial_hour_offset(ts.offset()) {
            issues.push(issue(
                IssueLevel::Warning,
                row,
                "valid_until offset minutes are dropped",
            ));
        }
    }
}

fn error_message(err: &QrError) -> &'static str {
    match err {
        QrError::InvalidAmount(_) => "amount must be greater than 0",
        QrError::DescriptionTooLong(_) => "description exceeds 70 characters",
        QrError::PayloadTooLong(_) => "payload exceeds 345 characters",
    }
}

fn issue(level: IssueLevel, row: usize, message: &str) -> PreflightIssue {
    PreflightIssue {
        level,
        row,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "kind,bic,name,iban,amount,valid_until,purpose,description,shop_id,merch_dev_id,invoice_id,customer_id,cred_tran_id,loyalty_id,nav_check_id";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn messages(report: &PreflightReport, level: IssueLevel) -> Vec<&str> {
        report
            .issues
            .iter()
            .filter(|issue| issue.level == level)
            .map(|issue| issue.message.as_str())
            .collect()
    }

    #[test]
    fn clean_rows_have_no_issues() {
        let file = write_csv(&[
            "HCT,OTPVHUHB,Kovacs Kft,HU42117730161111101800000000,,,,,,,,,,,",
            "RTP,GIBAHUHB,Szabo Bt,HU42117730161111101800000000,1500,2023-01-05T08:03:07+01:00,,Invoice,,,,,,,",
        ]);
        let report = preflight_csv(file.path()).unwrap();

        assert_eq!(report.total_rows, 2);
        assert_eq!(report.valid_rows, 2);
        assert_eq!(report.rows_by_kind.get("HCT"), Some(&1));
        assert_eq!(report.rows_by_kind.get("RTP"), Some(&1));
        assert!(report.issues.is_empty());
    }

    #[test]
    fn builder_errors_are_reported_per_row() {
        let long = "d".repeat(71);
        let row = format!(
            "RTP,OTPVHUHB,Kovacs Kft,HU42117730161111101800000000,,,,{},,,,,,,",
            long
        );
        let file = write_csv(&[
            "HCT,OTPVHUHB,Kovacs Kft,HU42117730161111101800000000,0,,,,,,,,,,",
            &row,
        ]);
        let report = preflight_csv(file.path()).unwrap();

        assert_eq!(report.error_count(), 2);
        assert_eq!(report.valid_rows, 0);
        assert_eq!(
            messages(&report, IssueLevel::Error),
            vec!["amount must be greater than 0", "description exceeds 70 characters"]
        );
        assert_eq!(report.issues[1].row, 2);
    }

    #[test]
    fn lenient_fields_raise_warnings() {
        let file = write_csv(&[
            "HCT,,,,,2023-01-05T08:03:07+05:30,,,,,,,,,",
            "RTP,OTPV,Kovacs Kft,HU42117730161111101800000000,1234567890123,,,,,,,,,,",
        ]);
        let report = preflight_csv(file.path()).unwrap();

        assert_eq!(report.error_count(), 0);
        assert_eq!(report.valid_rows, 2);
        assert_eq!(
            messages(&report, IssueLevel::Warning),
            vec![
                "bic is empty",
                "name is empty",
                "iban is empty",
                "valid_until offset minutes are dropped",
                "bic is not a valid BIC format",
                "amount is wider than 12 digits",
            ]
        );
    }

    #[test]
    fn line_feeds_inside_fields_are_flagged() {
        let file = write_csv(&[
            "HCT,OTPVHUHB,Kovacs Kft,HU42117730161111101800000000,,,\"first\nsecond\",,,,,,,,",
        ]);
        let report = preflight_csv(file.path()).unwrap();
        assert_eq!(
            messages(&report, IssueLevel::Warning),
            vec!["purpose contains a line feed"]
        );
        assert_eq!(report.valid_rows, 1);
    }

    #[test]
    fn unparsable_rows_are_errors() {
        let file = write_csv(&["SCT,OTPVHUHB,Kovacs Kft,HU42117730161111101800000000,,,,,,,,,,,"]);
        let report = preflight_csv(file.path()).unwrap();
        assert_eq!(messages(&report, IssueLevel::Error), vec!["row cannot be parsed"]);
        assert!(report.rows_by_kind.is_empty());
    }
}
