/// Parsing of the backup tool's semi-structured "info" output
///
/// The tool reports existing backups as free-form text, one block per
/// backup. This module extracts:
/// - The list of backup records in the order the tool prints them
/// - A derived status summary for dashboards (last backup, count, state)
///
/// The parser degrades gracefully: lines it does not recognize are skipped,
/// a garbled report simply yields fewer records. It never reports a failure
/// on cleanly captured output.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// One backup block from the info report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackupRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: String,
    pub size: String,
    pub duration: String,
}

/// Aggregate backup state for one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupState {
    Success,
    Failed,
    Running,
    None,
}

/// Derived summary of an instance's backup history
#[derive(Debug, Clone, Serialize)]
pub struct BackupStatus {
    pub last_backup_time: String,
    pub last_backup_type: String,
    pub last_backup_size: String,
    pub last_backup_duration: String,
    pub backup_count: usize,
    pub state: BackupState,
}

impl BackupStatus {
    /// Summary reported when the info command itself failed.
    /// A zero or garbled parse of a clean run never produces this.
    pub fn failed() -> Self {
        Self {
            last_backup_time: String::new(),
            last_backup_type: String::new(),
            last_backup_size: String::new(),
            last_backup_duration: String::new(),
            backup_count: 0,
            state: BackupState::Failed,
        }
    }
}

/// Value after the first `:` on a marker line, trimmed.
/// Timestamps contain `:` themselves, so only the first separator counts.
fn marker_value(line: &str) -> String {
    line.split_once(':')
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_default()
}

/// Parse the info report into backup records in encounter order
pub fn parse_backup_info(text: &str) -> Vec<BackupRecord> {
    static BACKUP_RE: OnceLock<Regex> = OnceLock::new();
    let backup_re = BACKUP_RE.get_or_init(|| Regex::new(r"backup:\s*(\S+)").unwrap());

    let mut backups = Vec::new();
    let mut current: Option<BackupRecord> = None;

    for line in text.lines() {
        if line.contains("backup:") {
            if let Some(record) = current.take() {
                backups.push(record);
            }

            if let Some(caps) = backup_re.captures(line) {
                current = Some(BackupRecord {
                    id: caps[1].to_string(),
                    ..Default::default()
                });
            }
        } else if let Some(record) = current.as_mut() {
            if line.contains("type:") {
                record.kind = marker_value(line);
            } else if line.contains("timestamp start:") {
                record.timestamp = marker_value(line);
            } else if line.contains("size:") {
                record.size = marker_value(line);
            } else if line.contains("time:") {
                record.duration = marker_value(line);
            }
        }
    }

    if let Some(record) = current {
        backups.push(record);
    }

    backups
}

/// Derive the status summary from an info report.
///
/// `running` comes from an external process probe; the report itself does
/// not say whether a backup is in flight.
pub fn backup_status(text: &str, running: bool) -> BackupStatus {
    let backups = parse_backup_info(text);
    let last = backups.first();

    // The count is the number of backup: lines, not of fully parsed
    // records; a garbled block still counts toward the total
    let backup_count = text
        .lines()
        .filter(|line| line.contains("backup:"))
        .count();

    let state = if running {
        BackupState::Running
    } else if backup_count == 0 {
        BackupState::None
    } else {
        BackupState::Success
    };

    BackupStatus {
        last_backup_time: last.map(|b| b.timestamp.clone()).unwrap_or_default(),
        last_backup_type: last.map(|b| b.kind.clone()).unwrap_or_default(),
        last_backup_size: last.map(|b| b.size.clone()).unwrap_or_default(),
        last_backup_duration: last.map(|b| b.duration.clone()).unwrap_or_default(),
        backup_count,
        state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_BACKUPS: &str = "\
stanza: main
    status: ok

    full backup: 20240312-010003F
        timestamp start: 2024-03-12 01:00:03
        type: full
        size: 2.1GB
        time: 184s

    incr backup: 20240311-130002I
        timestamp start: 2024-03-11 13:00:02
        type: incr
        size: 112MB
        time: 12s
";

    #[test]
    fn test_two_blocks_in_encounter_order() {
        let backups = parse_backup_info(TWO_BACKUPS);

        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].id, "20240312-010003F");
        assert_eq!(backups[0].kind, "full");
        assert_eq!(backups[0].size, "2.1GB");
        assert_eq!(backups[0].duration, "184s");
        assert_eq!(backups[1].id, "20240311-130002I");
        assert_eq!(backups[1].kind, "incr");
    }

    #[test]
    fn test_timestamp_keeps_time_of_day() {
        // The timestamp value itself contains ':' separators
        let backups = parse_backup_info(TWO_BACKUPS);
        assert_eq!(backups[0].timestamp, "2024-03-12 01:00:03");
    }

    #[test]
    fn test_status_reflects_first_block() {
        let status = backup_status(TWO_BACKUPS, false);

        assert_eq!(status.backup_count, 2);
        assert_eq!(status.last_backup_time, "2024-03-12 01:00:03");
        assert_eq!(status.last_backup_type, "full");
        assert_eq!(status.last_backup_size, "2.1GB");
        assert_eq!(status.last_backup_duration, "184s");
        assert_eq!(status.state, BackupState::Success);
    }

    #[test]
    fn test_running_flag_wins() {
        let status = backup_status(TWO_BACKUPS, true);
        assert_eq!(status.state, BackupState::Running);
    }

    #[test]
    fn test_empty_report_is_none_not_failed() {
        let status = backup_status("stanza: main\n    status: error (no valid backups)\n", false);
        assert_eq!(status.backup_count, 0);
        assert_eq!(status.state, BackupState::None);
    }

    #[test]
    fn test_tokenless_backup_line_counts_but_yields_no_record() {
        // A backup: line with no id token produces no record, yet still
        // counts toward the total like any other backup: line
        let text = "\
stanza: main
    backup:
    full backup: 20240312-010003F
        type: full
";
        let backups = parse_backup_info(text);
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].id, "20240312-010003F");

        let status = backup_status(text, false);
        assert_eq!(status.backup_count, 2);
        assert_eq!(status.state, BackupState::Success);
    }

    #[test]
    fn test_fields_before_first_backup_are_ignored() {
        let text = "type: stray\nsize: 9GB\nfull backup: 20240101-000000F\n    type: full\n";
        let backups = parse_backup_info(text);

        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].kind, "full");
    }
}
