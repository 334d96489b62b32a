//! Tables for human-readable listings and transfer reports

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use cx_core::{EntityKind, RemoteEntity, TaskStatus, TransferReport};
use cx_rclone::FileEntry;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn new_table(header: impl Into<Row>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn kind_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Bucket => "bucket",
        EntityKind::Object => "object",
        EntityKind::Drive => "drive",
        EntityKind::Folder => "folder",
        EntityKind::File => "file",
        EntityKind::Item => "item",
    }
}

/// Listing of buckets, objects, drives, folders or files
///
/// OneDrive entities carry opaque ids the user needs for later commands,
/// so `show_ids` adds an ID column.
pub fn entity_table(entities: &[RemoteEntity], show_ids: bool) -> Table {
    let mut header = vec!["Name", "Kind", "Size", "Modified"];
    if show_ids {
        header.push("ID");
    }
    let mut table = new_table(header);

    for entity in entities {
        let modified = entity
            .last_modified
            .map(|ts| ts.strftime(TIME_FORMAT).to_string())
            .unwrap_or_default();
        let mut row = vec![
            Cell::new(&entity.name),
            Cell::new(kind_label(entity.kind)),
            Cell::new(entity.size_human.as_deref().unwrap_or("")),
            Cell::new(modified),
        ];
        if show_ids {
            row.push(Cell::new(&entity.id));
        }
        table.add_row(row);
    }
    table
}

/// Per-item outcome of a batch
pub fn report_table(report: &TransferReport, colors: bool) -> Table {
    let mut table = new_table(["#", "Source", "Destination", "Status", "Size", "Detail"]);

    for (index, task) in report.tasks().iter().enumerate() {
        let mut status = Cell::new(task.status());
        if colors {
            status = match task.status() {
                TaskStatus::Success => status.fg(Color::Green),
                TaskStatus::Failed => status.fg(Color::Red),
                _ => status,
            };
        }
        let size = task
            .bytes
            .map(|b| humansize::format_size(b, humansize::BINARY))
            .unwrap_or_default();

        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&task.source),
            Cell::new(&task.destination),
            status,
            Cell::new(size),
            Cell::new(task.detail.as_deref().unwrap_or("")),
        ]);
    }
    table
}

/// Entries returned by `rclone lsjson`
pub fn file_entry_table(entries: &[FileEntry]) -> Table {
    let mut table = new_table(["Name", "Size", "Modified", "Type"]);

    for entry in entries {
        let size = if entry.is_dir {
            String::new()
        } else {
            humansize::format_size(entry.size.max(0) as u64, humansize::BINARY)
        };
        let kind = if entry.is_dir {
            "dir".to_string()
        } else {
            entry.mime_type.clone().unwrap_or_default()
        };
        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(size),
            Cell::new(entry.mod_time.as_deref().unwrap_or("")),
            Cell::new(kind),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use cx_core::{ItemRef, TransferTask};

    use super::*;

    #[test]
    fn test_entity_table_ids_column() {
        let entities = vec![
            RemoteEntity::folder("01ABC", "Reports"),
            RemoteEntity::file("01DEF", "q1.pdf", 2048),
        ];

        let rendered = entity_table(&entities, true).to_string();
        assert!(rendered.contains("Reports"));
        assert!(rendered.contains("01DEF"));
        assert!(rendered.contains("2 KiB"));

        let rendered = entity_table(&entities, false).to_string();
        assert!(!rendered.contains("01DEF"));
    }

    #[test]
    fn test_report_table_rows() {
        let mut ok = TransferTask::new(
            ItemRef::s3("bucket", "a.txt"),
            ItemRef::onedrive("drive", "root", "a.txt"),
        );
        ok.start().unwrap();
        ok.succeed(10).unwrap();

        let mut failed = TransferTask::new(
            ItemRef::s3("bucket", "b.txt"),
            ItemRef::onedrive("drive", "root", "b.txt"),
        );
        failed.start().unwrap();
        failed.fail("403 Forbidden: b.txt").unwrap();

        let mut report = TransferReport::new();
        report.push(ok);
        report.push(failed);

        let rendered = report_table(&report, false).to_string();
        assert!(rendered.contains("s3://bucket/a.txt"));
        assert!(rendered.contains("Success"));
        assert!(rendered.contains("Failed"));
        assert!(rendered.contains("403 Forbidden: b.txt"));
    }

    #[test]
    fn test_file_entry_table() {
        let entries = vec![FileEntry {
            path: "docs".into(),
            name: "docs".into(),
            size: -1,
            mime_type: Some("inode/directory".into()),
            mod_time: None,
            is_dir: true,
            id: None,
            extra: BTreeMap::new(),
        }];

        let rendered = file_entry_table(&entries).to_string();
        assert!(rendered.contains("docs"));
        assert!(rendered.contains("dir"));
    }
}
