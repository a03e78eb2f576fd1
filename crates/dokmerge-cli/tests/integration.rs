//! Integration tests for dokmerge CLI
//!
//! These tests drive the command functions against template and data files
//! written to a scratch directory.

use std::fs;
use std::path::{Path, PathBuf};

use dokmerge_cli::{inspect_command, merge_command, placeholders_command, MergeArgs, OnError};
use dokmerge_data::test_utils::{write_workbook, Cell};
use dokmerge_ooxml::test_utils::{create_template, extract_document_xml};
use dokmerge_ooxml::Document;
use tempfile::TempDir;

const BODY: &str = concat!(
    r#"<w:p><w:r><w:t>项目编号：</w:t></w:r><w:r><w:t>{{研发活动</w:t></w:r><w:r><w:t>编号}}</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t>项目名称：{{研发活动名称}}</w:t></w:r></w:p>"#,
    r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>预算</w:t></w:r></w:p></w:tc>"#,
    r#"<w:tc><w:p><w:r><w:t>{{预算}} 万元</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
);

fn write_template(dir: &Path) -> PathBuf {
    let path = dir.join("模板.docx");
    fs::write(&path, create_template(BODY)).unwrap();
    path
}

fn write_data(dir: &Path) -> PathBuf {
    write_workbook(
        dir,
        "研发活动.xlsx",
        &[
            (
                "活动",
                vec![
                    vec![
                        Cell::Text("研发活动编号"),
                        Cell::Text("研发活动名称"),
                        Cell::Text("预算"),
                    ],
                    vec![Cell::Text("RD001"), Cell::Text("测试项目"), Cell::Number(120.0)],
                    vec![Cell::Text("RD002"), Cell::Text("新材料"), Cell::Number(35.5)],
                ],
            ),
            (
                "汇总",
                vec![vec![Cell::Text("合计")], vec![Cell::Number(155.5)]],
            ),
        ],
    )
}

fn texts(path: &Path) -> String {
    let bytes = fs::read(path).unwrap();
    Document::parse(extract_document_xml(&bytes).as_bytes())
        .unwrap()
        .plain_text()
}

#[test]
fn test_merge_generates_one_document_per_row() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out");

    let report = merge_command(&MergeArgs {
        template: write_template(dir.path()),
        data: write_data(dir.path()),
        output: Some(output.clone()),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(report.generated.len(), 2);
    assert_eq!(
        texts(&output.join("RD001-测试项目.docx")),
        "项目编号：RD001\n\n项目名称：测试项目\n\n预算\n\n120 万元"
    );
    assert_eq!(
        texts(&output.join("RD002-新材料.docx")),
        "项目编号：RD002\n\n项目名称：新材料\n\n预算\n\n35.5 万元"
    );
}

#[test]
fn test_merge_with_config_file_and_flag_override() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("dokmerge.toml");
    fs::write(
        &config,
        format!(
            "[output]\ndir = {:?}\n\n[naming]\nid_field = \"研发活动名称\"\nname_field = \"研发活动编号\"\n",
            dir.path().join("from-config").display().to_string()
        ),
    )
    .unwrap();

    let report = merge_command(&MergeArgs {
        template: write_template(dir.path()),
        data: write_data(dir.path()),
        config: Some(config.clone()),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        report.generated[0],
        dir.path().join("from-config").join("测试项目-RD001.docx")
    );

    let report = merge_command(&MergeArgs {
        template: write_template(dir.path()),
        data: write_data(dir.path()),
        config: Some(config),
        output: Some(dir.path().join("from-flag")),
        name_fields: Some(vec!["研发活动编号".into(), "预算".into()]),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        report.generated[1],
        dir.path().join("from-flag").join("RD002-35.5.docx")
    );
}

#[test]
fn test_merge_missing_naming_column_fails() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.csv");
    fs::write(&data, "编号,名称\nRD001,测试项目\n").unwrap();
    let output = dir.path().join("out");

    let err = merge_command(&MergeArgs {
        template: write_template(dir.path()),
        data,
        output: Some(output.clone()),
        ..Default::default()
    })
    .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("研发活动编号"), "{}", message);
    assert!(!output.exists());
}

#[test]
fn test_merge_skip_reports_failures() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data.csv");
    fs::write(
        &data,
        "研发活动编号,研发活动名称,预算\nRD001,好,1\nRD002,坏,\"\u{0}\"\n",
    )
    .unwrap();
    let output = dir.path().join("out");

    let err = merge_command(&MergeArgs {
        template: write_template(dir.path()),
        data,
        output: Some(output.clone()),
        on_error: Some(OnError::Skip),
        ..Default::default()
    })
    .unwrap_err();

    assert_eq!(err.to_string(), "1 row(s) could not be generated");
    assert!(output.join("RD001-好.docx").exists());
    assert!(!output.join("RD002-坏.docx").exists());
}

#[test]
fn test_merge_missing_template() {
    let dir = TempDir::new().unwrap();
    let err = merge_command(&MergeArgs {
        template: dir.path().join("absent.dotx"),
        data: write_data(dir.path()),
        output: Some(dir.path().join("out")),
        ..Default::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("Template file not found"));
}

#[test]
fn test_placeholders_lists_unique_names() {
    let dir = TempDir::new().unwrap();
    let names = placeholders_command(&write_template(dir.path()), false).unwrap();
    assert_eq!(names, vec!["研发活动名称", "研发活动编号", "预算"]);
}

#[test]
fn test_inspect_named_sheet() {
    let dir = TempDir::new().unwrap();
    let data = write_data(dir.path());

    let rows = inspect_command(&data, None).unwrap();
    assert_eq!(rows.headers(), ["研发活动编号", "研发活动名称", "预算"]);
    assert_eq!(rows.len(), 2);

    let rows = inspect_command(&data, Some("汇总")).unwrap();
    assert_eq!(rows.headers(), ["合计"]);
    assert_eq!(rows.len(), 1);
}
