//! Formato en disco del documento (nbformat v4).

use std::path::Path;

use seqc_core::model::{MultilineText, Output};
use seqc_core::{Cell, DocumentPhase, ReportDocument, SeqcError};
use serde_json::json;

const SAMPLE: &str = r##"{
 "cells": [
  {"cell_type": "markdown", "metadata": {}, "source": ["# Title\n", "body"]},
  {"cell_type": "code", "execution_count": null, "metadata": {}, "outputs": [], "source": "x = 1+1"},
  {"cell_type": "raw", "metadata": {}, "source": "raw text"}
 ],
 "metadata": {"kernelspec": {"name": "python3", "display_name": "Python 3", "language": "python"}},
 "nbformat": 4,
 "nbformat_minor": 2
}"##;

#[test]
fn parses_string_and_list_sources() {
    let doc = ReportDocument::from_json_str(SAMPLE, Path::new("sample.ipynb")).unwrap();
    assert_eq!(doc.cells.len(), 3);
    assert_eq!(doc.cells[0].source(), "# Title\nbody");
    assert_eq!(doc.cells[1].source(), "x = 1+1");
    assert!(matches!(doc.cells[2], Cell::Raw(_)));
    assert_eq!(doc.phase(), None);
    assert!(doc.metadata.extra.contains_key("kernelspec"));
}

#[test]
fn rejects_unknown_version() {
    let text = SAMPLE.replace("\"nbformat\": 4", "\"nbformat\": 3");
    let err = ReportDocument::from_json_str(&text, Path::new("old.ipynb")).unwrap_err();
    match err {
        SeqcError::Format { path, reason } => {
            assert_eq!(path, Path::new("old.ipynb"));
            assert!(reason.contains("unsupported nbformat version 3"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn rejects_malformed_structure() {
    let text = json!({"nbformat": 4, "nbformat_minor": 5, "cells": [{"cell_type": "video"}]}).to_string();
    let err = ReportDocument::from_json_str(&text, Path::new("bad.ipynb")).unwrap_err();
    assert!(matches!(err, SeqcError::Format { .. }));

    let err = ReportDocument::from_json_str("not json", Path::new("bad.ipynb")).unwrap_err();
    assert!(matches!(err, SeqcError::Format { .. }));
}

#[test]
fn missing_file_is_read_error() {
    let err = ReportDocument::load(Path::new("/definitely/not/here.ipynb")).unwrap_err();
    assert!(matches!(err, SeqcError::Read { .. }));
}

#[test]
fn save_and_load_preserves_phase_and_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.ipynb");

    let mut doc = ReportDocument::new(vec![Cell::markdown("intro"), Cell::code("print(x)\nx")]);
    if let Cell::Code(code) = &mut doc.cells[1] {
        code.execution_count = Some(1);
        code.outputs.push(Output::Stream { name: "stdout".into(),
                                           text: MultilineText::new("2\n") });
    }
    doc.set_phase(DocumentPhase::Executed);
    doc.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"phase\": \"executed\""));
    assert!(text.contains("\"print(x)\\n\""));
    assert!(text.ends_with('\n'));

    let loaded = ReportDocument::load(&path).unwrap();
    assert_eq!(loaded, doc);
    assert_eq!(loaded.code_cell(2).unwrap().text_output(), "2");
}

#[test]
fn serialization_is_byte_stable() {
    let doc = ReportDocument::from_json_str(SAMPLE, Path::new("sample.ipynb")).unwrap();
    let a = doc.to_json_string().unwrap();
    let b = ReportDocument::from_json_str(&a, Path::new("again.ipynb")).unwrap().to_json_string().unwrap();
    assert_eq!(a, b);
}
