use std::fs;

use seqc::{DocumentPhase, MergedTable, Notebook, ReportBuilder, ReportDocument, SampleReference, SampleRole, SeqcError};

#[test]
fn merge_then_render_points_report_at_merged_table() {
    seqc::logging::init_for_tests();
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    fs::write(&a, "cell,g1\nc1,1\nc2,2\n").unwrap();
    fs::write(&b, "cell,g1\nc1,3\nc3,4\n").unwrap();

    let mut session = Notebook::with_builder(dir.path(), SampleReference::raw([&a, &b]), ReportBuilder::default());
    assert_eq!(session.samples().role(), SampleRole::Raw);

    let report = session.merge_data("merged_counts.csv", true).unwrap();
    assert_eq!(session.samples(), &SampleReference::merged(&report.merged_path));
    assert!(!a.exists() && !b.exists());
    assert_eq!(MergedTable::read(&report.merged_path).unwrap().keys(),
               vec![(0, "c1"), (0, "c2"), (1, "c1"), (1, "c3")]);

    let destination = dir.path().join("report.ipynb");
    session.write_template(&destination).unwrap();
    let doc = ReportDocument::load(&destination).unwrap();
    assert_eq!(doc.phase(), Some(DocumentPhase::Rendered));
    assert!(doc.cells[1].source().contains(&report.merged_path.display().to_string()));
}

#[test]
fn merging_twice_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    fs::write(&a, "cell,g1\nc1,1\n").unwrap();

    let mut session = Notebook::with_builder(dir.path(), SampleReference::raw([&a]), ReportBuilder::default());
    session.merge_data("merged.csv", false).unwrap();
    let err = session.merge_data("again.csv", false).unwrap_err();
    assert!(matches!(err, SeqcError::Internal(_)));
    assert!(!dir.path().join("again.csv").exists());
}

#[test]
fn failed_merge_keeps_raw_reference() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.csv");
    let mut session = Notebook::with_builder(dir.path(), SampleReference::raw([&missing]), ReportBuilder::default());

    assert!(matches!(session.merge_data("merged.csv", true), Err(SeqcError::Read { .. })));
    assert_eq!(session.samples().role(), SampleRole::Raw);
}

#[test]
fn unmerged_session_renders_list_of_samples() {
    let dir = tempfile::tempdir().unwrap();
    let session = Notebook::with_builder(dir.path(),
                                         SampleReference::raw(["s0.csv", "s1.csv"]),
                                         ReportBuilder::default());
    let destination = dir.path().join("report.ipynb");
    session.write_template(&destination).unwrap();

    let doc = ReportDocument::load(&destination).unwrap();
    assert!(doc.cells[1].source().contains(r#"sample = ["s0.csv", "s1.csv"]"#));
}

#[test]
fn run_notebook_executes_rendered_report() {
    if !seqc_kernel::interpreter_available(seqc_kernel::DEFAULT_PYTHON) {
        eprintln!("python3 no disponible, se omite el test");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let doc = ReportDocument::new(vec![seqc_core::Cell::code("x = 1+1"),
                                       seqc_core::Cell::markdown("notes"),
                                       seqc_core::Cell::code("print(x)")]);
    let path = dir.path().join("adhoc.ipynb");
    doc.save(&path).unwrap();

    let session = Notebook::with_builder(dir.path(), SampleReference::merged("m.csv"), ReportBuilder::default());
    let summary = session.run_notebook_with_timeout(&path, 60).unwrap();
    assert_eq!(summary.executed_cells, 2);

    let executed = ReportDocument::load(&path).unwrap();
    assert_eq!(executed.phase(), Some(DocumentPhase::Executed));
    assert_eq!(executed.code_cell(3).unwrap().text_output(), "2");
    fs::remove_dir_all(&summary.working_dir).unwrap();
}
