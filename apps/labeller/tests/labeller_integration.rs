use labeller::{
    LabellerError,
    segment::Segmenter,
    writer::ChunkRecord,
};
use std::fs;

fn segmenter(dir: &std::path::Path, chunk: usize) -> Segmenter {
    Segmenter::new(dir, chunk, vec!["Spam".to_string(), "Not Spam".to_string()])
}

#[test]
fn unlabelled_clean_writes_txc_lines() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("reddit.txt"), "a b,\nc d\ne\n").unwrap();

    let summary = segmenter(dir.path(), 2).clean("reddit.txt", None).unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(summary.dropped_tokens, 1);
    assert_eq!(summary.output, dir.path().join("reddit.txc"));
    assert_eq!(
        fs::read_to_string(dir.path().join("reddit.txc")).unwrap(),
        "a b\nc d\n"
    );
}

#[test]
fn labelled_clean_appends_csv_rows() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("text_from_papers.txt.example"),
        "one, two three four five six seven",
    )
    .unwrap();
    let segmenter = segmenter(dir.path(), 3);

    segmenter.clean("text_from_papers.txt.example", Some(1)).unwrap();
    segmenter.clean("text_from_papers.txt.example", Some(0)).unwrap();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(dir.path().join("text_from_papers.csv"))
        .unwrap();
    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();

    assert_eq!(
        rows,
        vec![
            vec!["one two three", "Not Spam"],
            vec!["four five six", "Not Spam"],
            vec!["one two three", "Spam"],
            vec!["four five six", "Spam"],
        ]
    );
}

#[test]
fn unknown_label_and_missing_file_are_distinct_errors() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "x y").unwrap();
    let segmenter = segmenter(dir.path(), 1);

    assert!(matches!(
        segmenter.clean("a.txt", Some(5)),
        Err(LabellerError::UnknownLabel { index: 5, available: 2 })
    ));
    assert!(matches!(
        segmenter.clean("absent.txt", None),
        Err(LabellerError::Io { .. })
    ));
    assert!(!dir.path().join("a.csv").exists());
}

#[test]
fn clean_all_processes_txt_files_and_skips_failures() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.txt"), "b1 b2 b3 b4").unwrap();
    fs::write(dir.path().join("a.txt"), "a1 a2").unwrap();
    fs::write(dir.path().join("ignored.md"), "m1 m2").unwrap();

    let summaries = segmenter(dir.path(), 2).clean_all(None).unwrap();

    let outputs: Vec<_> = summaries.iter().map(|s| s.output.clone()).collect();
    assert_eq!(
        outputs,
        vec![dir.path().join("a.txc"), dir.path().join("b.txc")]
    );
    assert_eq!(fs::read_to_string(dir.path().join("b.txc")).unwrap(), "b1 b2\nb3 b4\n");
    assert!(!dir.path().join("ignored.txc").exists());

    // An out-of-range label fails every file, which is logged rather than raised.
    assert!(segmenter(dir.path(), 2).clean_all(Some(9)).unwrap().is_empty());
}

#[test]
fn bulk_rows_land_in_datasets_dir() {
    let dir = tempfile::tempdir().unwrap();
    let segmenter = segmenter(dir.path(), 2);

    segmenter
        .write_rows(
            &[
                ChunkRecord::new("First sentence", "1.0"),
                ChunkRecord::new("Second sentence", "0.0"),
            ],
            "debugging.csv",
        )
        .unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("debugging.csv")).unwrap(),
        "First sentence,1.0\r\nSecond sentence,0.0\r\n"
    );
}
