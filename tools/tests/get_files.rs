use std::fs;
use std::path::Path;

use host_agent_tools::{FileRetrievalError, FileRetrievalService};
use host_agent_types::{DirectoryName, FileErrorCode, GetFilesRequest};
use tempfile::tempdir;

fn corpus(root: &Path) {
    let docs = root.join("n8n-docs");
    fs::create_dir_all(docs.join("nodes")).unwrap();
    fs::write(docs.join("a.md"), "# A\nworkflow basics\n").unwrap();
    fs::write(docs.join("nodes/http.md"), "HTTP Request node").unwrap();
    fs::write(root.join("outside.txt"), "do not leak").unwrap();
}

fn paths(files: &[&str]) -> Vec<String> {
    files.iter().map(|f| (*f).to_string()).collect()
}

#[test]
fn found_missing_and_traversal_are_split() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let service = FileRetrievalService::new(dir.path());

    let result = service
        .get_files(
            DirectoryName::N8nDocs,
            &paths(&["a.md", "missing.md", "../../etc/passwd"]),
        )
        .unwrap();

    assert_eq!(result.files.len(), 1);
    assert_eq!(result.files[0].path, "a.md");
    assert_eq!(result.files[0].content, "# A\nworkflow basics\n");
    assert_eq!(result.files[0].size, 20);

    assert_eq!(result.errors.len(), 2);
    assert_eq!(result.errors[0].file, "missing.md");
    assert_eq!(result.errors[0].code, FileErrorCode::NotFound);
    assert_eq!(result.errors[0].error, "File not found");
    assert_eq!(result.errors[1].file, "../../etc/passwd");
    assert_eq!(result.errors[1].code, FileErrorCode::PathTraversal);
    assert_eq!(result.errors[1].error, "Path traversal attempt detected");
}

#[test]
fn every_requested_path_is_accounted_for_once() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let service = FileRetrievalService::new(dir.path());
    let requested = paths(&[
        "nodes/http.md",
        "nodes",
        "../outside.txt",
        "/etc/hostname",
        "a.md",
        "nope/deeper.md",
    ]);

    let result = service
        .get_files(DirectoryName::N8nDocs, &requested)
        .unwrap();

    let mut seen: Vec<&str> = result
        .files
        .iter()
        .map(|f| f.path.as_str())
        .chain(result.errors.iter().map(|e| e.file.as_str()))
        .collect();
    seen.sort_unstable();
    let mut expected: Vec<&str> = requested.iter().map(String::as_str).collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);
}

#[test]
fn escaped_content_is_never_returned() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let service = FileRetrievalService::new(dir.path());

    let result = service
        .get_files(
            DirectoryName::N8nDocs,
            &paths(&["../outside.txt", "nodes/../../outside.txt"]),
        )
        .unwrap();

    assert!(result.files.is_empty());
    assert!(
        result
            .errors
            .iter()
            .all(|e| e.code == FileErrorCode::PathTraversal)
    );
}

#[cfg(unix)]
#[test]
fn symlink_out_of_base_is_traversal() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    std::os::unix::fs::symlink(
        dir.path().join("outside.txt"),
        dir.path().join("n8n-docs/innocent.md"),
    )
    .unwrap();
    let service = FileRetrievalService::new(dir.path());

    let result = service
        .get_files(DirectoryName::N8nDocs, &paths(&["innocent.md"]))
        .unwrap();
    assert!(result.files.is_empty());
    assert_eq!(result.errors[0].code, FileErrorCode::PathTraversal);
}

#[test]
fn directory_entry_is_not_a_file() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let service = FileRetrievalService::new(dir.path());

    let result = service
        .get_files(DirectoryName::N8nDocs, &paths(&["nodes"]))
        .unwrap();
    assert_eq!(result.errors[0].code, FileErrorCode::NotAFile);
    assert_eq!(result.errors[0].error, "Path is not a file");
}

#[test]
fn invalid_utf8_is_decoded_lossily() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    fs::write(dir.path().join("n8n-docs/latin1.md"), b"caf\xe9").unwrap();
    let service = FileRetrievalService::new(dir.path());

    let result = service
        .get_files(DirectoryName::N8nDocs, &paths(&["latin1.md"]))
        .unwrap();
    assert_eq!(result.files[0].content, "caf\u{FFFD}");
    assert_eq!(result.files[0].size, 4);
}

#[test]
fn missing_directory_fails_whole_request() {
    let dir = tempdir().unwrap();
    corpus(dir.path());
    let service = FileRetrievalService::new(dir.path());

    let err = service
        .get_files(DirectoryName::N8nNodes, &paths(&["a.md"]))
        .unwrap_err();
    assert!(matches!(err, FileRetrievalError::DirectoryNotFound { .. }));
}

#[test]
fn unknown_directory_is_rejected_before_any_io() {
    let request = GetFilesRequest {
        directory: "etc".to_string(),
        files: paths(&["passwd"]),
    };
    let err = request.validate().unwrap_err();
    assert_eq!(err.to_string(), "Invalid directory: etc");
}
