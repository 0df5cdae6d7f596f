//! Fixture discovery.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use crosscheck_core::TestCase;

use crate::error::{HarnessError, HarnessResult};

/// Read every file in `dir` whose extension is `extension`.
///
/// Order is whatever the directory listing yields; no sort is applied. Any listing or read error
/// aborts the scan, so callers never see a partial corpus. Subdirectories are not descended into.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), extension = %extension))]
pub fn scan(dir: &Path, extension: &str) -> HarnessResult<Vec<TestCase>> {
    let list_error = |source| HarnessError::ListCorpus {
        path: dir.to_path_buf(),
        source,
    };

    let mut cases = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_error)? {
        let path = entry.map_err(list_error)?.path();
        if path.extension() != Some(OsStr::new(extension)) || !path.is_file() {
            continue;
        }

        let source_text = fs::read_to_string(&path).map_err(|source| HarnessError::ReadFixture {
            path: path.clone(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        cases.push(TestCase::new(file_name, source_text));
    }

    tracing::info!(count = cases.len(), "discovered fixtures");
    Ok(cases)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn corpus(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, text) in files {
            fs::write(dir.path().join(name), text).unwrap();
        }
        dir
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let dir = corpus(&[
            ("loops.ts", "while (true) { break; }"),
            ("types.ts", "let a: number = 1;"),
            ("notes.md", "# not a fixture"),
            ("runner.js", "run();"),
        ]);

        let mut names: Vec<String> = scan(dir.path(), "ts").unwrap().into_iter().map(|c| c.file_name).collect();
        names.sort();
        assert_eq!(names, vec!["loops.ts", "types.ts"]);
    }

    #[test]
    fn test_scan_reads_full_text() {
        let source = "/*\n * Loops\n */\nfor (let i = 0; i < 10; i++) {\n\tconsole.log(i);\n}\n";
        let dir = corpus(&[("loops.ts", source)]);

        let cases = scan(dir.path(), "ts").unwrap();
        assert_eq!(cases, vec![TestCase::new("loops.ts", source)]);
    }

    #[test]
    fn test_scan_skips_directories() {
        let dir = corpus(&[("a.ts", "1;")]);
        fs::create_dir(dir.path().join("nested.ts")).unwrap();
        fs::write(dir.path().join("nested.ts").join("b.ts"), "2;").unwrap();

        let cases = scan(dir.path(), "ts").unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].file_name, "a.ts");
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = corpus(&[]);
        assert!(scan(dir.path(), "ts").unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = scan(&missing, "ts").unwrap_err();
        assert!(matches!(err, HarnessError::ListCorpus { .. }));
        assert!(err.to_string().contains("does-not-exist"));
    }

    #[test]
    fn test_scan_non_utf8_fixture_is_fatal() {
        let dir = corpus(&[("ok.ts", "1;")]);
        fs::write(dir.path().join("bad.ts"), [0xffu8, 0xfe, 0x00]).unwrap();

        let err = scan(dir.path(), "ts").unwrap_err();
        assert!(matches!(err, HarnessError::ReadFixture { .. }));
    }
}
