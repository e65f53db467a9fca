/*!
 * Tests for file and directory utilities
 */

use anyhow::Result;
use std::fs;
use std::path::Path;

use bucho::file_utils::{FileManager, FileType};

use crate::common;

#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file_path = common::create_test_file(temp_dir.path(), "request.txt", "決裁書")?;

    assert!(FileManager::file_exists(&file_path));
    assert!(!FileManager::file_exists(temp_dir.path().join("missing.txt")));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

#[test]
fn test_dir_exists_withDirectoryAndFile_shouldOnlyAcceptDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file_path = common::create_test_file(temp_dir.path(), "request.txt", "決裁書")?;

    assert!(FileManager::dir_exists(temp_dir.path()));
    assert!(!FileManager::dir_exists(&file_path));
    Ok(())
}

#[test]
fn test_ensure_dir_withNestedPath_shouldCreateAllParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b").join("c");

    FileManager::ensure_dir(&nested)?;
    assert!(nested.is_dir());

    // Second call on an existing directory is a no-op
    FileManager::ensure_dir(&nested)?;
    Ok(())
}

#[test]
fn test_generate_output_path_withPdf_shouldPrefixReviewAndUseMarkdown() {
    let output = FileManager::generate_output_path("/docs/request_2024.pdf", "/out");
    assert_eq!(output, Path::new("/out").join("review_request_2024.md"));
}

#[test]
fn test_generate_output_path_withJapaneseName_shouldKeepStem() {
    let output = FileManager::generate_output_path("稟議書.pdf", "reviews");
    assert_eq!(output, Path::new("reviews").join("review_稟議書.md"));
}

#[test]
fn test_find_files_withMixedExtensions_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "b.pdf", "%PDF-1.4")?;
    common::create_test_file(temp_dir.path(), "a.PDF", "%PDF-1.4")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "text")?;

    let files = FileManager::find_files(temp_dir.path(), ".pdf")?;
    let names: Vec<String> = files
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();

    assert_eq!(names, vec!["a.PDF".to_string(), "b.pdf".to_string()]);
    Ok(())
}

#[test]
fn test_find_documents_withFakePdf_shouldSkipIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let real = common::create_test_file(temp_dir.path(), "real.pdf", "%PDF-1.7\n")?;
    common::create_test_file(temp_dir.path(), "fake.pdf", "not a pdf")?;

    let documents = FileManager::find_documents(temp_dir.path())?;
    assert_eq!(documents, vec![real]);
    Ok(())
}

#[test]
fn test_find_documents_withSubdirectories_shouldRecurse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sub = temp_dir.path().join("2024");
    fs::create_dir(&sub)?;
    common::create_test_file(&sub, "inner.pdf", "%PDF-1.4")?;

    let documents = FileManager::find_documents(temp_dir.path())?;
    assert_eq!(documents.len(), 1);
    assert!(documents[0].ends_with("2024/inner.pdf"));
    Ok(())
}

#[test]
fn test_write_to_file_withMissingParent_shouldCreateItAndRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("review_x.md");

    FileManager::write_to_file(&path, "承認できます。")?;
    assert_eq!(FileManager::read_to_string(&path)?, "承認できます。");
    Ok(())
}

#[test]
fn test_read_to_string_withMissingFile_shouldFail() {
    assert!(FileManager::read_to_string("/definitely/not/here.txt").is_err());
}

#[test]
fn test_detect_file_type_withVariousFiles_shouldClassifyByContentThenExtension() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let pdf = common::create_test_file(temp_dir.path(), "doc.bin", "%PDF-1.4 rest")?;
    let txt = common::create_test_file(temp_dir.path(), "doc.txt", "plain")?;
    let md = common::create_test_file(temp_dir.path(), "doc.MD", "# title")?;
    let other = common::create_test_file(temp_dir.path(), "doc.docx", "zip")?;
    let short = common::create_test_file(temp_dir.path(), "tiny.txt", "%P")?;

    assert_eq!(FileManager::detect_file_type(&pdf)?, FileType::Pdf);
    assert_eq!(FileManager::detect_file_type(&txt)?, FileType::Text);
    assert_eq!(FileManager::detect_file_type(&md)?, FileType::Text);
    assert_eq!(FileManager::detect_file_type(&other)?, FileType::Unknown);
    assert_eq!(FileManager::detect_file_type(&short)?, FileType::Text);
    Ok(())
}

#[test]
fn test_detect_file_type_withMissingFile_shouldFail() {
    assert!(FileManager::detect_file_type("/no/such/file.pdf").is_err());
}
