//! Page image discovery and batching.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::StoreError;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A numbered group of consecutive page images. Numbering starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBatch {
    pub number: u32,
    pub pages: Vec<PathBuf>,
}

/// Page images in `dir`, in page order.
///
/// Page order is the integer formed by all digits of the file name (0 when there are none),
/// ties broken by name. Extensions are matched case-insensitively.
pub fn discover_pages(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::SourceMissing(dir.to_path_buf()));
    }
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            pages.push(path);
        }
    }
    pages.sort_by_cached_key(|p| {
        let name = file_name(p);
        (page_number(&name), name)
    });
    debug!(dir = %dir.display(), pages = pages.len(), "discovered pages");
    Ok(pages)
}

/// Split pages into consecutive batches of `per_batch` (the last may be shorter).
pub fn batches(pages: &[PathBuf], per_batch: usize) -> Vec<PageBatch> {
    pages
        .chunks(per_batch.max(1))
        .zip(1u32..)
        .map(|(chunk, number)| PageBatch {
            number,
            pages: chunk.to_vec(),
        })
        .collect()
}

/// Edition ids under `root`: one per subdirectory, sorted by name.
pub fn discover_editions(root: &Path) -> Result<Vec<String>, StoreError> {
    if !root.is_dir() {
        return Err(StoreError::SourceMissing(root.to_path_buf()));
    }
    let mut editions = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            editions.push(file_name(&path));
        }
    }
    editions.sort();
    Ok(editions)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn page_number(name: &str) -> u64 {
    let digits: String = name.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    fn names(pages: &[PathBuf]) -> Vec<String> {
        pages.iter().map(|p| file_name(p)).collect()
    }

    #[test]
    fn numeric_page_order() {
        let dir = TempDir::new().unwrap();
        for name in ["page10.png", "page2.JPG", "page1.jpeg", "cover.png", "notes.txt"] {
            touch(dir.path(), name);
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let pages = discover_pages(dir.path()).unwrap();
        assert_eq!(
            names(&pages),
            vec!["cover.png", "page1.jpeg", "page2.JPG", "page10.png"]
        );
    }

    #[test]
    fn missing_folder() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            discover_pages(&dir.path().join("con2475")),
            Err(StoreError::SourceMissing(_))
        ));
    }

    #[test]
    fn empty_folder_has_no_pages() {
        let dir = TempDir::new().unwrap();
        assert!(discover_pages(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn batches_of_three() {
        let pages: Vec<PathBuf> = (1..=7).map(|i| PathBuf::from(format!("{i}.png"))).collect();
        let out = batches(&pages, 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].number, 1);
        assert_eq!(out[2].number, 3);
        assert_eq!(out[2].pages, vec![PathBuf::from("7.png")]);
        assert!(batches(&[], 3).is_empty());
    }

    #[test]
    fn editions_are_subdirectories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("con2560")).unwrap();
        std::fs::create_dir(dir.path().join("con2475")).unwrap();
        touch(dir.path(), "readme.txt");
        assert_eq!(
            discover_editions(dir.path()).unwrap(),
            vec!["con2475", "con2560"]
        );
    }
}
