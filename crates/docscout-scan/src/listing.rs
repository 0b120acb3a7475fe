//! Non-recursive directory listing.

use std::path::Path;

use tracing::warn;

use docscout_core::{DirEntryInfo, DiscoverError};

/// List the immediate children of `path`, sorted by name.
///
/// Entries that cannot be inspected are skipped.
pub(crate) fn read_listing(path: &Path) -> Result<Vec<DirEntryInfo>, DiscoverError> {
    let metadata = std::fs::metadata(path).map_err(|e| DiscoverError::root_io(path, e))?;
    if !metadata.is_dir() {
        return Err(DiscoverError::not_a_directory(path));
    }

    let read_dir = std::fs::read_dir(path).map_err(|e| DiscoverError::root_io(path, e))?;

    let mut items = Vec::new();
    for entry_result in read_dir {
        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable directory entry");
                continue;
            }
        };
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "skipping entry without file type");
                continue;
            }
        };
        items.push(DirEntryInfo::new(
            entry.file_name().to_string_lossy(),
            file_type.is_dir(),
        ));
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_listing_sorted_with_kinds() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("notes")).unwrap();
        fs::write(temp.path().join("b.md"), "b").unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        let items = read_listing(temp.path()).unwrap();
        assert_eq!(
            items,
            vec![
                DirEntryInfo::new("a.txt", false),
                DirEntryInfo::new("b.md", false),
                DirEntryInfo::new("notes", true),
            ]
        );
    }

    #[test]
    fn test_listing_rejects_file_and_missing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.md");
        fs::write(&file, "x").unwrap();

        assert!(read_listing(&file).unwrap_err().is_invalid_root());
        assert!(read_listing(&temp.path().join("missing")).unwrap_err().is_invalid_root());
    }
}
