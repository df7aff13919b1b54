use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions picked up in directory mode
pub const CONVERTIBLE_EXTENSIONS: &[&str] = &["json", "geojson", "csv", "xml", "txt"];

/// Return true if the path is an existing file with a convertible extension
pub fn is_convertible_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                CONVERTIBLE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
}

/// Find convertible files in a directory. If recursive is true, use walkdir; otherwise list files.
pub fn find_convertible_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut files = Vec::new();

    if recursive {
        for entry in WalkDir::new(dir) {
            let entry = entry?;
            let path = entry.path();
            if is_convertible_file(path) {
                files.push(path.to_path_buf());
            }
        }
    } else {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if is_convertible_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
