//! Capability-based filesystem helpers for locating the store on disk.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

/// Read a UTF-8 file into memory.
pub(crate) fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path should include a file name"))?;
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read_to_string(file_name)
}

/// Ensure the directory that will hold `path` exists.
pub(crate) fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base, relative) = split_base(parent);
    if relative.as_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?.create_dir_all(&relative)
}

fn split_base(parent: &Utf8Path) -> (&'static Utf8Path, Utf8PathBuf) {
    match parent.strip_prefix("/") {
        Ok(relative) => (Utf8Path::new("/"), relative.to_path_buf()),
        Err(_) => (Utf8Path::new("."), parent.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    fn creates_nested_parent_directories() {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let target = root.join("a/b/markers.db");

        ensure_parent_dir(&target).expect("create parents");

        assert!(root.join("a/b").is_dir());
    }

    #[rstest]
    fn bare_file_name_needs_no_directory() {
        ensure_parent_dir(Utf8Path::new("markers.db")).expect("nothing to create");
    }

    #[rstest]
    fn reads_file_contents() {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
        let path = root.join("store.json");
        std::fs::write(&path, "{}").expect("write file");

        assert_eq!(read_to_string(&path).expect("read file"), "{}");
    }
}
