//! Save-as for downloaded papers.
//!
//! The bytes go to a hidden `.part` staging file first and are then linked
//! under the original filename, or `name (1).pdf`, `name (2).pdf`, ... when
//! that is taken. Existing files are never replaced. The staging file is
//! owned by [`StagingFile`], which removes it on drop.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use qparchive_common::protocol::Id;

/// Temporary file removed when the guard goes out of scope.
struct StagingFile {
    path: PathBuf,
}

impl StagingFile {
    fn create(path: PathBuf, bytes: &[u8]) -> std::io::Result<Self> {
        std::fs::write(&path, bytes)?;
        Ok(Self { path })
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.path.exists() {
            std::fs::remove_file(&self.path).ok();
            debug!("Released staging file {}", self.path.display());
        }
    }
}

/// Numbered copies tried before giving up.
const MAX_COPIES: usize = 1000;

/// Write `bytes` into `dir` under the server-supplied `original_name`.
///
/// Returns the final path.
pub fn save_as(dir: &Path, original_name: &str, paper_id: Id, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let name = sanitize_file_name(original_name)
        .unwrap_or_else(|| format!("paper-{paper_id}.pdf"));

    let staging = StagingFile::create(dir.join(format!(".{name}.part")), bytes)?;
    let target = link_free_name(&staging.path, dir, &name)?;
    drop(staging);

    info!("Saved {} ({} bytes)", target.display(), bytes.len());
    Ok(target)
}

/// Link `staging` under the first free candidate name. A hard link fails
/// instead of replacing an existing entry.
fn link_free_name(staging: &Path, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    for candidate in candidate_names(name).take(MAX_COPIES) {
        let target = dir.join(&candidate);
        match std::fs::hard_link(staging, &target) {
            Ok(()) => return Ok(target),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("{} exists, trying next name", target.display());
            }
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free file name for {name} in {}", dir.display()),
    ))
}

/// `name`, then `stem (1).ext`, `stem (2).ext`, ...
fn candidate_names(name: &str) -> impl Iterator<Item = String> + '_ {
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    std::iter::once(name.to_string()).chain((1..).map(move |n| match ext {
        Some(ext) => format!("{stem} ({n}).{ext}"),
        None => format!("{stem} ({n})"),
    }))
}

/// Keep only the final path component and drop traversal attempts.
fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.replace("..", "_"))
}

// ─── tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("qparchive_download_test")
            .join(format!("{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("DBMS 2023.pdf").as_deref(), Some("DBMS 2023.pdf"));
        assert_eq!(sanitize_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_file_name("C:\\tmp\\os.pdf").as_deref(), Some("os.pdf"));
        assert_eq!(sanitize_file_name("a..b.pdf").as_deref(), Some("a_b.pdf"));
        assert_eq!(sanitize_file_name("dir/"), None);
        assert_eq!(sanitize_file_name(".."), None);
    }

    #[test]
    fn test_save_as_writes_and_releases_staging() {
        let dir = temp_dir("save");
        let path = save_as(&dir, "maths.pdf", 3, b"%PDF-1.4").unwrap();
        assert_eq!(path, dir.join("maths.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
        assert!(!dir.join(".maths.pdf.part").exists());
    }

    #[test]
    fn test_save_as_falls_back_to_id() {
        let dir = temp_dir("fallback");
        let path = save_as(&dir, "", 42, b"x").unwrap();
        assert_eq!(path.file_name().unwrap(), "paper-42.pdf");
    }

    #[test]
    fn test_same_name_twice_keeps_both() {
        let dir = temp_dir("twice");
        let first = save_as(&dir, "endsem.pdf", 1, b"first").unwrap();
        let second = save_as(&dir, "endsem.pdf", 2, b"second").unwrap();

        assert_eq!(first, dir.join("endsem.pdf"));
        assert_eq!(second, dir.join("endsem (1).pdf"));
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
        assert!(!dir.join(".endsem.pdf.part").exists());
    }

    #[test]
    fn test_occupied_by_directory_saves_beside_it() {
        let dir = temp_dir("busy");
        std::fs::create_dir_all(dir.join("busy.pdf/inner")).unwrap();
        let path = save_as(&dir, "busy.pdf", 1, b"x").unwrap();
        assert_eq!(path, dir.join("busy (1).pdf"));
        assert!(dir.join("busy.pdf/inner").is_dir());
        assert!(!dir.join(".busy.pdf.part").exists());
    }

    #[test]
    fn test_candidate_names() {
        let names: Vec<_> = candidate_names("notes").take(3).collect();
        assert_eq!(names, ["notes", "notes (1)", "notes (2)"]);
        let names: Vec<_> = candidate_names("os.v2.pdf").take(2).collect();
        assert_eq!(names, ["os.v2.pdf", "os.v2 (1).pdf"]);
        let names: Vec<_> = candidate_names(".pdf").take(2).collect();
        assert_eq!(names, [".pdf", ".pdf (1)"]);
    }
}
