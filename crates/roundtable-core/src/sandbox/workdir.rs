//! Working-directory boundary for code execution.

use std::path::{Component, Path, PathBuf};

use super::error::{SandboxError, SandboxResult};

/// A directory that code execution may write into, and nothing outside it.
///
/// The root is canonicalized on open. Every relative path handed to
/// [`WorkDir::resolve`] is normalized lexically and then checked against the
/// root through its deepest existing ancestor, so `..` segments, absolute
/// paths and symlinks that point outside the root are all rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Open (creating if needed) a working directory.
    pub fn open(path: impl AsRef<Path>) -> SandboxResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let root = path.canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` to an absolute path inside the root.
    ///
    /// Fails closed: anything that is not a plain descending path is an error.
    pub fn resolve(&self, relative: &str) -> SandboxResult<PathBuf> {
        let trimmed = relative.trim();
        if trimmed.is_empty() {
            return Err(SandboxError::InvalidPath("empty path".into()));
        }

        let mut normalized = PathBuf::new();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(self.escape(trimmed));
                }
            }
        }
        if normalized.as_os_str().is_empty() {
            return Err(SandboxError::InvalidPath(trimmed.to_string()));
        }

        let candidate = self.root.join(&normalized);

        // Symlinks: the deepest existing ancestor must still live under root.
        let mut probe = Some(candidate.as_path());
        while let Some(p) = probe {
            if p.symlink_metadata().is_ok() {
                let canonical = p.canonicalize().map_err(|_| self.escape(trimmed))?;
                if !canonical.starts_with(&self.root) {
                    return Err(self.escape(trimmed));
                }
                break;
            }
            probe = p.parent();
        }

        Ok(candidate)
    }

    /// Write `contents` to `relative` inside the root, creating parent dirs.
    pub async fn write_file(&self, relative: &str, contents: &str) -> SandboxResult<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }

    fn escape(&self, path: &str) -> SandboxError {
        SandboxError::PathEscape {
            path: path.to_string(),
            root: self.root.display().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workdir() -> (tempfile::TempDir, WorkDir) {
        let tmp = tempfile::tempdir().unwrap();
        let wd = WorkDir::open(tmp.path().join("job_files")).unwrap();
        (tmp, wd)
    }

    #[test]
    fn test_open_creates_directory() {
        let (tmp, wd) = workdir();
        assert!(wd.root().is_dir());
        assert!(wd.root().ends_with("job_files"));
        drop(tmp);
    }

    #[test]
    fn test_resolve_plain_and_nested_paths() {
        let (_tmp, wd) = workdir();
        let p = wd.resolve("app.py").unwrap();
        assert_eq!(p, wd.root().join("app.py"));
        let p = wd.resolve("./src/main.py").unwrap();
        assert_eq!(p, wd.root().join("src").join("main.py"));
    }

    #[test]
    fn test_resolve_rejects_parent_dir() {
        let (_tmp, wd) = workdir();
        let err = wd.resolve("../escape.py").unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape { .. }));
        let err = wd.resolve("src/../../escape.py").unwrap_err();
        assert!(err.is_boundary_violation());
    }

    #[test]
    fn test_resolve_rejects_absolute() {
        let (_tmp, wd) = workdir();
        let err = wd.resolve("/etc/passwd").unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape { .. }));
    }

    #[test]
    fn test_resolve_rejects_empty() {
        let (_tmp, wd) = workdir();
        assert!(matches!(
            wd.resolve("  ").unwrap_err(),
            SandboxError::InvalidPath(_)
        ));
        assert!(matches!(
            wd.resolve(".").unwrap_err(),
            SandboxError::InvalidPath(_)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_symlink_escape() {
        let (tmp, wd) = workdir();
        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, wd.root().join("link")).unwrap();

        let err = wd.resolve("link/payload.sh").unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape { .. }));
    }

    #[tokio::test]
    async fn test_write_file_stays_inside_root() {
        let (_tmp, wd) = workdir();
        let path = wd.write_file("nested/out.txt", "hello").await.unwrap();
        assert!(path.starts_with(wd.root()));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
