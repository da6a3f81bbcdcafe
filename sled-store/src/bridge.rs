//! The document source-of-truth filesystem ("bridge"), consumed per
//! spec.md §6. The core does not build this — just a `Bridge` trait and a
//! filesystem-backed implementation of it, the way `storage/sled` consumes
//! `ankurah_core::storage::StorageEngine` without implementing the entity
//! source of truth itself.

use crate::error::DbResult;

pub trait Bridge: Send + Sync {
    fn get(&self, path: &str) -> DbResult<String>;
    fn put(&self, path: &str, contents: &str) -> DbResult<()>;
    fn delete(&self, path: &str) -> DbResult<()>;
    /// Enumerate files under `root_path` with the given format extension.
    fn glob(&self, root_path: &str, format_extension: &str) -> DbResult<Vec<String>>;
    /// Variant of `put` used only for generated config records
    /// (spec.md §4.4 `indexContent`). A no-op bridge may choose not to
    /// persist these; see `supports_building`.
    fn put_config(&self, path: &str, contents: &str) -> DbResult<()>;
    /// Whether `put_config` does anything for this bridge.
    fn supports_building(&self) -> bool;
}

/// Filesystem-backed bridge rooted at a base directory.
pub struct FsBridge {
    root: std::path::PathBuf,
}

impl FsBridge {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self { Self { root: root.into() } }

    fn resolve(&self, path: &str) -> std::path::PathBuf { self.root.join(path) }
}

impl Bridge for FsBridge {
    fn get(&self, path: &str) -> DbResult<String> { Ok(std::fs::read_to_string(self.resolve(path))?) }

    fn put(&self, path: &str, contents: &str) -> DbResult<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(std::fs::write(full, contents)?)
    }

    fn delete(&self, path: &str) -> DbResult<()> {
        let full = self.resolve(path);
        match std::fs::remove_file(full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn glob(&self, root_path: &str, format_extension: &str) -> DbResult<Vec<String>> {
        let dir = self.resolve(root_path);
        if !dir.exists() {
            return Ok(vec![]);
        }
        let mut out = Vec::new();
        collect_paths(&dir, &self.root, format_extension, &mut out)?;
        out.sort();
        Ok(out)
    }

    fn put_config(&self, path: &str, contents: &str) -> DbResult<()> { self.put(path, contents) }

    fn supports_building(&self) -> bool { true }
}

fn collect_paths(dir: &std::path::Path, root: &std::path::Path, ext: &str, out: &mut Vec<String>) -> DbResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_paths(&path, root, ext, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            let rel = path.strip_prefix(root).unwrap_or(&path);
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_bridge_roundtrips_and_globs() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = FsBridge::new(dir.path());
        bridge.put("posts/a.md", "hello").unwrap();
        bridge.put("posts/b.md", "world").unwrap();
        bridge.put("posts/ignored.json", "{}").unwrap();

        assert_eq!(bridge.get("posts/a.md").unwrap(), "hello");

        let mut found = bridge.glob("posts", "md").unwrap();
        found.sort();
        assert_eq!(found, vec!["posts/a.md".to_string(), "posts/b.md".to_string()]);

        bridge.delete("posts/a.md").unwrap();
        assert!(bridge.get("posts/a.md").is_err());
    }
}
