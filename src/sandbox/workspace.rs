use std::path::{Component, Path, PathBuf};

use crate::error::ToolError;

/// Confines path-based tool operations to the sandbox root.
pub struct WorkspaceGuard {
    /// Canonical (absolute, symlinks resolved) sandbox root.
    canonical_root: PathBuf,
}

impl WorkspaceGuard {
    /// Create a new guard for the given workspace path.
    /// Creates the directory if it doesn't exist and resolves to canonical path.
    pub fn new(workspace_path: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(workspace_path)?;
        let canonical_root = std::fs::canonicalize(workspace_path)?;
        Ok(Self { canonical_root })
    }

    /// Resolve a model-supplied path against the sandbox root.
    ///
    /// Symlinks are resolved on the longest prefix that exists; components
    /// past it (a file about to be created, say) are normalised lexically.
    /// Fails with [`ToolError::PathEscape`] unless the result is the root or
    /// one of its descendants.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, ToolError> {
        let escape = || ToolError::PathEscape {
            path: requested.to_string(),
        };

        let joined = self.canonical_root.join(requested);
        let components: Vec<Component<'_>> = joined.components().collect();

        // Longest prefix that canonicalizes. The filesystem root always does.
        let mut split = components.len();
        let base = loop {
            let prefix: PathBuf = components[..split].iter().collect();
            match std::fs::canonicalize(&prefix) {
                Ok(base) => break base,
                Err(_) if split > 1 => {
                    // A dangling symlink would let a later write land wherever
                    // it points, so it never resolves.
                    if std::fs::symlink_metadata(&prefix)
                        .map(|m| m.file_type().is_symlink())
                        .unwrap_or(false)
                    {
                        return Err(escape());
                    }
                    split -= 1;
                }
                Err(_) => return Err(escape()),
            }
        };

        let mut resolved = base;
        for component in &components[split..] {
            match component {
                Component::Normal(name) => resolved.push(name),
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        if resolved.starts_with(&self.canonical_root) {
            Ok(resolved)
        } else {
            tracing::debug!(requested, resolved = %resolved.display(), "Path escapes sandbox root");
            Err(escape())
        }
    }

    /// Get the canonical workspace root path.
    pub fn canonical_root(&self) -> &Path {
        &self.canonical_root
    }
}
