//! Provenance filtering.
//!
//! The AST pulls in standard-library and toolchain-internal
//! declarations transitively through headers. Only user-authored
//! members are meaningful binding targets, so members whose source
//! file lies under the toolchain root are dropped. Containment is
//! decided component-wise on resolved paths, never by string prefix.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::domain::catalog::MemberCatalog;

/// Resolve a path for containment comparison. Symlinks are followed
/// when the path exists; otherwise the path is normalized lexically
/// (a nonexistent path cannot involve a symlink).
pub fn canonicalized(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| normalize_lexically(path))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True when `file` lies inside the directory tree rooted at `root`.
/// `/foo` never matches `/foobar`, and the root itself is not inside
/// its own subtree.
pub fn is_within(root: &Path, file: &Path) -> bool {
    let root = canonicalized(root);
    let file = canonicalized(file);
    file.starts_with(&root) && file != root
}

/// Subset of the member catalog whose source files are outside the
/// toolchain root, in the original order.
pub fn filter_members(members: &MemberCatalog, toolchain_root: &Path) -> MemberCatalog {
    let root = canonicalized(toolchain_root);
    members.retain_entries(|_, attr| {
        let file = canonicalized(&attr.location.file);
        !(file.starts_with(&root) && file != root)
    })
}
