//! `resolve({category, subcategory?, relativePath?, user}) -> {ok, path} | {error}`
//! (spec §4.B). The only function in this crate that knows how to build
//! a path string; every other crate asks the router and never
//! concatenates a path itself.

use std::path::{Component, Path, PathBuf};

use mh_core::AppRoot;

use crate::category::Category;
use crate::error::{RouterError, RouterResult};

const FORBIDDEN_ABSOLUTE_ROOTS: &[&str] = &[
    "/etc", "/var", "/usr", "/bin", "/sbin", "/root", "/proc", "/sys", "/dev", "/boot", "/lib",
    "/lib64",
];

const FORBIDDEN_FRAGMENTS: &[&str] = &["brain", "packages", "apps", "bin", "node_modules"];

/// One resolution request.
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    /// Top-level subtree.
    pub category: Category,
    /// Optional further subdirectory under the category subtree.
    pub subcategory: Option<&'a str>,
    /// Optional path relative to the resolved subtree, supplied by the
    /// caller (e.g. a filename within `memory/`).
    pub relative_path: Option<&'a str>,
    /// The acting user's username, used for the default profile root.
    pub username: &'a str,
    /// `user.metadata.profilePath`, if the user has one configured.
    pub profile_path_override: Option<&'a Path>,
    /// Whether the caller is internal code (not a request handler acting
    /// on behalf of an external user). Only internal callers may resolve
    /// `category = system`.
    pub internal: bool,
}

/// A successfully resolved absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The resolved path. Guaranteed to sit under the profile root (or,
    /// for `category = system`, under the installation root) and to have
    /// passed every rule in spec §4.B.2.
    pub path: PathBuf,
    /// True if `profile_path_override` was supplied but failed
    /// validation, so the default profile path was used instead. The
    /// caller must emit a `profile_path_fallback` audit event when this
    /// is set (spec §4.B step 1).
    pub fallback_used: bool,
}

/// Resolve a logical path request to an absolute filesystem path.
///
/// # Errors
/// Returns [`RouterError`] for every rejection spec §4.B names: absolute
/// or traversing `relativePath`, paths that escape the profile root,
/// forbidden fragments/roots, and `system`-category requests from
/// non-internal callers.
pub fn resolve(app_root: &AppRoot, req: &ResolveRequest<'_>) -> RouterResult<Resolved> {
    if req.category == Category::System {
        if !req.internal {
            return Err(RouterError::SystemCategoryForbidden);
        }
        let base = match req.subcategory {
            Some("logs") => app_root.system_logs_dir(),
            Some("agents") => app_root.system_agents_dir(),
            Some("brain") => app_root.system_brain_dir(),
            Some("etc") | None => app_root.system_etc_dir(),
            Some(other) => {
                return Err(RouterError::ProfilePathInvalid(format!(
                    "unknown system subcategory: {other}"
                )))
            }
        };
        let path = join_relative_checked(app_root.root(), &base, req.relative_path)?;
        return Ok(Resolved {
            path,
            fallback_used: false,
        });
    }

    let (profile_root, fallback_used) = determine_profile_root(app_root, req);

    let mut base = profile_root.join(req.category.profile_subtree());
    if let Some(sub) = req.subcategory {
        base = base.join(sub);
    }
    let path = join_relative_checked(&profile_root, &base, req.relative_path)?;
    Ok(Resolved {
        path,
        fallback_used,
    })
}

/// Resolve just the profile root itself (no category subtree), for
/// callers that need the bare root rather than a resolved file path —
/// namely `mh-pipeline`'s `UserContext` construction (spec §4.D step 2),
/// which needs a root to populate `UserContext::profile_root` before any
/// handler has named a category. Applies the same fallback rule as
/// [`resolve`] (spec §4.B step 1) and returns whether the fallback fired
/// so the caller can emit the `profile_path_fallback` audit event.
#[must_use]
pub fn resolve_profile_root(
    app_root: &AppRoot,
    username: &str,
    profile_path_override: Option<&Path>,
) -> (PathBuf, bool) {
    determine_profile_root(
        app_root,
        &ResolveRequest {
            category: Category::Memory,
            subcategory: None,
            relative_path: None,
            username,
            profile_path_override,
            internal: false,
        },
    )
}

/// Pick the profile root, falling back to the default path if an
/// override was configured but doesn't validate (spec §4.B step 1).
fn determine_profile_root(app_root: &AppRoot, req: &ResolveRequest<'_>) -> (PathBuf, bool) {
    if let Some(override_path) = req.profile_path_override {
        if validate_profile_path(override_path).is_ok() {
            return (override_path.to_path_buf(), false);
        }
        return (app_root.default_profile_dir(req.username), true);
    }
    (app_root.default_profile_dir(req.username), false)
}

/// Validate a user-supplied profile root (spec §4.B.2): absolute, not
/// under a forbidden system prefix, exists, is a directory, and is
/// owner-writable. World/group-writable permissions are a warning, not
/// a rejection.
fn validate_profile_path(path: &Path) -> RouterResult<()> {
    if !path.is_absolute() {
        return Err(RouterError::ProfilePathInvalid(
            "profile path must be absolute".to_string(),
        ));
    }
    let path_str = path.to_string_lossy();
    for forbidden in FORBIDDEN_ABSOLUTE_ROOTS {
        if path_str.as_ref() == *forbidden || path_str.starts_with(&format!("{forbidden}/")) {
            return Err(RouterError::ReservedRoot);
        }
    }
    let meta = std::fs::metadata(path)
        .map_err(|e| RouterError::ProfilePathInvalid(format!("cannot stat path: {e}")))?;
    if !meta.is_dir() {
        return Err(RouterError::ProfilePathInvalid(
            "profile path is not a directory".to_string(),
        ));
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = meta.permissions().mode();
        if mode & 0o200 == 0 {
            return Err(RouterError::ProfilePathInvalid(
                "profile path is not owner-writable".to_string(),
            ));
        }
        if mode & 0o022 != 0 {
            tracing::warn!(path = %path.display(), "profile path is world- or group-writable");
        }
    }
    Ok(())
}

/// Normalize and validate a caller-supplied relative path, then join it
/// onto `base` and check the result still sits under `root` (spec
/// §4.B.2: no absolute path, no `..`, no forbidden fragment, no escape
/// after resolution).
fn join_relative_checked(root: &Path, base: &Path, relative: Option<&str>) -> RouterResult<PathBuf> {
    let candidate = match relative {
        None => base.to_path_buf(),
        Some(rel) => base.join(normalize_relative(rel)?),
    };
    ensure_within_root(root, &candidate)?;
    Ok(candidate)
}

/// Reject absolute paths and `..` components; collapse `.`; reject any
/// component matching a forbidden fragment anywhere in the path.
fn normalize_relative(rel: &str) -> RouterResult<PathBuf> {
    let path = Path::new(rel);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => return Err(RouterError::PathTraversal),
            Component::RootDir | Component::Prefix(_) => return Err(RouterError::AbsolutePath),
        }
    }
    if out
        .components()
        .any(|c| FORBIDDEN_FRAGMENTS.iter().any(|frag| c.as_os_str() == *frag))
    {
        return Err(RouterError::ReservedFragment);
    }
    Ok(out)
}

/// Confirm `candidate` sits under `root` after resolving symlinks on
/// whichever prefix of `candidate` already exists. `candidate` itself
/// may not exist yet (the caller may be about to create it); we walk up
/// to the deepest existing ancestor, canonicalize that, and require it
/// sit under the canonical root.
fn ensure_within_root(root: &Path, candidate: &Path) -> RouterResult<()> {
    let root_canon = root
        .canonicalize()
        .map_err(|_| RouterError::OutsideProfileRoot)?;

    let mut existing = candidate.to_path_buf();
    while !existing.exists() {
        if !existing.pop() {
            break;
        }
    }
    let existing_canon = if existing.as_os_str().is_empty() {
        root_canon.clone()
    } else {
        existing
            .canonicalize()
            .map_err(|_| RouterError::OutsideProfileRoot)?
    };

    if existing_canon.starts_with(&root_canon) {
        Ok(())
    } else {
        Err(RouterError::OutsideProfileRoot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, AppRoot) {
        let dir = tempfile::tempdir().unwrap();
        let app_root = AppRoot::at(dir.path());
        app_root.ensure().unwrap();
        std::fs::create_dir_all(app_root.default_profile_dir("alice")).unwrap();
        (dir, app_root)
    }

    #[test]
    fn resolves_default_profile_subtree() {
        let (_dir, app_root) = setup();
        let req = ResolveRequest {
            category: Category::Memory,
            subcategory: None,
            relative_path: Some("conversations/2026-07-26.json"),
            username: "alice",
            profile_path_override: None,
            internal: false,
        };
        let resolved = resolve(&app_root, &req).unwrap();
        assert_eq!(
            resolved.path,
            app_root
                .default_profile_dir("alice")
                .join("memory/conversations/2026-07-26.json")
        );
        assert!(!resolved.fallback_used);
    }

    #[test]
    fn rejects_absolute_relative_path() {
        let (_dir, app_root) = setup();
        let req = ResolveRequest {
            category: Category::Output,
            subcategory: None,
            relative_path: Some("/etc/passwd"),
            username: "alice",
            profile_path_override: None,
            internal: false,
        };
        assert_eq!(resolve(&app_root, &req), Err(RouterError::AbsolutePath));
    }

    #[test]
    fn rejects_parent_traversal() {
        let (_dir, app_root) = setup();
        let req = ResolveRequest {
            category: Category::Output,
            subcategory: None,
            relative_path: Some("../../etc/passwd"),
            username: "alice",
            profile_path_override: None,
            internal: false,
        };
        assert_eq!(resolve(&app_root, &req), Err(RouterError::PathTraversal));
    }

    #[test]
    fn rejects_forbidden_fragment() {
        let (_dir, app_root) = setup();
        let req = ResolveRequest {
            category: Category::Output,
            subcategory: None,
            relative_path: Some("brain/weights.bin"),
            username: "alice",
            profile_path_override: None,
            internal: false,
        };
        assert_eq!(resolve(&app_root, &req), Err(RouterError::ReservedFragment));
    }

    #[test]
    fn rejects_symlink_escape() {
        let (dir, app_root) = setup();
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        #[cfg(unix)]
        {
            let link = app_root.default_profile_dir("alice").join("output");
            std::fs::create_dir_all(app_root.default_profile_dir("alice")).unwrap();
            std::os::unix::fs::symlink(&outside, &link).unwrap();

            let req = ResolveRequest {
                category: Category::Output,
                subcategory: None,
                relative_path: Some("escaped.txt"),
                username: "alice",
                profile_path_override: None,
                internal: false,
            };
            assert_eq!(resolve(&app_root, &req), Err(RouterError::OutsideProfileRoot));
        }
    }

    #[test]
    fn system_category_forbidden_for_non_internal_callers() {
        let (_dir, app_root) = setup();
        let req = ResolveRequest {
            category: Category::System,
            subcategory: Some("etc"),
            relative_path: None,
            username: "alice",
            profile_path_override: None,
            internal: false,
        };
        assert_eq!(
            resolve(&app_root, &req),
            Err(RouterError::SystemCategoryForbidden)
        );
    }

    #[test]
    fn system_category_allowed_for_internal_callers() {
        let (_dir, app_root) = setup();
        let req = ResolveRequest {
            category: Category::System,
            subcategory: Some("agents"),
            relative_path: Some("registry.json"),
            username: "alice",
            profile_path_override: None,
            internal: true,
        };
        let resolved = resolve(&app_root, &req).unwrap();
        assert_eq!(resolved.path, app_root.agent_registry_path());
    }

    #[test]
    fn invalid_profile_override_falls_back_to_default() {
        let (dir, app_root) = setup();
        let nonexistent = dir.path().join("does-not-exist");
        let req = ResolveRequest {
            category: Category::Memory,
            subcategory: None,
            relative_path: None,
            username: "alice",
            profile_path_override: Some(&nonexistent),
            internal: false,
        };
        let resolved = resolve(&app_root, &req).unwrap();
        assert!(resolved.fallback_used);
        assert_eq!(
            resolved.path,
            app_root.default_profile_dir("alice").join("memory")
        );
    }

    #[test]
    fn valid_profile_override_is_used_without_fallback() {
        let (dir, app_root) = setup();
        let custom = dir.path().join("custom-profile");
        std::fs::create_dir_all(&custom).unwrap();
        let req = ResolveRequest {
            category: Category::Memory,
            subcategory: None,
            relative_path: None,
            username: "alice",
            profile_path_override: Some(&custom),
            internal: false,
        };
        let resolved = resolve(&app_root, &req).unwrap();
        assert!(!resolved.fallback_used);
        assert_eq!(resolved.path, custom.join("memory"));
    }

    #[test]
    fn resolve_profile_root_falls_back_like_resolve_does() {
        let (dir, app_root) = setup();
        let nonexistent = dir.path().join("does-not-exist");
        let (path, fallback_used) = resolve_profile_root(&app_root, "alice", Some(&nonexistent));
        assert!(fallback_used);
        assert_eq!(path, app_root.default_profile_dir("alice"));
    }

    #[test]
    fn reserved_absolute_root_override_is_rejected_at_validation() {
        let result = validate_profile_path(Path::new("/etc/metahost"));
        assert_eq!(result, Err(RouterError::ReservedRoot));
    }
}
