//! Filesystem side of an export bundle: target checks, atomic writes, file
//! tree copies and the README.

use crate::ExportError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use sysdesc_schema::{Description, Scope};
use tempfile::NamedTempFile;

/// Paths never restored by an installation profile. Accounts, repositories
/// and machine identity are set up by the installer itself.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "/etc/passwd",
    "/etc/shadow",
    "/etc/group",
    "/etc/gshadow",
    "/etc/zypp/repos.d",
    "/etc/zypp/services.d",
    "/etc/fstab",
    "/etc/resolv.conf",
    "/etc/hostname",
    "/etc/machine-id",
    "/etc/udev/rules.d/70-persistent-net.rules",
    "/boot",
    "/var/lib/rpm",
    "/var/cache",
    "/var/log",
    "/var/run",
    "/tmp",
    "/var/tmp",
];

/// Files copied into a bundle.
#[derive(Debug, Default)]
pub struct CopyStats {
    pub copied: usize,
    pub skipped: Vec<String>,
}

/// Create `target` if needed and check that files can be created in it.
pub fn ensure_writable(target: &Path) -> Result<(), ExportError> {
    let unwritable = |source: io::Error| ExportError::TargetUnwritable {
        path: target.to_path_buf(),
        source,
    };
    fs::create_dir_all(target).map_err(unwritable)?;
    NamedTempFile::new_in(target).map_err(unwritable)?;
    Ok(())
}

/// True when `path` is one of `excludes` or lies below one of them.
pub fn is_excluded(path: &str, excludes: &[String]) -> bool {
    let path = path.trim_end_matches('/');
    excludes.iter().any(|e| {
        path == e
            || path
                .strip_prefix(e.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Write `content` to `path` through a temporary file in the same directory.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Copy the tree `src` into `dst`. Entries are addressed by their absolute
/// path on the inspected system (`/` + path relative to the tree root) when
/// matching `excludes`.
pub fn copy_tree(
    src: &Path,
    dst: &Path,
    excludes: &[String],
    stats: &mut CopyStats,
) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    copy_entries(src, dst, "", excludes, stats)
}

fn copy_entries(
    src: &Path,
    dst: &Path,
    prefix: &str,
    excludes: &[String],
    stats: &mut CopyStats,
) -> io::Result<()> {
    let mut entries = fs::read_dir(src)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let file_name = entry.file_name();
        let system_path = format!("{prefix}/{}", file_name.to_string_lossy());
        if is_excluded(&system_path, excludes) {
            tracing::debug!("not copying excluded path {system_path}");
            stats.skipped.push(system_path);
            continue;
        }

        let src_path = entry.path();
        let dst_path = dst.join(&file_name);
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
            stats.copied += 1;
        } else if file_type.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_entries(&src_path, &dst_path, &system_path, excludes, stats)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
            stats.copied += 1;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let link = fs::read_link(src)?;
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(link, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

/// Source tree of an extracted scope, if it exists on disk.
pub fn extracted_tree(description: &Description, scope: &Scope) -> Option<PathBuf> {
    let dir = description.scope_files_dir(scope.kind())?;
    if dir.is_dir() {
        Some(dir)
    } else {
        tracing::warn!(
            "scope '{}' is marked as extracted but {} does not exist",
            scope.kind(),
            dir.display()
        );
        None
    }
}

/// Human-readable instructions shipped with the bundle.
pub fn readme(description: &Description, extracted: &[&Scope]) -> String {
    let mut out = format!(
        "# AutoYaST export of '{}'\n\n\
         This directory contains an AutoYaST profile (`autoinst.xml`) that\n\
         reinstalls the system described by `manifest.json`.\n\n",
        description.name()
    );

    out.push_str("## Scopes\n\n");
    for kind in description.kinds() {
        match description.meta(kind) {
            Some(meta) => out.push_str(&format!(
                "- {kind} (inspected on {} at {})\n",
                meta.hostname,
                meta.modified.format("%Y-%m-%d %H:%M:%S")
            )),
            None => out.push_str(&format!("- {kind}\n")),
        }
    }
    if description.kinds().next().is_none() {
        out.push_str("The description contains no scopes.\n");
    }

    out.push_str("\n## Installation\n\n");
    if extracted.is_empty() {
        out.push_str(
            "No file contents were extracted, so the profile can be used on\n\
             its own:\n\n\
             \x20   linux autoyast=http://<server>/<path>/autoinst.xml\n",
        );
    } else {
        out.push_str(
            "The profile restores file contents during installation. Serve\n\
             this whole directory over HTTP and enter its URL when the\n\
             installer asks for it:\n\n\
             \x20   linux autoyast=http://<server>/<path>/autoinst.xml\n\n\
             Files listed in `unmanaged_files_build_excludes` are not\n\
             restored. Extracted scopes:\n\n",
        );
        for scope in extracted {
            out.push_str(&format!("- {} ({} entries)\n", scope.kind(), scope.len()));
        }
    }
    out
}
