use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use pw_core::UserContext;
use walkdir::WalkDir;

pub(crate) fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be monotonic")
        .as_nanos();
    std::env::temp_dir().join(format!("pw-cli-{}-{}", name, nanos))
}

pub(crate) fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent should be created");
    }
    fs::write(path, content).expect("file should be written");
}

pub(crate) fn demo_catalog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
        .join("catalog-goblins")
}

/// Saves and spawns write into the catalog, so tests work on a private copy.
pub(crate) fn demo_catalog_copy(name: &str) -> String {
    let source = demo_catalog_dir();
    let target = temp_path(name);
    for entry in WalkDir::new(&source).into_iter().filter_map(Result::ok) {
        let relative = entry
            .path()
            .strip_prefix(&source)
            .expect("entry should be under the catalog");
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).expect("dir should be created");
        } else {
            fs::copy(entry.path(), &destination).expect("file should be copied");
        }
    }
    target.to_string_lossy().to_string()
}

pub(crate) fn builder() -> UserContext {
    let mut user = UserContext::new("alice");
    user.permissions.push("Builder".to_string());
    user.location = Some("#2".to_string());
    user
}
