use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

#[test]
fn derivation_modules_are_pure() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/system");
    let mut violations = Vec::new();

    for name in ["rate.rs", "smoothing.rs", "census.rs", "counter_store.rs", "entity.rs"] {
        let file = root.join(name);
        let content = fs::read_to_string(&file).unwrap_or_default();
        for forbidden in ["std::fs", "super::procfs", "super::platform", "sysinfo", "libc::"] {
            if content.contains(forbidden) {
                violations.push(format!(
                    "{} imports forbidden dependency `{}`",
                    rel(&file),
                    forbidden
                ));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "Derivation layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn engine_reads_only_through_snapshot_source() {
    let file = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/system/engine.rs");
    let content = fs::read_to_string(&file).unwrap_or_default();
    let mut violations = Vec::new();

    for forbidden in ["std::fs", "super::procfs", "super::platform", "/proc/", "/sys/"] {
        if content.contains(forbidden) {
            violations.push(format!("{} uses `{}` directly", rel(&file), forbidden));
        }
    }

    assert!(
        violations.is_empty(),
        "Engine/source boundary violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn target_os_cfg_is_scoped_to_system_platform() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        if !content.contains("target_os") {
            continue;
        }

        let rel_path = rel(&file);
        if !rel_path.starts_with("src/system/platform/") {
            violations.push(format!(
                "{} contains `target_os` cfg but is outside allowed boundary",
                rel_path
            ));
        }
    }

    assert!(
        violations.is_empty(),
        "Unexpected target_os cfg usage:\n{}",
        violations.join("\n")
    );
}
