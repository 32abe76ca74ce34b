use std::fs;
use std::path::{Path, PathBuf};

const ALLOWED_SQLX_USERS: &[&str] = &["src/adapters/postgres.rs", "src/error.rs"];

const ALLOWED_REQWEST_USERS: &[&str] = &["src/adapters/sofascore.rs", "src/error.rs"];

fn collect_rust_files(root: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rust_files(&path, out);
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) == Some("rs") {
            out.push(path);
        }
    }
}

/// (relative path, 1-based line, trimmed line) for every source line matching `needle`
fn find_usages(needle: &str) -> Vec<(String, usize, String)> {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    collect_rust_files(&repo_root.join("src"), &mut files);

    let mut hits = Vec::new();
    for file in files {
        let rel = file
            .strip_prefix(repo_root)
            .unwrap_or(&file)
            .to_string_lossy()
            .replace('\\', "/");
        let content = fs::read_to_string(&file).unwrap_or_default();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.contains(needle) {
                hits.push((rel.clone(), idx + 1, trimmed.to_string()));
            }
        }
    }
    hits
}

fn offenders(needle: &str, allowed: &[&str]) -> Vec<String> {
    find_usages(needle)
        .into_iter()
        .filter(|(rel, _, _)| !allowed.iter().any(|a| a == rel))
        .map(|(rel, line, text)| format!("{rel}:{line}: {text}"))
        .collect()
}

#[test]
fn database_access_stays_in_the_postgres_adapter() {
    let found = offenders("sqlx::", ALLOWED_SQLX_USERS);
    assert!(
        found.is_empty(),
        "sqlx used outside the storage adapter:\n{}",
        found.join("\n")
    );
}

#[test]
fn provider_http_stays_in_the_sofascore_adapter() {
    let found = offenders("reqwest::", ALLOWED_REQWEST_USERS);
    assert!(
        found.is_empty(),
        "reqwest used outside the provider adapter:\n{}",
        found.join("\n")
    );
}

#[test]
fn subscriber_registry_is_owned_by_the_hub_module() {
    let found = offenders("Registry", &["src/broadcast/hub.rs"]);
    assert!(
        found.is_empty(),
        "hub subscriber registry referenced outside its owning module:\n{}",
        found.join("\n")
    );
}
