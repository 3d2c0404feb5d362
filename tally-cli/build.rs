use std::path::Path;
use std::process::Command;

/// Stamps `TALLY_BUILD_SHA` for the `--version` string. Release packaging
/// can pin it through the environment; otherwise ask git, marking dirty trees.
fn main() {
    println!("cargo:rerun-if-env-changed=TALLY_BUILD_SHA");

    let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
    let head = workspace.join(".git").join("HEAD");
    if head.exists() {
        println!("cargo:rerun-if-changed={}", head.display());
    }

    let sha = std::env::var("TALLY_BUILD_SHA")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| git_describe(&workspace))
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=TALLY_BUILD_SHA={sha}");
}

fn git_describe(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}
