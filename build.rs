use std::env;
use std::process::Command;

const VERSION_OVERRIDE: &str = "IMPORT_ESTIMATOR_VERSION";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed={VERSION_OVERRIDE}");

    // Packagers building from a tarball have no git metadata.
    if let Some(version) = env::var(VERSION_OVERRIDE).ok().filter(|v| !v.trim().is_empty()) {
        println!("cargo:rustc-env=GIT_TAG={}", version.trim());
        return;
    }

    if let Some(tag) = describe_tag() {
        println!("cargo:rustc-env=GIT_TAG={tag}");
    }
}

/// Nearest tag, suffixed with `-dirty` when the worktree has local edits.
fn describe_tag() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--abbrev=0", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let tag = String::from_utf8(output.stdout).ok()?;
    let tag = tag.trim();
    (!tag.is_empty()).then(|| tag.to_string())
}
