// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=CAMVIEW_VERSION");

    // Distribution builds have no git checkout and pin the version instead
    let version = std::env::var("CAMVIEW_VERSION")
        .ok()
        .or_else(describe_head)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `git describe` turned into `0.1.0` on a tag or `0.1.0+5.abcdef1` past it
fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--long", "--match", "v*"])
        .output()
        .ok()
        .filter(|o| o.status.success())?;

    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim().trim_start_matches('v');

    // --long always yields <tag>-<commits>-g<hash>
    let mut parts = described.rsplitn(3, '-');
    let hash = parts.next()?.trim_start_matches('g');
    let commits = parts.next()?;
    let tag = parts.next()?;

    if commits == "0" {
        Some(tag.to_string())
    } else {
        Some(format!("{}+{}.{}", tag, commits, hash))
    }
}
