//! Workspace root crate.
//!
//! Anchors workspace-wide tooling (git hooks via cargo-husky); all
//! functionality lives in the `crates/` members.
