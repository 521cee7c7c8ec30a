//! Integration tests for multi-scope discovery and precedence resolution,
//! run against real temp directory trees.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use confscope_core::{ArtifactKind, PathResolver, RealFs, ScopeKind, discover};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Tree {
    _tmp: TempDir,
    root: PathBuf,
    project: PathBuf,
    home: PathBuf,
}

impl Tree {
    /// `<tmp>/mono/app` as the project with `<tmp>/home` as the user home.
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().to_path_buf();
        let project = root.join("mono/app");
        let home = root.join("home");
        std::fs::create_dir_all(&project).expect("project dir");
        std::fs::create_dir_all(&home).expect("home dir");
        Self {
            _tmp: tmp,
            root,
            project,
            home,
        }
    }

    fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, contents).expect("write");
        path
    }

    fn resolver(&self) -> PathResolver {
        PathResolver::new(&self.project, &self.home)
    }
}

#[test]
fn two_scope_conflict_resolves_to_project() {
    let tree = Tree::new();
    let parent_copy = tree.write("mono/.claude/commands/deploy.md", "parent deploy");
    let project_copy = tree.write("mono/app/.claude/commands/deploy.md", "project deploy");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);

    let deploys: Vec<_> = snapshot
        .candidates
        .iter()
        .filter(|c| c.full_identity() == "deploy")
        .collect();
    assert_eq!(deploys.len(), 2);

    let winner = snapshot.find("deploy").expect("active candidate");
    assert_eq!(winner.scope, ScopeKind::Project);
    assert_eq!(winner.path, project_copy);

    let loser = deploys.iter().find(|c| !c.is_active).expect("loser");
    assert_eq!(loser.path, parent_copy);
    assert_eq!(loser.overridden_by.as_deref(), Some(project_copy.as_path()));

    assert_eq!(snapshot.conflicts.len(), 1);
    assert_eq!(snapshot.conflicts[0].identity, "deploy");
    assert_eq!(snapshot.conflicts[0].conflicting_candidates.len(), 2);
}

#[test]
fn namespaces_derive_from_directory_structure() {
    let tree = Tree::new();
    tree.write("mono/app/.claude/commands/git/flow/sync.md", "sync");
    tree.write("mono/app/.claude/commands/top.md", "top");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);

    let sync = snapshot.find("git/flow:sync").expect("namespaced candidate");
    assert_eq!(sync.namespace.as_deref(), Some("git/flow"));
    assert_eq!(sync.name, "sync");

    let top = snapshot.find("top").expect("top-level candidate");
    assert_eq!(top.namespace, None);

    assert!(snapshot.namespaces.contains("git/flow"));
}

#[test]
fn corrupted_frontmatter_is_discovered_without_content() {
    let tree = Tree::new();
    tree.write(
        "mono/app/.claude/commands/broken.md",
        "---\ndescription: [unterminated\n---\nbody",
    );
    tree.write(
        "mono/app/.claude/commands/good.md",
        "---\ndescription: works\n---\nbody",
    );

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);

    let broken = snapshot.find("broken").expect("still discovered");
    assert!(broken.content.is_none());

    let good = snapshot.find("good").expect("good");
    assert!(good.content.is_some());
}

#[test]
fn missing_scope_directories_contribute_nothing() {
    let tree = Tree::new();
    // No .claude anywhere.
    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);
    assert!(snapshot.candidates.is_empty());
    assert!(snapshot.conflicts.is_empty());
}

#[test]
fn user_scope_loses_to_everything() {
    let tree = Tree::new();
    let user_copy = tree.write("home/.claude/commands/release.md", "user");
    tree.write("mono/.claude/commands/release.md", "parent");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);

    let winner = snapshot.find("release").expect("active");
    assert_eq!(winner.scope, ScopeKind::Parent);

    let user = snapshot
        .candidates
        .iter()
        .find(|c| c.path == user_copy)
        .expect("user candidate");
    assert!(!user.is_active);
}

#[test]
fn settings_local_overlay_has_its_own_identity() {
    let tree = Tree::new();
    tree.write("home/.claude/settings.json", "{\"model\": \"user\"}");
    tree.write("mono/app/.claude/settings.json", "{\"model\": \"project\"}");
    tree.write("mono/app/.claude/settings.local.json", "{}");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Settings, &RealFs);

    assert_eq!(snapshot.candidates.len(), 3);
    assert_eq!(snapshot.conflicts.len(), 1);
    assert_eq!(snapshot.conflicts[0].identity, "settings");

    let active = snapshot.find("settings").expect("active settings");
    assert_eq!(active.scope, ScopeKind::Project);
    let metadata = active.content.as_ref().and_then(|c| c.metadata.as_ref());
    assert_eq!(metadata, Some(&serde_json::json!({"model": "project"})));

    assert!(snapshot.find("settings.local").is_some());
}

#[test]
fn memory_files_resolve_across_home_project_and_ancestor() {
    let tree = Tree::new();
    tree.write("home/.claude/CLAUDE.md", "user memory");
    tree.write("mono/CLAUDE.md", "workspace memory");
    let project_memory = tree.write("mono/app/CLAUDE.md", "project memory");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Memory, &RealFs);

    assert_eq!(snapshot.candidates.len(), 3);
    assert_eq!(snapshot.conflicts.len(), 1);
    let winner = snapshot.find("CLAUDE").expect("active memory");
    assert_eq!(winner.path, project_memory);
}

#[test]
fn inactive_variant_keeps_a_distinct_identity() {
    let tree = Tree::new();
    tree.write("mono/app/.claude/commands/deploy.md", "active");
    tree.write("mono/app/.claude/commands/deploy.md.inactive", "disabled");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);

    assert!(snapshot.find("deploy").is_some());
    assert!(snapshot.find("deploy.inactive").is_some());
    // Different identities, so no conflict between them.
    assert!(snapshot.conflicts.is_empty());
}

#[test]
fn walk_does_not_descend_past_namespace_depth() {
    let tree = Tree::new();
    tree.write("mono/app/.claude/commands/a/b/c/ok.md", "ok");
    tree.write("mono/app/.claude/commands/a/b/c/d/too-deep.md", "deep");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);

    assert!(snapshot.find("a/b/c:ok").is_some());
    assert!(snapshot.candidates.iter().all(|c| c.name != "too-deep"));
}

#[test]
fn non_matching_extensions_are_skipped() {
    let tree = Tree::new();
    tree.write("mono/app/.claude/commands/readme.txt", "not a command");
    tree.write("mono/app/.claude/commands/cmd.md", "a command");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);
    assert_eq!(snapshot.candidates.len(), 1);
    assert_eq!(snapshot.candidates[0].name, "cmd");
}

#[test]
fn discovery_is_deterministic_across_runs() {
    let tree = Tree::new();
    tree.write("mono/app/.claude/commands/zeta.md", "z");
    tree.write("mono/app/.claude/commands/alpha.md", "a");
    tree.write("mono/app/.claude/commands/git/mid.md", "m");
    tree.write("home/.claude/commands/alpha.md", "user a");

    let resolver = tree.resolver();
    let first = discover(&resolver, ArtifactKind::Command, &RealFs);
    let second = discover(&resolver, ArtifactKind::Command, &RealFs);

    let paths = |s: &confscope_core::DiscoverySnapshot| -> Vec<PathBuf> {
        s.candidates.iter().map(|c| c.path.clone()).collect()
    };
    assert_eq!(paths(&first), paths(&second));

    let actives = |s: &confscope_core::DiscoverySnapshot| -> Vec<PathBuf> {
        s.active().map(|c| c.path.clone()).collect()
    };
    assert_eq!(actives(&first), actives(&second));
}

#[test]
fn snapshot_reflects_external_edits_between_calls() {
    let tree = Tree::new();
    let resolver = tree.resolver();

    let before = discover(&resolver, ArtifactKind::Command, &RealFs);
    assert!(before.candidates.is_empty());

    tree.write("mono/app/.claude/commands/fresh.md", "just added");
    let after = discover(&resolver, ArtifactKind::Command, &RealFs);
    assert_eq!(after.candidates.len(), 1);
}

#[test]
fn directories_before_files_within_a_scope() {
    let tree = Tree::new();
    tree.write("mono/app/.claude/commands/aaa.md", "file first alphabetically");
    tree.write("mono/app/.claude/commands/zzz/nested.md", "dir last alphabetically");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);
    let names: Vec<&str> = snapshot.candidates.iter().map(|c| c.name.as_str()).collect();
    // The nested file comes out before the base-level file.
    assert_eq!(names, vec!["nested", "aaa"]);
}

#[test]
fn placement_of_discovered_files_matches_their_namespace() {
    let tree = Tree::new();
    let path = tree.write("mono/app/.claude/commands/git/flow/sync.md", "sync");
    let base = tree.project.join(".claude/commands");

    let report =
        confscope_core::validate::validate_placement(&path, &base, Some("git/flow"));
    assert!(report.valid);

    let wrong =
        confscope_core::validate::validate_placement(&path, &base, Some("ci"));
    assert!(!wrong.valid);
}

#[test]
fn symlinked_directory_cycles_do_not_hang_the_walk() {
    let tree = Tree::new();
    tree.write("mono/app/.claude/commands/ns/cmd.md", "cmd");
    let commands: &Path = &tree.project.join(".claude/commands");

    #[cfg(unix)]
    std::os::unix::fs::symlink(commands, commands.join("ns/loop")).expect("symlink");

    let snapshot = discover(&tree.resolver(), ArtifactKind::Command, &RealFs);
    // The cycle is entered at most once; the command is found either way.
    assert!(snapshot.find("ns:cmd").is_some());
}
