//! Integration tests over on-disk skill corpora

#![allow(clippy::unwrap_used, clippy::expect_used)]

use skillshelf_skills::{SectionKind, SkillError, SkillsRegistry};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const PRINCIPLES_SKILL: &str = r#"---
name: ai-coding-principles
description: "Core principles for writing maintainable code with AI assistants"
license: MIT
---

# AI Coding Principles

See rules/error-never-swallow.md.
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn principles_corpus() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "skills/ai-coding-principles/SKILL.md",
        PRINCIPLES_SKILL,
    );
    write(
        root.path(),
        "skills/ai-coding-principles/rules/error-never-swallow.md",
        "# Never swallow errors\n",
    );
    root
}

fn build(root: &Path) -> SkillsRegistry {
    SkillsRegistry::builder()
        .add_directory(root)
        .build()
        .expect("registry should build")
}

#[test]
fn test_body_and_attachment_loading() {
    let corpus = principles_corpus();
    let registry = build(&corpus.path().join("skills"));

    assert_eq!(registry.slugs(), vec!["ai-coding-principles"]);
    let skill = registry.get("ai-coding-principles").unwrap();
    assert_eq!(skill.license(), Some("MIT"));

    let body = registry.load_body("ai-coding-principles").unwrap();
    assert_eq!(body.kind, SectionKind::Body);
    assert_eq!(body.as_str(), PRINCIPLES_SKILL);

    let rule = registry
        .load_attachment("ai-coding-principles", "rules/error-never-swallow.md")
        .unwrap();
    assert_eq!(rule.kind, SectionKind::Attachment);
    assert_eq!(rule.as_str(), "# Never swallow errors\n");

    let missing = registry
        .load_attachment("ai-coding-principles", "rules/does-not-exist.md")
        .unwrap_err();
    assert!(matches!(missing, SkillError::AttachmentNotFound { .. }));
}

#[test]
fn test_every_skill_has_body_and_description() {
    let root = tempfile::tempdir().unwrap();
    for slug in ["one", "two", "three"] {
        write(
            root.path(),
            &format!("{slug}/SKILL.md"),
            &format!("---\nname: {slug}\ndescription: Skill {slug}\n---\n"),
        );
    }
    let registry = build(root.path());

    assert_eq!(registry.len(), 3);
    for skill in registry.skills() {
        assert!(!skill.description().is_empty());
        assert_eq!(skill.body().kind(), SectionKind::Body);
        assert_eq!(skill.body().relative_path(), "SKILL.md");
        assert!(skill.attachment_paths().all(|p| p != "SKILL.md"));
    }
}

#[test]
fn test_loading_is_idempotent() {
    let corpus = principles_corpus();
    let registry = build(&corpus.path().join("skills"));

    let first = registry
        .load("ai-coding-principles", Some("rules/error-never-swallow.md"))
        .unwrap();
    let second = registry
        .load("ai-coding-principles", Some("./rules/error-never-swallow.md"))
        .unwrap();
    assert_eq!(first.as_str().as_bytes(), second.as_str().as_bytes());

    let body_a = registry.load("ai-coding-principles", None).unwrap();
    let body_b = registry.load("ai-coding-principles", None).unwrap();
    assert_eq!(body_a, body_b);
}

#[test]
fn test_shared_name_different_slugs_accepted() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "first/SKILL.md",
        "---\nname: same-name\ndescription: First copy\n---\n",
    );
    write(
        root.path(),
        "second/SKILL.md",
        "---\nname: same-name\ndescription: Second copy\n---\n",
    );

    let registry = build(root.path());
    assert_eq!(registry.slugs(), vec!["first", "second"]);
    assert_eq!(registry.get("first").unwrap().name(), "same-name");
    assert_eq!(registry.get("second").unwrap().name(), "same-name");
}

#[test]
fn test_path_traversal_is_not_found() {
    let corpus = principles_corpus();
    write(corpus.path(), "skills/secret.md", "top secret");
    let registry = build(&corpus.path().join("skills"));

    for attempt in [
        "../../etc/passwd",
        "../secret.md",
        "rules/../../secret.md",
        "/etc/passwd",
        "SKILL.md",
    ] {
        let err = registry
            .load_attachment("ai-coding-principles", attempt)
            .unwrap_err();
        assert!(err.is_not_found(), "{attempt} should be NotFound, got {err}");
    }
}

#[test]
fn test_directory_without_body_is_excluded() {
    let corpus = principles_corpus();
    write(corpus.path(), "skills/drafts/notes.md", "# wip\n");

    let registry = build(&corpus.path().join("skills"));
    assert_eq!(registry.slugs(), vec!["ai-coding-principles"]);
    assert!(registry.get("drafts").is_none());
}

#[test]
fn test_unknown_slug_is_not_found() {
    let empty = SkillsRegistry::default();
    let err = empty.load_body("nonexistent-skill").unwrap_err();
    assert!(matches!(err, SkillError::SkillNotFound { .. }));

    let corpus = principles_corpus();
    let registry = build(&corpus.path().join("skills"));
    let err = registry
        .load("nonexistent-skill", Some("rules/error-never-swallow.md"))
        .unwrap_err();
    assert!(matches!(err, SkillError::SkillNotFound { .. }));
}

#[test]
fn test_malformed_skill_does_not_block_others() {
    let corpus = principles_corpus();
    write(corpus.path(), "skills/no-header/SKILL.md", "# Missing header\n");
    write(
        corpus.path(),
        "skills/no-description/SKILL.md",
        "---\nname: no-description\n---\n",
    );
    write(
        corpus.path(),
        "skills/bad-yaml/SKILL.md",
        "---\nname: [unclosed\ndescription: x\n---\n",
    );

    let registry = build(&corpus.path().join("skills"));
    assert_eq!(registry.slugs(), vec!["ai-coding-principles"]);
}

#[test]
fn test_duplicate_slug_across_roots_is_fatal() {
    let first = principles_corpus();
    let second = principles_corpus();

    let err = SkillsRegistry::builder()
        .add_directory(first.path().join("skills"))
        .add_directory(second.path().join("skills"))
        .build()
        .unwrap_err();

    match err {
        SkillError::DuplicateSlug { slug, .. } => assert_eq!(slug, "ai-coding-principles"),
        other => panic!("expected DuplicateSlug, got {other}"),
    }
}

#[test]
fn test_same_root_twice_is_not_a_duplicate() {
    let corpus = principles_corpus();
    let root = corpus.path().join("skills");

    let registry = SkillsRegistry::builder()
        .add_directory(&root)
        .add_directory(&root)
        .build()
        .unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_file_deleted_after_indexing_is_read_error() {
    let corpus = principles_corpus();
    let registry = build(&corpus.path().join("skills"));

    fs::remove_file(
        corpus
            .path()
            .join("skills/ai-coding-principles/rules/error-never-swallow.md"),
    )
    .unwrap();

    let err = registry
        .load_attachment("ai-coding-principles", "rules/error-never-swallow.md")
        .unwrap_err();
    assert!(matches!(err, SkillError::Read { .. }));
}

#[test]
fn test_configurable_nesting_depth() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "skills/skills/nested-skill/SKILL.md",
        "---\nname: nested-skill\ndescription: Deeply nested\n---\n",
    );

    // The outer directory only holds a directory of skills, not skills
    assert!(build(&root.path().join("skills")).is_empty());
    assert_eq!(
        build(&root.path().join("skills/skills")).slugs(),
        vec!["nested-skill"]
    );
}

#[test]
fn test_concurrent_readers() {
    let corpus = principles_corpus();
    let registry = Arc::new(build(&corpus.path().join("skills")));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    if i % 2 == 0 {
                        registry.load_body("ai-coding-principles").unwrap()
                    } else {
                        registry
                            .load_attachment(
                                "ai-coding-principles",
                                "rules/error-never-swallow.md",
                            )
                            .unwrap()
                    }
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let content = handle.join().unwrap();
            if i % 2 == 0 {
                assert_eq!(content.as_str(), PRINCIPLES_SKILL);
            } else {
                assert_eq!(content.as_str(), "# Never swallow errors\n");
            }
        }
    });
}

#[test]
fn test_same_root_spelled_differently_is_not_a_duplicate() {
    let corpus = principles_corpus();
    let root = corpus.path().join("skills");

    // Relative spelling of the same directory, walked up from the working dir
    let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
    let absolute = root.canonicalize().unwrap();
    let mut relative = std::path::PathBuf::new();
    for _ in cwd.components().skip(1) {
        relative.push("..");
    }
    relative.push(absolute.strip_prefix("/").unwrap());

    let registry = SkillsRegistry::builder()
        .add_directory(&root)
        .add_directory(root.join("..").join("skills"))
        .add_directory(root.join("."))
        .add_directory(&relative)
        .build()
        .unwrap();
    assert_eq!(registry.slugs(), vec!["ai-coding-principles"]);
}

#[cfg(unix)]
#[test]
fn test_symlinked_attachment_is_not_indexed() {
    let corpus = principles_corpus();
    write(corpus.path(), "outside.md", "outside the skill");
    let skill_dir = corpus.path().join("skills/ai-coding-principles");
    std::os::unix::fs::symlink(
        corpus.path().join("outside.md"),
        skill_dir.join("rules/outside.md"),
    )
    .unwrap();
    std::os::unix::fs::symlink(corpus.path(), skill_dir.join("linked-dir")).unwrap();

    let registry = build(&corpus.path().join("skills"));
    let skill = registry.get("ai-coding-principles").unwrap();
    assert_eq!(
        skill.attachment_paths().collect::<Vec<_>>(),
        vec!["rules/error-never-swallow.md"]
    );

    for path in ["rules/outside.md", "linked-dir/outside.md"] {
        let err = registry
            .load_attachment("ai-coding-principles", path)
            .unwrap_err();
        assert!(matches!(err, SkillError::AttachmentNotFound { .. }));
    }
}

#[test]
fn test_attachment_walk_depth_is_bounded() {
    let corpus = principles_corpus();
    let skill_dir = corpus.path().join("skills/ai-coding-principles");
    write(&skill_dir, "a/b/c/d/e/f/g/h/shallow-enough.md", "# depth 8\n");
    write(&skill_dir, "a/b/c/d/e/f/g/h/i/j/too-deep.md", "# depth 10\n");

    let registry = build(&corpus.path().join("skills"));
    let skill = registry.get("ai-coding-principles").unwrap();
    let paths: Vec<_> = skill.attachment_paths().collect();

    assert!(paths.contains(&"a/b/c/d/e/f/g/h/shallow-enough.md"));
    assert!(!paths.iter().any(|p| p.ends_with("too-deep.md")));
    let err = registry
        .load_attachment("ai-coding-principles", "a/b/c/d/e/f/g/h/i/j/too-deep.md")
        .unwrap_err();
    assert!(err.is_not_found());
}
