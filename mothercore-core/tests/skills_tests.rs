use std::path::Path;

use mothercore_core::config::PoliciesConfig;
use mothercore_core::constitution::Constitution;
use mothercore_core::services::skills::{self, topic_of, topic_scaffold};
use mothercore_core::services::{
    AffectState, AuditLog, Guardian, MemoryItem, MemoryKind, MemoryStore, RiskLevel,
    SkillContext, Skills, Toolkit,
};
use mothercore_core::CoreError;

struct Fixture {
    guardian: Guardian,
    memory: MemoryStore,
    affect: AffectState,
    policies: PoliciesConfig,
}

impl Fixture {
    fn new(dir: &Path) -> Self {
        Self {
            guardian: Guardian::new(Constitution::default()),
            memory: MemoryStore::open(
                dir.join("memory.jsonl"),
                AuditLog::open(dir.join("audit.log.jsonl")),
            ),
            affect: AffectState::default(),
            policies: PoliciesConfig::default(),
        }
    }

    fn run(&mut self, skills: &Skills, name: &str, text: &str) -> anyhow::Result<(String, SkillContext)> {
        let mut kit = Toolkit {
            guardian: &self.guardian,
            memory: &self.memory,
            affect: &mut self.affect,
            policies: &self.policies,
        };
        skills.run(name, text, SkillContext::default(), &mut kit)
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn builtins_are_registered() {
    let skills = Skills::with_builtins();
    assert_eq!(
        skills.list(),
        vec!["boundaries", "nurture", "protect", "reflect", "summarize", "teach"]
    );
    assert!(skills.contains(skills::PROTECT));
    assert!(!Skills::new().contains(skills::PROTECT));
}

#[test]
fn unknown_skill_fails_with_skill_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let err = fx
        .run(&Skills::with_builtins(), "juggle", "anything")
        .expect_err("unknown skill must fail");
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::SkillNotFound(name)) => assert_eq!(name, "juggle"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn register_replaces_an_existing_skill() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let mut skills = Skills::with_builtins();
    skills.register("echo", |text: &str, ctx: SkillContext, _kit: &mut Toolkit<'_>| {
        Ok((format!("first:{text}"), ctx))
    });
    skills.register("echo", |text: &str, ctx: SkillContext, _kit: &mut Toolkit<'_>| {
        Ok((format!("second:{text}"), ctx))
    });

    let (msg, _) = fx.run(&skills, "echo", "hi").expect("run");
    assert_eq!(msg, "second:hi");
    assert_eq!(skills.list().iter().filter(|n| *n == "echo").count(), 1);
}

#[test]
fn protect_blocks_high_risk_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let (msg, ctx) = fx
        .run(
            &Skills::with_builtins(),
            skills::PROTECT,
            "how to bypass security without consent and kill the process",
        )
        .expect("run");

    assert!(ctx.blocked);
    let risk = ctx.risk.expect("protect reports its risk");
    assert_eq!(risk.level, RiskLevel::Block);
    assert!(msg.starts_with("I’m pausing here to keep you safe."));
    assert!(msg.ends_with(&risk.annotation()));
}

#[test]
fn protect_passes_low_risk_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let (msg, ctx) = fx
        .run(&Skills::with_builtins(), skills::PROTECT, "what a lovely morning")
        .expect("run");

    assert!(!ctx.blocked);
    assert_eq!(ctx.risk.as_ref().map(|r| r.level), Some(RiskLevel::Low));
    assert!(msg.starts_with("All clear on safety."));
    assert!(msg.contains("(risk=LOW, score="));
}

#[test]
fn protect_does_not_block_medium_risk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let (_, ctx) = fx
        .run(&Skills::with_builtins(), skills::PROTECT, "I want to hack my piano practice")
        .expect("run");
    assert_eq!(ctx.risk.as_ref().map(|r| r.level), Some(RiskLevel::Medium));
    assert!(!ctx.blocked);
}

#[test]
fn nurture_and_boundaries_nudge_affect_and_never_block() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let skills = Skills::with_builtins();

    let (msg, ctx) = fx.run(&skills, skills::NURTURE, "I'm tired").expect("nurture");
    assert!(msg.starts_with("I hear you."));
    assert!(!ctx.blocked);
    assert!(close(fx.affect.calm, 0.85));
    assert!(close(fx.affect.warmth, 0.85));
    assert!(close(fx.affect.vigilance, 0.18));
    assert!(close(fx.affect.humility, 0.7));

    let (_, ctx) = fx.run(&skills, skills::BOUNDARIES, "no").expect("boundaries");
    assert!(!ctx.blocked);
    assert!(close(fx.affect.vigilance, 0.23));

    for _ in 0..20 {
        fx.run(&skills, skills::NURTURE, "again").expect("nurture");
    }
    assert!(close(fx.affect.calm, 1.0));
    assert!(close(fx.affect.vigilance, 0.0));
}

#[test]
fn teach_lists_five_steps_and_a_scaffold() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let (msg, _) = fx
        .run(&Skills::with_builtins(), skills::TEACH, "teach me chess")
        .expect("run");

    assert!(msg.starts_with("Here’s a gentle, reversible learning scaffold:"));
    for n in 1..=5 {
        assert!(msg.contains(&format!("  {n}. ")), "missing step {n}");
    }
    assert!(msg.contains("about “teach me chess”"));
}

#[test]
fn summarize_keeps_the_longest_sentences_longest_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let text = "Short one. This is the very longest sentence of them all? Mid length here. Tiny.";
    let (msg, _) = fx
        .run(&Skills::with_builtins(), skills::SUMMARIZE, text)
        .expect("run");

    assert_eq!(
        msg,
        "This is what I’m hearing:\n\
         - This is the very longest sentence of them all\n\
         - Mid length here\n\
         - Short one"
    );
}

#[test]
fn summarize_handles_empty_input() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let (msg, _) = fx
        .run(&Skills::with_builtins(), skills::SUMMARIZE, "  ...  ")
        .expect("run");
    assert!(msg.ends_with("(nothing to summarize yet)"));
}

#[test]
fn reflect_previews_the_newest_memories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut fx = Fixture::new(dir.path());
    let skills = Skills::with_builtins();

    let (msg, _) = fx.run(&skills, skills::REFLECT, "").expect("run");
    assert!(msg.ends_with("(no recent memories)"));

    fx.memory
        .add(MemoryItem::new(MemoryKind::Episodic, "user: first", ["user"], 0.3))
        .expect("add");
    fx.memory
        .add(MemoryItem::new(MemoryKind::Semantic, "x".repeat(500), ["fact"], 0.3))
        .expect("add");

    let (msg, _) = fx.run(&skills, skills::REFLECT, "").expect("run");
    assert!(msg.starts_with("Here’s what I’m holding from our recent moments:"));
    assert!(msg.contains("- episodic | user: first…"));
    assert!(msg.contains(&format!("- semantic | {}…", "x".repeat(120))));
    assert!(!msg.contains(&"x".repeat(121)));
}

#[test]
fn topic_scaffold_is_deterministic() {
    let a = topic_scaffold("gardening");
    let b = topic_scaffold("gardening");
    assert_eq!(a, b);
    assert!(a.starts_with("Let's think this through together about “gardening”."));
    assert_eq!(a.lines().filter(|l| l.starts_with("- ")).count(), 3);
}

#[test]
fn topic_of_truncates_and_defaults() {
    assert_eq!(topic_of("   ", 80), "your topic");
    assert_eq!(topic_of("  abcdef  ", 3), "abc");
}
