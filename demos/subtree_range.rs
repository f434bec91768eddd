//! Subtree queries on a sorted map keyed by labels.
//!
//! Any ordered store works the same way: a subtree is the half-open key range
//! `[label, descendant_limit(label))`, so no recursion or parent pointers are
//! needed to list it.
//!
//! Run with: `RUST_LOG=preorder_label=trace cargo run --example subtree_range`

use std::collections::BTreeMap;
use std::ops::Bound as Range;

use preorder_label::{Bound, PreorderLabel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut outline: BTreeMap<PreorderLabel, &str> = BTreeMap::new();

    let root = PreorderLabel::root();
    let chapters = root.create_children(3)?;
    for (chapter, title) in chapters.iter().zip(["Intro", "Guide", "Reference"]) {
        outline.insert(chapter.clone(), title);
    }

    let guide = &chapters[1];
    let sections = guide.create_children(2)?;
    outline.insert(sections[0].clone(), "Guide / Install");
    outline.insert(sections[1].clone(), "Guide / Configure");
    outline.insert(sections[1].create_child(), "Guide / Configure / Logging");

    // Insert between existing sections and before the first chapter without
    // touching any stored key.
    let upgrade = sections[0].create_sibling(&sections[1])?;
    outline.insert(upgrade.clone(), "Guide / Upgrade");
    outline.insert(chapters[0].create_sibling(Bound::First)?, "Preface");

    println!("Document order:");
    for (label, title) in &outline {
        println!("  {:<10} {}{}", label, "  ".repeat(label.depth() - 1), title);
    }

    let limit = guide.descendant_limit()?;
    let subtree = outline.range::<[u8], _>((
        Range::Included(guide.as_bytes()),
        Range::Excluded(limit.as_slice()),
    ));

    println!("\nSubtree of {} ({}):", outline[guide], guide);
    for (label, title) in subtree {
        println!("  {:<10} {}", label, title);
    }

    let ancestry: Vec<&str> = upgrade
        .ancestors()?
        .iter()
        .map(|ancestor| outline[ancestor])
        .collect();
    tracing::info!(label = %upgrade, ?ancestry, "ancestors of the upgrade section");

    Ok(())
}
