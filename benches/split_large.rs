//! This bench splits a large generated manual at its second-level headings
//! and rewrites every link in the resulting sub-documents.

#![allow(missing_docs)]

use std::fmt::Write;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use mdarrange::domain::{
    Body, HeadingSplitter, LinkAction, LinkRewriter, LinkRule, Preamble,
};

/// Generates a manual with many chapters, sub-chapters, links and code
/// blocks.
fn generate_manual(chapters: usize) -> String {
    let mut manual = String::from("# Operations\n\nGenerated manual.\n\n");
    for chapter in 1..=chapters {
        writeln!(manual, "## {chapter}. Chapter {chapter}\n").unwrap();
        for section in 1..=5 {
            writeln!(manual, "### {chapter}.{section} Topic\n").unwrap();
            writeln!(
                manual,
                "See [the API](/documentation/javadoc/{chapter}/Topic{section}.html) \
                 and [design](design.html#s{section}).\n"
            )
            .unwrap();
            writeln!(manual, "```\n## not a heading\n[link](/documentation/x.html)\n```\n").unwrap();
        }
    }
    manual
}

fn rewriter() -> LinkRewriter {
    LinkRewriter::new(vec![
        LinkRule::new("/documentation/", LinkAction::Substitute, "/"),
        LinkRule::new("/javadoc/", LinkAction::Prefix, "/39"),
        LinkRule::new("design.html", LinkAction::Replace, "../design"),
    ])
}

fn split_and_rewrite(c: &mut Criterion) {
    let body = Body::parse(&generate_manual(500));
    let splitter = HeadingSplitter::new(2, Preamble::Intro);
    let rewriter = rewriter();

    c.bench_function("split large manual", |b| {
        b.iter(|| splitter.split(&body, "Operations"));
    });

    c.bench_function("split and rewrite large manual", |b| {
        b.iter_batched(
            || splitter.split(&body, "Operations"),
            |split| {
                split
                    .parts
                    .into_iter()
                    .map(|part| rewriter.rewrite_body(part.body))
                    .count()
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, split_and_rewrite);
criterion_main!(benches);
