//! Property tests for stored markup and mark ranges.

use proptest::prelude::*;
use quire_model::markup::{parse, serialize};
use quire_model::{Document, Mark, MarkType, Node, Schema, TextRun, resolve_mark_range};

fn arb_mark() -> impl Strategy<Value = Mark> + Clone {
    prop_oneof![
        Just(Mark::Bold),
        Just(Mark::Italic),
        Just(Mark::Underline),
        (0..3usize).prop_map(|n| Mark::link(format!("https://site{n}.dev/?a=1&b=\"2\""), None)),
        Just(Mark::link("/local", Some("Local <page>".to_string()))),
    ]
}

fn arb_run() -> impl Strategy<Value = TextRun> + Clone {
    (
        "[a-z <>&\"'\n]{1,8}",
        proptest::collection::vec(arb_mark(), 0..3),
    )
        .prop_map(|(text, marks)| TextRun::marked(text, marks))
}

fn arb_block() -> impl Strategy<Value = Node> {
    let runs = proptest::collection::vec(arb_run(), 0..5);
    prop_oneof![
        runs.clone().prop_map(Node::paragraph),
        (1u8..=6, runs.clone()).prop_map(|(level, runs)| Node::heading(level, runs)),
        runs.clone()
            .prop_map(|runs| Node::blockquote(vec![Node::paragraph(runs)])),
        runs.prop_map(|runs| Node::bullet_list(vec![Node::list_item(vec![Node::paragraph(runs)])])),
        Just(Node::horizontal_rule()),
        "[a-zA-Z0-9_-]{1,11}".prop_map(Node::video),
        ("[a-z/.]{1,10}", proptest::option::of("[a-z &]{0,6}"))
            .prop_map(|(src, alt)| Node::image(format!("/{src}"), alt)),
    ]
}

proptest! {
    #[test]
    fn markup_round_trips(blocks in proptest::collection::vec(arb_block(), 1..6)) {
        let schema = Schema::default();
        let doc = Document::from_blocks(blocks, &schema).unwrap();
        let reparsed = parse(&serialize(&doc), &schema).unwrap();
        prop_assert_eq!(reparsed, doc);
    }

    #[test]
    fn mark_range_never_includes_its_edges(
        runs in proptest::collection::vec(arb_run(), 1..6),
        offset in 0usize..64,
    ) {
        let schema = Schema::default();
        let doc = Document::from_blocks(vec![Node::paragraph(runs)], &schema).unwrap();
        let pos = offset % (doc.size() + 1);
        if let Some(range) = resolve_mark_range(&doc, pos, MarkType::Link) {
            prop_assert!(range.from < pos && pos < range.to);
            // positions on the edges resolve to nothing
            prop_assert_eq!(resolve_mark_range(&doc, range.from, MarkType::Link)
                .filter(|r| *r == range), None);
            prop_assert_eq!(resolve_mark_range(&doc, range.to, MarkType::Link)
                .filter(|r| *r == range), None);
        }
    }
}
