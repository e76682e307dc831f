use super::*;
use crate::image_cache::tests::{FakeFetcher, MemoryStore};
use crate::image_cache::{CacheKey, ImageCache};
use crate::types::Actor;

const WHEN: &str = "2022-04-01T12:00:00.000000+0000";
const IMAGE_URL: &str = "https://example.com/abc123/photo.png";

/// Helper: context in UTC whose fetcher serves a single image
fn test_context() -> MarkdownContext<FakeFetcher, MemoryStore> {
    let fetcher = FakeFetcher::serving(&[(IMAGE_URL, &b"png"[..])]);
    let images = ImageCache::new(
        fetcher,
        MemoryStore::default(),
        CacheKey::PathSegment,
        "../img",
    );
    MarkdownContext::new(Tz::UTC, images)
}

fn post_by(handle: &str, when: &str, content: Vec<ContentBlock>) -> Post {
    Post {
        filename: None,
        poster: Actor::named(handle.to_uppercase(), handle),
        published_at: when.to_owned(),
        content,
        tags: vec![],
        share_tree: vec![],
    }
}

fn image(alt: Option<&str>) -> ContentBlock {
    ContentBlock::Image(Image {
        url: IMAGE_URL.to_owned(),
        alt_text: alt.map(str::to_owned),
    })
}

#[test]
fn test_text_block_is_verbatim() {
    let mut ctx = test_context();
    let md = "# heading\n\n* a list\n* with `code`";
    let out = render_block(&ContentBlock::Text(md.into()), &mut ctx).unwrap();
    assert_eq!(out, md);
}

#[test]
fn test_anonymous_question() {
    let mut ctx = test_context();
    let ask = ContentBlock::Question(Ask {
        content: "hi".into(),
        sender: Actor::Anonymous,
        sent_at: WHEN.into(),
    });
    let out = render_block(&ask, &mut ctx).unwrap();
    assert_eq!(
        out,
        "anon asked at 2022-04-01 12:00:00 UTC:\n\n```quote\nhi\n```"
    );
}

#[test]
fn test_named_question() {
    let mut ctx = test_context();
    let ask = ContentBlock::Question(Ask {
        content: "what's your favourite colour?\n".into(),
        sender: Actor::named("Bob", "bob"),
        sent_at: WHEN.into(),
    });
    let out = render_block(&ask, &mut ctx).unwrap();
    insta::assert_snapshot!(out, @r"
    **Bob | @bob** asked at 2022-04-01 12:00:00 UTC:

    ```quote
    what's your favourite colour?
    ```
    ");
}

#[test]
fn test_image_without_alt() {
    let mut ctx = test_context();
    let out = render_block(&image(None), &mut ctx).unwrap();
    assert_eq!(out, "![](../img/abc123.png)");
    assert_eq!(ctx.images.store().files["abc123.png"], b"png");
}

#[test]
fn test_image_alt_newlines_become_spaces() {
    let mut ctx = test_context();
    let block = image(Some("a cat\nsitting\r\non a mat"));
    let first = render_block(&block, &mut ctx).unwrap();
    let second = render_block(&block, &mut ctx).unwrap();
    assert_eq!(first, "![a cat sitting on a mat](../img/abc123.png)");
    assert_eq!(first, second);
    assert_eq!(ctx.images.fetcher().requests.borrow().len(), 1);
}

#[test]
fn test_blocks_keep_order_and_blank_lines() {
    let mut ctx = test_context();
    let blocks = vec![
        ContentBlock::Text("one".into()),
        image(Some("two")),
        ContentBlock::Text("three".into()),
    ];
    let out = render_content(&blocks, &mut ctx).unwrap();
    assert_eq!(out, "one\n\n![two](../img/abc123.png)\n\nthree");
}

#[test]
fn test_tags() {
    assert_eq!(render_tags(&["art".into(), "wip".into()]), "#art, #wip");
    assert_eq!(render_tags(&[]), "");
}

#[test]
fn test_post_with_tags() {
    let mut ctx = test_context();
    let mut post = post_by("alice", WHEN, vec![ContentBlock::Text("hello".into())]);
    post.tags = vec!["art".into(), "wip".into()];
    let out = render_post(&post, &mut ctx).unwrap();
    insta::assert_snapshot!(out, @r"
    **ALICE | @alice** said at 2022-04-01 12:00:00 UTC:

    hello

    #art, #wip
    ");
}

#[test]
fn test_post_without_tags_keeps_trailing_section() {
    let mut ctx = test_context();
    let post = post_by("alice", WHEN, vec![ContentBlock::Text("hello".into())]);
    let out = render_post(&post, &mut ctx).unwrap();
    assert_eq!(
        out,
        "**ALICE | @alice** said at 2022-04-01 12:00:00 UTC:\n\nhello\n\n"
    );
}

#[test]
fn test_share_tree_order() {
    let mut ctx = test_context();
    let mut post = post_by(
        "carol",
        "2022-04-03T12:00:00.000000+0000",
        vec![ContentBlock::Text("third".into())],
    );
    post.share_tree = vec![
        post_by(
            "alice",
            "2022-04-01T12:00:00.000000+0000",
            vec![ContentBlock::Text("first".into())],
        ),
        post_by(
            "bob",
            "2022-04-02T12:00:00.000000+0000",
            vec![ContentBlock::Text("second".into())],
        ),
    ];

    let out = render_share_tree(&post, &mut ctx).unwrap();
    let expected = [
        "**ALICE | @alice** said at 2022-04-01 12:00:00 UTC:\n\nfirst\n\n",
        "**BOB | @bob** said at 2022-04-02 12:00:00 UTC:\n\nsecond\n\n",
        "**CAROL | @carol** said at 2022-04-03 12:00:00 UTC:\n\nthird\n\n",
    ]
    .join("\n\n");
    assert_eq!(out, expected);
}

#[test]
fn test_share_tree_without_ancestors_is_the_post() {
    let mut ctx = test_context();
    let post = post_by("alice", WHEN, vec![ContentBlock::Text("solo".into())]);
    let tree = render_share_tree(&post, &mut ctx).unwrap();
    let single = render_post(&post, &mut ctx).unwrap();
    assert_eq!(tree, single);
}

#[test]
fn test_bad_timestamp_in_ancestor_fails_the_document() {
    let mut ctx = test_context();
    let mut post = post_by("carol", WHEN, vec![]);
    post.share_tree = vec![post_by("alice", "2022-04-01", vec![])];
    let err = render_share_tree(&post, &mut ctx).unwrap_err();
    assert!(matches!(err, RenderError::Timestamp { .. }));
}

#[test]
fn test_broken_image_fails_the_post() {
    let mut ctx = test_context();
    let block = ContentBlock::Image(Image {
        url: "https://example.com/missing/gone.png".into(),
        alt_text: None,
    });
    let err = render_block(&block, &mut ctx).unwrap_err();
    assert!(matches!(err, RenderError::Image(_)));
}
