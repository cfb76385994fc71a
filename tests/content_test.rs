//! Integration tests for the post repository.
//!
//! These tests verify:
//! - Capacity eviction with the default cap of 50
//! - Audience-restricted visibility on every read path
//! - Like, comment, share, and delete flows

mod helpers;

use agora_core::content::{ContentError, PostDraft};
use agora_core::identity::Role;
use agora_core::identity::{Secret, UserProfile};
use helpers::TestStack;

#[test]
fn fifty_one_posts_keep_the_latest_fifty() {
    let stack = TestStack::open("content_cap");
    let author = stack.sign_up("author");

    let mut ids = Vec::new();
    for i in 0..51 {
        let post = stack
            .content
            .create(PostDraft::new(author.clone(), format!("post {i}")))
            .unwrap();
        ids.push(post.id);
    }

    assert_eq!(stack.content.count().unwrap(), 50);

    // The very first post was evicted; the newest is present.
    assert!(matches!(
        stack.content.get(&ids[0], &author),
        Err(ContentError::NotFound(_))
    ));
    let newest = stack.content.get(&ids[50], &author).unwrap();
    assert_eq!(newest.body, "post 50");

    let feed = stack.content.feed(&author).unwrap();
    assert_eq!(feed.len(), 50);
    assert_eq!(feed[0].body, "post 50");
    assert_eq!(feed[49].body, "post 1");
}

#[test]
fn audience_restriction_applies_to_all_read_paths() {
    let stack = TestStack::open("content_visibility");
    let alice = stack.sign_up("alice");
    let bob = stack.sign_up("bob");
    let carol = stack.sign_up("carol");

    let restricted = stack
        .content
        .create(PostDraft::new(alice.clone(), "for bob only").visible_to([bob.clone()]))
        .unwrap();
    stack
        .content
        .create(PostDraft::new(alice.clone(), "for everyone"))
        .unwrap();

    // get
    assert!(stack.content.get(&restricted.id, &bob).is_ok());
    assert!(stack.content.get(&restricted.id, &alice).is_ok());
    assert!(matches!(
        stack.content.get(&restricted.id, &carol),
        Err(ContentError::NotFound(_))
    ));

    // feed
    assert_eq!(stack.content.feed(&bob).unwrap().len(), 2);
    assert_eq!(stack.content.feed(&carol).unwrap().len(), 1);

    // posts_by
    assert_eq!(stack.content.posts_by(&alice, &bob).unwrap().len(), 2);
    assert_eq!(stack.content.posts_by(&alice, &carol).unwrap().len(), 1);
}

#[test]
fn like_comment_share_flow() {
    let stack = TestStack::open("content_engagement");
    let alice = stack.sign_up("alice");
    let bob = stack.sign_up("bob");

    let post = stack
        .content
        .create(PostDraft::new(alice.clone(), "picture day").with_image("img://1"))
        .unwrap();

    stack.content.like(&post.id, &bob).unwrap();
    stack.content.like(&post.id, &bob).unwrap();
    stack.content.comment(&post.id, &bob, "nice!").unwrap();

    let fetched = stack.content.get(&post.id, &bob).unwrap();
    assert_eq!(fetched.likes.len(), 1);
    assert_eq!(fetched.comments.len(), 1);
    assert_eq!(fetched.comments[0].body, "nice!");

    let share = stack
        .content
        .share(&post.id, &bob, "look at alice's picture", [])
        .unwrap();
    assert_eq!(share.shared_from, Some(post.id.clone()));

    // Sharing the share still points at the original.
    let reshare = stack
        .content
        .share(&share.id, &alice, "full circle", [])
        .unwrap();
    assert_eq!(reshare.shared_from, Some(post.id));
}

#[test]
fn deletion_is_gated_to_author_or_admin() {
    let stack = TestStack::open("content_delete");
    let alice = stack.sign_up("alice");
    let bob = stack.sign_up("bob");
    stack
        .manager
        .sign_up(
            UserProfile::new("root", "Root").with_role(Role::Admin),
            &Secret::new("pw"),
        )
        .unwrap();

    let alice_user = stack.identity.get(&alice).unwrap();
    let bob_user = stack.identity.get(&bob).unwrap();
    let admin_user = stack.identity.get_by_handle("root").unwrap();

    let first = stack
        .content
        .create(PostDraft::new(alice.clone(), "one"))
        .unwrap();
    let second = stack
        .content
        .create(PostDraft::new(alice.clone(), "two"))
        .unwrap();

    assert!(matches!(
        stack.content.delete(&first.id, &bob_user),
        Err(ContentError::Forbidden(_))
    ));

    stack.content.delete(&first.id, &alice_user).unwrap();
    stack.content.delete(&second.id, &admin_user).unwrap();
    assert_eq!(stack.content.count().unwrap(), 0);
}
