mod common;

use huddle::authz::membership;
use huddle::services::channel::{self, ChannelRequest};
use huddle::services::member::{self, UpdateMemberRequest};
use huddle::services::message::{self, MessageRequest};
use huddle::services::server::{self, ServerRequest};
use huddle::utils::error::{AppError, Conflict, Denial};

use common::{count, create_user, test_state};

fn named(name: &str) -> ServerRequest {
    ServerRequest {
        name: Some(name.to_string()),
    }
}

fn channel_named(name: &str) -> ChannelRequest {
    ChannelRequest {
        name: Some(name.to_string()),
    }
}

fn text(content: &str) -> MessageRequest {
    MessageRequest {
        title: None,
        content: Some(content.to_string()),
    }
}

fn assert_denied<T: std::fmt::Debug>(result: Result<T, AppError>, expected: Denial) {
    match result {
        Err(AppError::Forbidden(denial)) => assert_eq!(denial, expected),
        other => panic!("expected Forbidden({expected:?}), got {other:?}"),
    }
}

fn assert_not_found<T: std::fmt::Debug>(result: Result<T, AppError>) {
    assert!(
        matches!(result, Err(AppError::NotFound(_))),
        "expected NotFound, got {result:?}"
    );
}

#[tokio::test]
async fn creating_a_server_makes_the_creator_its_only_admin_member() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;

    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();

    let members = member::list_members(&state.db, &alice.id, &created.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].member.user_id, alice.id);
    assert!(members[0].member.is_admin);
    assert_eq!(members[0].username, "alice");

    let mut conn = state.db.acquire().await.unwrap();
    assert!(membership::is_member(&mut conn, &alice.id, &created.id).await.unwrap());
    assert!(membership::is_admin(&mut conn, &alice.id, &created.id).await.unwrap());
    assert!(membership::is_creator(&mut conn, &alice.id, &created.id).await.unwrap());
}

#[tokio::test]
async fn membership_follows_the_member_record() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let bob = create_user(&state.db, "bob").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();

    {
        let mut conn = state.db.acquire().await.unwrap();
        assert!(!membership::is_member(&mut conn, &bob.id, &created.id).await.unwrap());
        assert!(!membership::is_creator(&mut conn, &bob.id, &created.id).await.unwrap());
        assert!(!membership::is_creator(&mut conn, &alice.id, "missing").await.unwrap());
    }

    let joined = member::join_server(&state.db, &bob.id, &created.id)
        .await
        .unwrap();
    assert!(!joined.is_admin);

    {
        let mut conn = state.db.acquire().await.unwrap();
        assert!(membership::is_member(&mut conn, &bob.id, &created.id).await.unwrap());
        assert!(!membership::is_admin(&mut conn, &bob.id, &created.id).await.unwrap());
    }

    member::leave_server(&state.db, &bob.id, &created.id)
        .await
        .unwrap();

    let mut conn = state.db.acquire().await.unwrap();
    assert!(!membership::is_member(&mut conn, &bob.id, &created.id).await.unwrap());
}

#[tokio::test]
async fn joining_twice_is_a_conflict_and_adds_no_row() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let bob = create_user(&state.db, "bob").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();

    member::join_server(&state.db, &bob.id, &created.id)
        .await
        .unwrap();
    let before = count(&state.db, "server_members").await;

    let again = member::join_server(&state.db, &bob.id, &created.id).await;
    assert!(matches!(
        again,
        Err(AppError::Conflict(Conflict::AlreadyMember))
    ));

    let added = member::add_member(&state.db, &alice.id, &created.id, &bob.id).await;
    assert!(matches!(
        added,
        Err(AppError::Conflict(Conflict::AlreadyMember))
    ));

    assert_eq!(count(&state.db, "server_members").await, before);
}

#[tokio::test]
async fn non_members_are_forbidden_whether_or_not_the_child_exists() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let mallory = create_user(&state.db, "mallory").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();
    let general = channel::create_channel(&state.db, &alice.id, &created.id, channel_named("general"))
        .await
        .unwrap();
    let members = member::list_members(&state.db, &alice.id, &created.id)
        .await
        .unwrap();

    assert_denied(
        server::get_server(&state.db, &mallory.id, &created.id).await,
        Denial::NotMember,
    );
    assert_denied(
        channel::list_channels(&state.db, &mallory.id, &created.id).await,
        Denial::NotMember,
    );
    assert_denied(
        channel::get_channel(&state.db, &mallory.id, &created.id, &general.id).await,
        Denial::NotMember,
    );
    assert_denied(
        channel::get_channel(&state.db, &mallory.id, &created.id, "no-such-channel").await,
        Denial::NotMember,
    );
    assert_denied(
        member::get_member(&state.db, &mallory.id, &created.id, &members[0].member.id).await,
        Denial::NotMember,
    );
    assert_denied(
        member::get_member(&state.db, &mallory.id, &created.id, "no-such-member").await,
        Denial::NotMember,
    );
    assert_denied(
        message::list_channel_messages(&state.db, &mallory.id, &created.id, &general.id).await,
        Denial::NotMember,
    );
    assert_denied(
        message::post_channel_message(&state.db, &mallory.id, &created.id, &general.id, text("hi"))
            .await,
        Denial::NotMember,
    );
}

#[tokio::test]
async fn missing_server_is_not_found_before_membership() {
    let state = test_state().await;
    let mallory = create_user(&state.db, "mallory").await;

    assert_not_found(server::get_server(&state.db, &mallory.id, "no-such-server").await);
    assert_not_found(member::join_server(&state.db, &mallory.id, "no-such-server").await);
}

#[tokio::test]
async fn children_are_only_reachable_through_their_own_server() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let first = server::create_server(&state.db, &alice.id, named("first"))
        .await
        .unwrap();
    let second = server::create_server(&state.db, &alice.id, named("second"))
        .await
        .unwrap();
    let elsewhere = channel::create_channel(&state.db, &alice.id, &second.id, channel_named("other"))
        .await
        .unwrap();
    let posted = message::post_channel_message(&state.db, &alice.id, &second.id, &elsewhere.id, text("hi"))
        .await
        .unwrap();
    let second_members = member::list_members(&state.db, &alice.id, &second.id)
        .await
        .unwrap();

    assert_not_found(channel::get_channel(&state.db, &alice.id, &first.id, &elsewhere.id).await);
    assert_not_found(
        channel::update_channel(
            &state.db,
            &alice.id,
            &first.id,
            &elsewhere.id,
            channel_named("renamed"),
        )
        .await,
    );
    assert_not_found(
        member::get_member(&state.db, &alice.id, &first.id, &second_members[0].member.id).await,
    );

    let home = channel::create_channel(&state.db, &alice.id, &first.id, channel_named("home"))
        .await
        .unwrap();
    assert_not_found(
        message::get_channel_message(&state.db, &alice.id, &first.id, &home.id, &posted.id).await,
    );
    assert_not_found(
        message::delete_channel_message(&state.db, &alice.id, &first.id, &home.id, &posted.id)
            .await,
    );
}

#[tokio::test]
async fn plain_members_manage_nothing_until_promoted() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let bob = create_user(&state.db, "bob").await;
    let carol = create_user(&state.db, "carol").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();
    let bob_member = member::join_server(&state.db, &bob.id, &created.id)
        .await
        .unwrap();
    let carol_member = member::join_server(&state.db, &carol.id, &created.id)
        .await
        .unwrap();
    let general = channel::create_channel(&state.db, &alice.id, &created.id, channel_named("general"))
        .await
        .unwrap();

    assert_denied(
        channel::update_channel(&state.db, &bob.id, &created.id, &general.id, channel_named("x"))
            .await,
        Denial::NotAdmin,
    );
    assert_denied(
        channel::delete_channel(&state.db, &bob.id, &created.id, &general.id).await,
        Denial::NotAdmin,
    );
    assert_denied(
        member::remove_member(&state.db, &bob.id, &created.id, &carol_member.id).await,
        Denial::NotAdmin,
    );
    assert_denied(
        member::add_member(&state.db, &bob.id, &created.id, &alice.id).await,
        Denial::NotAdmin,
    );

    let promoted = member::update_member(
        &state.db,
        &alice.id,
        &created.id,
        &bob_member.id,
        UpdateMemberRequest {
            is_admin: Some(true),
        },
    )
    .await
    .unwrap();
    assert!(promoted.is_admin);

    let renamed = channel::update_channel(
        &state.db,
        &bob.id,
        &created.id,
        &general.id,
        channel_named("lobby"),
    )
    .await
    .unwrap();
    assert_eq!(renamed.name, "lobby");

    member::remove_member(&state.db, &bob.id, &created.id, &carol_member.id)
        .await
        .unwrap();
    channel::delete_channel(&state.db, &bob.id, &created.id, &general.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn any_member_can_open_a_channel() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let bob = create_user(&state.db, "bob").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();
    member::join_server(&state.db, &bob.id, &created.id)
        .await
        .unwrap();

    let opened = channel::create_channel(&state.db, &bob.id, &created.id, channel_named("bobs"))
        .await
        .unwrap();
    assert_eq!(opened.creator_id, bob.id);
    assert_eq!(opened.server_id, created.id);
}

#[tokio::test]
async fn the_creator_can_be_neither_demoted_nor_removed() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let bob = create_user(&state.db, "bob").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();
    let bob_member = member::join_server(&state.db, &bob.id, &created.id)
        .await
        .unwrap();
    member::update_member(
        &state.db,
        &alice.id,
        &created.id,
        &bob_member.id,
        UpdateMemberRequest {
            is_admin: Some(true),
        },
    )
    .await
    .unwrap();

    let members = member::list_members(&state.db, &alice.id, &created.id)
        .await
        .unwrap();
    let creator_record = members
        .iter()
        .find(|m| m.member.user_id == alice.id)
        .unwrap()
        .member
        .clone();

    assert_denied(
        member::update_member(
            &state.db,
            &bob.id,
            &created.id,
            &creator_record.id,
            UpdateMemberRequest {
                is_admin: Some(false),
            },
        )
        .await,
        Denial::CreatorProtected,
    );
    assert_denied(
        member::remove_member(&state.db, &bob.id, &created.id, &creator_record.id).await,
        Denial::CreatorProtected,
    );
    assert_denied(
        member::remove_member(&state.db, &alice.id, &created.id, &creator_record.id).await,
        Denial::CreatorProtected,
    );
    assert_denied(
        member::leave_server(&state.db, &alice.id, &created.id).await,
        Denial::CreatorProtected,
    );

    let still_there = member::get_member(&state.db, &alice.id, &created.id, &creator_record.id)
        .await
        .unwrap();
    assert!(still_there.is_admin);
}

#[tokio::test]
async fn the_guarded_write_refuses_the_creator_record_on_its_own() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();
    let members = member::list_members(&state.db, &alice.id, &created.id)
        .await
        .unwrap();
    let creator_record = members[0].member.clone();

    let mut tx = state.db.begin().await.unwrap();
    let demoted = huddle::authz::cascade::set_member_admin(&mut tx, &creator_record, false).await;
    assert!(matches!(
        demoted,
        Err(AppError::Forbidden(Denial::CreatorProtected))
    ));
    let removed = huddle::authz::cascade::remove_member(&mut tx, &creator_record).await;
    assert!(matches!(
        removed,
        Err(AppError::Forbidden(Denial::CreatorProtected))
    ));
    tx.rollback().await.unwrap();

    assert_eq!(count(&state.db, "server_members").await, 1);
}

#[tokio::test]
async fn only_the_creator_manages_the_server_itself() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let bob = create_user(&state.db, "bob").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();
    let bob_member = member::join_server(&state.db, &bob.id, &created.id)
        .await
        .unwrap();
    member::update_member(
        &state.db,
        &alice.id,
        &created.id,
        &bob_member.id,
        UpdateMemberRequest {
            is_admin: Some(true),
        },
    )
    .await
    .unwrap();

    assert_denied(
        server::update_server(&state.db, &bob.id, &created.id, named("mine")).await,
        Denial::NotCreator,
    );
    assert_denied(
        server::delete_server(&state.db, &bob.id, &created.id).await,
        Denial::NotCreator,
    );

    let renamed = server::update_server(&state.db, &alice.id, &created.id, named("renamed"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "renamed");
}

#[tokio::test]
async fn only_the_sender_edits_or_deletes_a_message() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let bob = create_user(&state.db, "bob").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();
    member::join_server(&state.db, &bob.id, &created.id)
        .await
        .unwrap();
    let general = channel::create_channel(&state.db, &alice.id, &created.id, channel_named("general"))
        .await
        .unwrap();
    let posted = message::post_channel_message(&state.db, &bob.id, &created.id, &general.id, text("hello"))
        .await
        .unwrap();

    let edit = || MessageRequest {
        title: None,
        content: Some("edited".to_string()),
    };

    assert_denied(
        message::update_channel_message(
            &state.db,
            &alice.id,
            &created.id,
            &general.id,
            &posted.id,
            edit(),
        )
        .await,
        Denial::NotSender,
    );
    assert_denied(
        message::delete_message(&state.db, &alice.id, &posted.id).await,
        Denial::NotSender,
    );

    let edited = message::update_message(&state.db, &bob.id, &posted.id, edit())
        .await
        .unwrap();
    assert_eq!(edited.content, "edited");
    assert!(edited.edited_at.is_some());

    message::delete_channel_message(&state.db, &bob.id, &created.id, &general.id, &posted.id)
        .await
        .unwrap();
    assert_eq!(count(&state.db, "messages").await, 0);
}

#[tokio::test]
async fn an_edit_with_no_fields_is_rejected_and_leaves_the_message_untouched() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let created = server::create_server(&state.db, &alice.id, named("guild"))
        .await
        .unwrap();
    let general = channel::create_channel(&state.db, &alice.id, &created.id, channel_named("general"))
        .await
        .unwrap();
    let posted = message::post_channel_message(&state.db, &alice.id, &created.id, &general.id, text("hello"))
        .await
        .unwrap();

    let empty = message::update_message(&state.db, &alice.id, &posted.id, MessageRequest::default()).await;
    assert!(matches!(empty, Err(AppError::Validation(_))), "got {empty:?}");

    let empty = message::update_channel_message(
        &state.db,
        &alice.id,
        &created.id,
        &general.id,
        &posted.id,
        MessageRequest::default(),
    )
    .await;
    assert!(matches!(empty, Err(AppError::Validation(_))), "got {empty:?}");

    let mut conn = state.db.acquire().await.unwrap();
    let stored = huddle::authz::guards::find_message(&mut conn, &posted.id)
        .await
        .unwrap();
    assert_eq!(stored.content, "hello");
    assert_eq!(stored.edited_at, None);
}

#[tokio::test]
async fn direct_messages_reach_only_their_receiver() {
    let state = test_state().await;
    let alice = create_user(&state.db, "alice").await;
    let bob = create_user(&state.db, "bob").await;

    let sent = message::send_direct_message(&state.db, &alice.id, &bob.id, text("psst"))
        .await
        .unwrap();
    assert_eq!(sent.receiver_id.as_deref(), Some(bob.id.as_str()));
    assert_eq!(sent.channel_id, None);

    let inbox = message::list_received_messages(&state.db, &bob.id)
        .await
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].sender_username, "alice");
    assert!(message::list_received_messages(&state.db, &alice.id)
        .await
        .unwrap()
        .is_empty());

    let titled = message::send_direct_message(
        &state.db,
        &alice.id,
        &bob.id,
        MessageRequest {
            title: Some("subject".to_string()),
            content: Some("psst".to_string()),
        },
    )
    .await;
    assert!(matches!(titled, Err(AppError::Validation(_))));

    assert_not_found(message::send_direct_message(&state.db, &alice.id, "nobody", text("hi")).await);
}

/// A creates S, B joins, A adds C, B posts M, B cannot delete C, A can (M
/// goes with it), and A cannot remove their own member record.
#[tokio::test]
async fn server_lifecycle_walkthrough() {
    let state = test_state().await;
    let a = create_user(&state.db, "a").await;
    let b = create_user(&state.db, "b").await;

    let s = server::create_server(&state.db, &a.id, named("S")).await.unwrap();
    let b_member = member::join_server(&state.db, &b.id, &s.id).await.unwrap();
    assert!(!b_member.is_admin);

    let c = channel::create_channel(&state.db, &a.id, &s.id, channel_named("C"))
        .await
        .unwrap();
    let m = message::post_channel_message(&state.db, &b.id, &s.id, &c.id, text("M"))
        .await
        .unwrap();

    assert_denied(
        channel::delete_channel(&state.db, &b.id, &s.id, &c.id).await,
        Denial::NotAdmin,
    );

    channel::delete_channel(&state.db, &a.id, &s.id, &c.id)
        .await
        .unwrap();
    let mut conn = state.db.acquire().await.unwrap();
    assert_not_found(huddle::authz::guards::find_message(&mut conn, &m.id).await);
    drop(conn);

    let a_record = member::list_members(&state.db, &a.id, &s.id)
        .await
        .unwrap()
        .into_iter()
        .find(|record| record.member.user_id == a.id)
        .unwrap();
    assert_denied(
        member::remove_member(&state.db, &a.id, &s.id, &a_record.member.id).await,
        Denial::CreatorProtected,
    );
}
