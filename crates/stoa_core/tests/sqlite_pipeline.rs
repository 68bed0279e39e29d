/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use serde_json::{json, Value};
use std::sync::Arc;
use stoa_core::document::{Document, MemoryResolver};
use stoa_core::model::{new_record_id, Following, FollowingState, User};
use stoa_core::queue::ChannelQueue;
use stoa_core::sqlite::InboxDb;
use stoa_core::store::{FollowingStore, InboxStore};
use stoa_core::{build_router, InboxConfig, InboxError, InboxState, Router};

const ALICE: &str = "https://remote.example/users/alice";
const NOTE: &str = "https://remote.example/notes/7";

async fn deliver(
    router: &Router,
    state: &InboxState,
    resolver: &Arc<MemoryResolver>,
    value: Value,
    recipient: Option<&User>,
) -> Result<(), InboxError> {
    let doc = Document::new(value, resolver.clone());
    router.handle(state, recipient, &doc).await
}

#[tokio::test]
async fn pipeline_persists_through_sqlite() {
    let path = std::env::temp_dir()
        .join(format!("stoa-it-{}", new_record_id()))
        .join("inbox.sqlite");
    let db = Arc::new(InboxDb::open(&path).unwrap());
    let bob = User {
        user_id: "bob".to_string(),
        username: "bob".to_string(),
        display_name: "Bob".to_string(),
        icon_url: String::new(),
    };
    db.upsert_user(&bob).unwrap();

    let resolver = Arc::new(MemoryResolver::new());
    resolver.insert(json!({"id": ALICE, "type": "Person", "name": "Alice"}));

    let (queue, mut outbound) = ChannelQueue::new();
    let state = InboxState::with_store(InboxConfig::new("https://local.example"), db.clone(), Arc::new(queue));
    let router = build_router();
    deliver(
        &router,
        &state,
        &resolver,
        json!({"id": "https://remote.example/follows/7", "type": "Follow", "actor": ALICE, "object": "https://local.example/@bob"}),
        None,
    )
    .await
    .unwrap();
    assert_eq!(db.count_followers("bob").unwrap(), 1);
    assert!(outbound.try_recv().is_ok());

    let mut following = Following::new("bob", "", ALICE);
    following.folder_id = "news".to_string();
    db.save_following(&mut following).unwrap();
    let follow_url = state.urls.following_url("bob", &following.following_id);
    deliver(&router, &state, &resolver, json!({"type": "Accept", "actor": ALICE, "object": follow_url}), None)
        .await
        .unwrap();
    let stored = db
        .load_following_by_id("bob", &following.following_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, FollowingState::Success);
    assert_eq!(stored.label, "Alice");

    let create = json!({
        "type": "Create",
        "actor": ALICE,
        "object": {"id": NOTE, "type": "Article", "name": "Title", "content": "<p>body</p>"}
    });
    deliver(&router, &state, &resolver, create.clone(), Some(&bob)).await.unwrap();
    deliver(&router, &state, &resolver, create, Some(&bob)).await.unwrap();
    deliver(&router, &state, &resolver, json!({"id": "https://remote.example/likes/7", "type": "Like", "actor": ALICE, "object": NOTE}), Some(&bob))
        .await
        .unwrap();
    assert_eq!(db.count_messages("bob").unwrap(), 1);
    let message = db.load_message_by_url("bob", NOTE).unwrap().unwrap();
    assert_eq!(message.label, "Title");
    assert_eq!(message.folder_id, "news");
    assert_eq!(message.responses.like_count, 1);

    deliver(&router, &state, &resolver, json!({"type": "Delete", "actor": ALICE, "object": NOTE}), Some(&bob))
        .await
        .unwrap();
    assert_eq!(db.count_messages("bob").unwrap(), 0);

    deliver(
        &router,
        &state,
        &resolver,
        json!({
            "type": "Undo",
            "actor": ALICE,
            "object": {"type": "Follow", "actor": ALICE, "object": "https://local.example/@bob"}
        }),
        None,
    )
    .await
    .unwrap();
    assert_eq!(db.count_followers("bob").unwrap(), 0);
}
