/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

mod content;
mod follow;
mod reactions;

pub use content::{CreateOrUpdate, DeleteContent};
pub use follow::{AcceptFollow, ReceiveFollow, RejectFollow, UndoFollow};
pub use reactions::{record_reaction, ReactionOutcome, ReceiveReaction, UndoReaction};

use crate::document::Document;
use crate::error::InboxError;
use crate::model::User;
use crate::router::{ActivityHandler, Router};
use crate::state::InboxState;
use async_trait::async_trait;
use stoa_protocol::{activity, ANY};
use tracing::debug;

/// The complete inbox routing table.
pub fn build_router() -> Router {
    let mut router = Router::new();

    router
        .add(activity::FOLLOW, ANY, ReceiveFollow)
        .add(activity::ACCEPT, activity::FOLLOW, AcceptFollow)
        .add(activity::ACCEPT, ANY, AcceptFollow)
        .add(activity::REJECT, activity::FOLLOW, RejectFollow)
        .add(activity::REJECT, ANY, RejectFollow)
        .add(activity::UNDO, activity::FOLLOW, UndoFollow)
        .add(activity::DELETE, activity::FOLLOW, UndoFollow)
        .add(activity::UNDO, ANY, UndoOther);

    router
        .add(activity::CREATE, ANY, CreateOrUpdate)
        .add(activity::UPDATE, ANY, CreateOrUpdate)
        .add(activity::DELETE, ANY, DeleteContent);

    for reaction in [activity::LIKE, activity::DISLIKE, activity::ANNOUNCE] {
        router
            .add(reaction, ANY, ReceiveReaction)
            .add(activity::UNDO, reaction, UndoReaction)
            .add(activity::DELETE, reaction, UndoReaction);
    }

    router.add(ANY, ANY, Ignore);
    router
}

/// `Undo` of something without a more specific route. The undone activity
/// must still load: a reference that cannot be dereferenced may be a follow
/// or reaction, so the failure goes back to the sender for redelivery.
pub struct UndoOther;

#[async_trait]
impl ActivityHandler for UndoOther {
    async fn handle(
        &self,
        _state: &InboxState,
        _recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let object = document.object();
        if object.is_empty() {
            return Err(InboxError::BadRequest(format!(
                "undo {} has no object",
                document.id()
            )));
        }
        let original = object.load().await?;
        debug!(
            activity = document.id(),
            undone_type = original.type_name(),
            "nothing to undo"
        );
        Ok(())
    }
}

/// Accepts anything no other route claims.
pub struct Ignore;

#[async_trait]
impl ActivityHandler for Ignore {
    async fn handle(
        &self,
        _state: &InboxState,
        _recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        debug!(
            activity_type = document.type_name(),
            activity = document.id(),
            "ignoring activity"
        );
        Ok(())
    }
}

fn require_recipient<'a>(recipient: Option<&'a User>, document: &Document) -> Result<&'a User, InboxError> {
    recipient.ok_or_else(|| {
        InboxError::BadRequest(format!(
            "{} {} delivered without a local recipient",
            document.type_name(),
            document.id()
        ))
    })
}
