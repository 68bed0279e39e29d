/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::require_recipient;
use crate::document::Document;
use crate::error::{InboxError, StepExt};
use crate::model::{first_non_empty, same_actor, User};
use crate::router::ActivityHandler;
use crate::state::InboxState;
use async_trait::async_trait;
use stoa_protocol::activity;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// The inbox message for the object now has this many reactions of the kind.
    Counted(u64),
    /// No local message for the object. Creating one from the reacted-to
    /// object is not implemented.
    NotYetSupported,
}

/// Bumps the denormalized counter on the message for `object_url`.
/// Repeated deliveries count again; there is no dedup by activity id.
pub fn record_reaction(
    state: &InboxState,
    user: &User,
    kind: &str,
    object_url: &str,
) -> Result<ReactionOutcome, InboxError> {
    let Some(mut message) = state
        .inbox
        .load_message_by_url(&user.user_id, object_url)
        .step(|| format!("load message user={} url={object_url}", user.user_id))?
    else {
        return Ok(ReactionOutcome::NotYetSupported);
    };

    let count = if kind == activity::DISLIKE {
        message.responses.dislike_count += 1;
        message.responses.dislike_count
    } else {
        message.responses.like_count += 1;
        message.responses.like_count
    };
    state
        .inbox
        .save_message(&mut message)
        .step(|| format!("save message {}", message.message_id))?;
    Ok(ReactionOutcome::Counted(count))
}

/// `Like`, `Dislike` and `Announce` of content in the recipient's inbox.
pub struct ReceiveReaction;

#[async_trait]
impl ActivityHandler for ReceiveReaction {
    async fn handle(
        &self,
        state: &InboxState,
        recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let kind = document.type_name();
        if document.id().is_empty() {
            return Err(InboxError::BadRequest(format!("{kind} without id")));
        }
        let user = require_recipient(recipient, document)?;

        // Loading only warms whatever cache sits behind the resolver.
        let object = document.object();
        let loaded_id = match object.load().await {
            Ok(loaded) => loaded.id().to_string(),
            Err(e) => {
                warn!(object = object.id(), "{kind} target not resolved: {e}");
                String::new()
            }
        };
        let object_url = first_non_empty(&[object.id(), loaded_id.as_str()]);
        if object_url.is_empty() {
            return Err(InboxError::BadRequest(format!(
                "{kind} {} has no object",
                document.id()
            )));
        }

        match record_reaction(state, user, kind, object_url)? {
            ReactionOutcome::Counted(count) => {
                info!(user_id = %user.user_id, object = object_url, kind, count, "reaction counted");
            }
            ReactionOutcome::NotYetSupported => {
                debug!(user_id = %user.user_id, object = object_url, kind, "reaction on unknown object");
            }
        }
        Ok(())
    }
}

/// `Undo` or `Delete` of a `Like`, `Dislike` or `Announce`. Local only.
pub struct UndoReaction;

#[async_trait]
impl ActivityHandler for UndoReaction {
    async fn handle(
        &self,
        state: &InboxState,
        _recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let original = document.object().load().await?;
        let actor_url = original.actor_id();
        let object_url = original.object_id();
        let kind = original.type_name();

        let responses = state
            .responses
            .load_responses_by_actor_and_object(actor_url, object_url)
            .step(|| format!("load responses actor={actor_url} object={object_url}"))?;
        let Some(first) = responses.first() else {
            return Err(InboxError::NotFound(format!(
                "response of {actor_url:?} to {object_url:?}"
            )));
        };

        if !same_actor(document.actor_id(), &first.actor) {
            return Err(InboxError::Forbidden(format!(
                "{:?} cannot undo a response by {}",
                document.actor_id(),
                first.actor
            )));
        }

        let Some(response) = responses.iter().find(|r| r.kind == kind) else {
            return Err(InboxError::BadRequest(format!(
                "undo names {kind:?} but {actor_url} left {}",
                responses
                    .iter()
                    .map(|r| r.kind.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        };

        state
            .responses
            .delete_response(response)
            .step(|| format!("delete response {}", response.response_id))?;
        info!(actor = actor_url, object = object_url, kind, "response removed");
        Ok(())
    }
}
