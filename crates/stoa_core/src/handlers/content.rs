/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use super::require_recipient;
use crate::document::Document;
use crate::error::{InboxError, StepExt};
use crate::model::{first_non_empty, now_ms, same_actor, OriginLink, PersonLink, ReplySummary, User};
use crate::router::ActivityHandler;
use crate::state::InboxState;
use async_trait::async_trait;
use stoa_protocol::is_ignored_object_type;
use tracing::{debug, info, warn};

/// `Create` and `Update`: upsert the object into the recipient's inbox.
pub struct CreateOrUpdate;

#[async_trait]
impl ActivityHandler for CreateOrUpdate {
    async fn handle(
        &self,
        state: &InboxState,
        recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let user = require_recipient(recipient, document)?;
        let object = document.object().load().await?;
        let object_type = object.type_name();
        if is_ignored_object_type(object_type) {
            debug!(object_type, object = object.id(), "not inbox content");
            return Ok(());
        }

        let object_url = object.id();
        if object_url.is_empty() {
            return Err(InboxError::BadRequest(format!(
                "{} {} carries an object without id",
                document.type_name(),
                document.id()
            )));
        }

        let actor_url = document.actor_id();
        let following = state
            .following
            .load_following_by_url(&user.user_id, actor_url)
            .step(|| format!("load following user={} actor={actor_url}", user.user_id))?
            .ok_or_else(|| {
                InboxError::NotFound(format!(
                    "user {} does not follow {actor_url:?}",
                    user.user_id
                ))
            })?;

        let mut message = state
            .inbox
            .load_or_create_message(&user.user_id, object_url)
            .step(|| format!("load message user={} url={object_url}", user.user_id))?;
        let created = message.is_new();

        message.origin = OriginLink {
            following_id: following.following_id.clone(),
            url: following.profile_url.clone(),
            label: following.label.clone(),
            image_url: following.image_url.clone(),
            method: following.method.as_str().to_string(),
        };
        message.social_role = object_type.to_string();
        message.label = object.name().to_string();
        message.summary = object.summary().to_string();
        message.image_url = object.image_url();
        message.content_html = object.content().to_string();
        message.attributed_to = attributed_to(&object).await;
        message.in_reply_to = match object.in_reply_to() {
            Some(parent) => reply_summary(&parent).await.into_iter().collect(),
            None => Vec::new(),
        };
        message.publish_date_ms = object
            .published()
            .or_else(|| object.updated())
            .unwrap_or_else(now_ms);
        message.folder_id = following.folder_id.clone();

        state
            .inbox
            .save_message(&mut message)
            .step(|| format!("save message user={} url={object_url}", user.user_id))?;
        info!(
            user_id = %user.user_id,
            object = object_url,
            folder_id = %message.folder_id,
            created,
            "message stored"
        );
        Ok(())
    }
}

/// Authors in the order the object lists them. Unresolvable authors keep
/// their bare profile URL.
async fn attributed_to(object: &Document) -> Vec<PersonLink> {
    let mut out = Vec::new();
    for author in object.attributed_to() {
        let url = author.id();
        if url.is_empty() {
            continue;
        }
        let link = match author.load().await {
            Ok(person) => PersonLink {
                profile_url: first_non_empty(&[person.id(), url]).to_string(),
                name: person.name().to_string(),
                image_url: person.icon_url(),
                email: String::new(),
            },
            Err(e) => {
                debug!(author = url, "author not resolved: {e}");
                PersonLink {
                    profile_url: url.to_string(),
                    ..PersonLink::default()
                }
            }
        };
        out.push(link);
    }
    out
}

/// One level up the thread. Nothing when the parent cannot be loaded.
async fn reply_summary(parent: &Document) -> Option<ReplySummary> {
    match parent.load().await {
        Ok(p) => {
            let author = p
                .attributed_to()
                .first()
                .map(|a| first_non_empty(&[a.name(), a.id()]).to_string())
                .unwrap_or_default();
            Some(ReplySummary {
                url: first_non_empty(&[p.id(), parent.id()]).to_string(),
                label: p.name().to_string(),
                summary: p.summary().to_string(),
                author,
            })
        }
        Err(e) => {
            warn!(parent = parent.id(), "reply parent not resolved: {e}");
            None
        }
    }
}

/// `Delete` of inbox content.
pub struct DeleteContent;

#[async_trait]
impl ActivityHandler for DeleteContent {
    async fn handle(
        &self,
        state: &InboxState,
        recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let user = require_recipient(recipient, document)?;
        let object = document.object();
        let object_type = object.type_name();
        if is_ignored_object_type(object_type) {
            debug!(object_type, object = object.id(), "not inbox content");
            return Ok(());
        }

        let object_url = object.id();
        if object_url.is_empty() {
            return Err(InboxError::BadRequest(format!(
                "delete {} has no object",
                document.id()
            )));
        }

        let Some(message) = state
            .inbox
            .load_message_by_url(&user.user_id, object_url)
            .step(|| format!("load message user={} url={object_url}", user.user_id))?
        else {
            debug!(user_id = %user.user_id, object = object_url, "nothing to delete");
            return Ok(());
        };

        let actor_url = document.actor_id();
        if state.cfg.verify_delete_origin && !same_actor(actor_url, &message.origin.url) {
            return Err(InboxError::Forbidden(format!(
                "{actor_url:?} cannot delete {object_url} from {}",
                message.origin.url
            )));
        }

        state
            .inbox
            .delete_message(&message)
            .step(|| format!("delete message {}", message.message_id))?;
        info!(user_id = %user.user_id, object = object_url, "message deleted");
        Ok(())
    }
}
