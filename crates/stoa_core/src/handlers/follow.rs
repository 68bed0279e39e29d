/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

//! Follow handshake: remote actors following local users, and remote
//! servers answering the follows local users sent out.

use crate::document::Document;
use crate::error::{InboxError, StepExt};
use crate::model::{first_non_empty, same_actor, Following, FollowingState, PersonLink, User};
use crate::queue::OutboundTask;
use crate::router::ActivityHandler;
use crate::state::InboxState;
use async_trait::async_trait;
use stoa_protocol::{activity, AcceptActivity};
use tracing::{debug, info, warn};

/// `Follow`: a remote actor subscribes to a local user.
pub struct ReceiveFollow;

#[async_trait]
impl ActivityHandler for ReceiveFollow {
    async fn handle(
        &self,
        state: &InboxState,
        _recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let object_url = document.object_id();
        let user = state
            .user_by_profile_url(object_url)?
            .ok_or_else(|| InboxError::NotFound(format!("local user {object_url:?}")))?;

        let actor_url = document.actor_id();
        if actor_url.is_empty() {
            return Err(InboxError::BadRequest(format!(
                "follow {} has no actor",
                document.id()
            )));
        }

        let allowed = state
            .policy
            .allow_follow(&user, actor_url)
            .step(|| format!("follow policy user={} actor={actor_url}", user.user_id))?;
        if !allowed {
            return Err(InboxError::Forbidden(format!(
                "{actor_url} may not follow {}",
                user.user_id
            )));
        }

        let actor = document.actor().load().await?;
        let link = PersonLink {
            profile_url: actor_url.to_string(),
            name: actor.name().to_string(),
            image_url: actor.icon_url(),
            email: String::new(),
        };
        let follower = state
            .followers
            .new_activitypub_follower(&user, link)
            .step(|| format!("save follower user={} actor={actor_url}", user.user_id))?;
        info!(
            user_id = %user.user_id,
            actor = actor_url,
            follower_id = %follower.follower_id,
            "follower active"
        );

        // The follower stays even if the accept cannot be queued; the remote
        // side redelivers the follow.
        if let Err(e) = send_accept(state, &user, actor_url, document) {
            warn!(user_id = %user.user_id, actor = actor_url, "accept not queued: {e}");
        }
        Ok(())
    }
}

fn send_accept(
    state: &InboxState,
    user: &User,
    actor_url: &str,
    follow: &Document,
) -> Result<(), InboxError> {
    let actor = state.activitypub_actor(&user.user_id)?;
    let accept = AcceptActivity::new(
        state.urls.new_activity_id(&actor.id),
        actor.id.clone(),
        follow.value().clone(),
        vec![actor_url.to_string()],
    );
    let accept_id = accept.id.clone();
    state
        .queue
        .run(OutboundTask::SendAccept {
            actor,
            recipient: actor_url.to_string(),
            activity: accept,
        })
        .step(|| format!("queue accept of {}", follow.id()))?;
    debug!(accept = %accept_id, follow = follow.id(), "accept queued");
    Ok(())
}

/// The local `Following` a remote answer refers to, once the answering
/// actor is proven to be the one that was followed.
///
/// `Ok(None)` means the object is not a follow this server sent, and the
/// answer was about something else entirely.
fn answered_following(
    state: &InboxState,
    document: &Document,
) -> Result<Option<Following>, InboxError> {
    let follow = document.object();
    let follow_url = follow.id();
    let Some((user_id, following_id)) = state.urls.parse_following_url(follow_url) else {
        if follow.type_name() == activity::FOLLOW {
            return Err(InboxError::BadRequest(format!(
                "{} refers to a follow this server did not send: {follow_url:?}",
                document.type_name()
            )));
        }
        return Ok(None);
    };

    let following = state
        .following
        .load_following_by_id(&user_id, &following_id)
        .step(|| format!("load following user={user_id} following={following_id}"))?
        .ok_or_else(|| {
            InboxError::NotFound(format!("following {following_id} of user {user_id}"))
        })?;

    let actor_url = document.actor_id();
    if !same_actor(actor_url, &following.profile_url) {
        return Err(InboxError::Forbidden(format!(
            "{actor_url:?} cannot answer a follow of {}",
            following.profile_url
        )));
    }
    Ok(Some(following))
}

/// `Accept` of a `Follow` a local user sent.
pub struct AcceptFollow;

#[async_trait]
impl ActivityHandler for AcceptFollow {
    async fn handle(
        &self,
        state: &InboxState,
        _recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let Some(mut following) = answered_following(state, document)? else {
            debug!(activity = document.id(), "accept of something other than a follow");
            return Ok(());
        };

        match document.actor().load().await {
            Ok(actor) => {
                let icon_url = actor.icon_url();
                let label = first_non_empty(&[actor.name(), following.label.as_str()]).to_string();
                let image_url =
                    first_non_empty(&[icon_url.as_str(), following.image_url.as_str()]).to_string();
                following.label = label;
                following.image_url = image_url;
            }
            Err(e) => {
                warn!(actor = %following.profile_url, "keeping cached profile: {e}");
            }
        }
        following.secret.clear();
        state
            .following
            .set_following_status(&mut following, FollowingState::Success, "Accepted by remote server")
            .step(|| format!("save following {}", following.following_id))?;
        info!(
            user_id = %following.user_id,
            following_id = %following.following_id,
            actor = %following.profile_url,
            "following accepted"
        );
        Ok(())
    }
}

/// `Reject` of a `Follow` a local user sent.
pub struct RejectFollow;

#[async_trait]
impl ActivityHandler for RejectFollow {
    async fn handle(
        &self,
        state: &InboxState,
        _recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let Some(mut following) = answered_following(state, document)? else {
            debug!(activity = document.id(), "reject of something other than a follow");
            return Ok(());
        };
        following.secret.clear();
        state
            .following
            .set_following_status(&mut following, FollowingState::Failure, "Rejected by remote server")
            .step(|| format!("save following {}", following.following_id))?;
        info!(
            user_id = %following.user_id,
            following_id = %following.following_id,
            actor = %following.profile_url,
            "following rejected"
        );
        Ok(())
    }
}

/// `Undo` or `Delete` of a `Follow`: the remote actor unsubscribes.
pub struct UndoFollow;

#[async_trait]
impl ActivityHandler for UndoFollow {
    async fn handle(
        &self,
        state: &InboxState,
        _recipient: Option<&User>,
        document: &Document,
    ) -> Result<(), InboxError> {
        let follow = document.object().load().await?;
        let actor_url = follow.actor_id();
        let user_url = follow.object_id();

        if !same_actor(document.actor_id(), actor_url) {
            return Err(InboxError::Forbidden(format!(
                "{:?} cannot undo a follow by {actor_url:?}",
                document.actor_id()
            )));
        }

        let user_id = state
            .urls
            .parse_profile_url(user_url)
            .ok_or_else(|| InboxError::NotFound(format!("local user {user_url:?}")))?;

        let Some(follower) = state
            .followers
            .load_activitypub_follower(&user_id, actor_url)
            .step(|| format!("load follower user={user_id} actor={actor_url}"))?
        else {
            debug!(user_id = %user_id, actor = actor_url, "follower already gone");
            return Ok(());
        };

        state
            .followers
            .delete_follower(&follower)
            .step(|| format!("delete follower {}", follower.follower_id))?;
        info!(user_id = %user_id, actor = actor_url, "follower removed");
        Ok(())
    }
}
