/*
 * SPDX-FileCopyrightText: 2026 RedHunt07 - FEDI3 Project
 * SPDX-License-Identifier: AGPL-3.0-only
 */

use crate::model::{
    now_ms, FollowMethod, Follower, FollowerState, Following, FollowingState, Message, OriginLink,
    PersonLink, Response, ResponseCounts, User,
};
use crate::store::{
    ensure_id, FollowerStore, FollowingStore, InboxStore, ResponseStore, UserDirectory,
};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

#[derive(Clone)]
pub struct InboxDb {
    path: PathBuf,
}

impl InboxDb {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create db dir: {}", dir.display()))?;
        }
        let conn = Connection::open(&path).with_context(|| format!("open db: {}", path.display()))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS users (
              user_id TEXT PRIMARY KEY,
              username TEXT NOT NULL,
              display_name TEXT NOT NULL,
              icon_url TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS followings (
              following_id TEXT PRIMARY KEY,
              user_id TEXT NOT NULL,
              profile_url TEXT NOT NULL,
              label TEXT NOT NULL,
              image_url TEXT NOT NULL,
              method TEXT NOT NULL,
              folder_id TEXT NOT NULL,
              secret TEXT NOT NULL,
              poll_duration_secs INTEGER NOT NULL,
              state INTEGER NOT NULL,
              status_note TEXT NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_followings_url ON followings(user_id, profile_url);

            CREATE TABLE IF NOT EXISTS followers (
              follower_id TEXT PRIMARY KEY,
              parent_id TEXT NOT NULL,
              actor_url TEXT NOT NULL,
              actor_name TEXT NOT NULL,
              actor_image_url TEXT NOT NULL,
              actor_email TEXT NOT NULL,
              method TEXT NOT NULL,
              state INTEGER NOT NULL,
              format TEXT NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_followers_actor ON followers(parent_id, actor_url);

            CREATE TABLE IF NOT EXISTS messages (
              message_id TEXT PRIMARY KEY,
              user_id TEXT NOT NULL,
              url TEXT NOT NULL,
              origin_json TEXT NOT NULL,
              social_role TEXT NOT NULL,
              label TEXT NOT NULL,
              summary TEXT NOT NULL,
              image_url TEXT NOT NULL,
              attributed_to_json TEXT NOT NULL,
              content_html TEXT NOT NULL,
              in_reply_to_json TEXT NOT NULL,
              folder_id TEXT NOT NULL,
              publish_date_ms INTEGER NOT NULL,
              like_count INTEGER NOT NULL DEFAULT 0,
              dislike_count INTEGER NOT NULL DEFAULT 0,
              updated_at_ms INTEGER NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_url ON messages(user_id, url);
            CREATE INDEX IF NOT EXISTS idx_messages_folder ON messages(user_id, folder_id, publish_date_ms DESC);

            CREATE TABLE IF NOT EXISTS responses (
              response_id TEXT PRIMARY KEY,
              user_id TEXT NOT NULL,
              actor TEXT NOT NULL,
              object TEXT NOT NULL,
              type TEXT NOT NULL,
              created_at_ms INTEGER NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_responses_key ON responses(actor, object, type);
            "#,
        )?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<Connection> {
        Connection::open(&self.path).with_context(|| format!("open db: {}", self.path.display()))
    }

    pub fn upsert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users(user_id, username, display_name, icon_url) VALUES (?1, ?2, ?3, ?4)\n             ON CONFLICT(user_id) DO UPDATE SET username=excluded.username, display_name=excluded.display_name, icon_url=excluded.icon_url",
            params![user.user_id, user.username, user.display_name, user.icon_url],
        )?;
        Ok(())
    }

    pub fn count_followers(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM followers WHERE parent_id=?1",
            params![user_id],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }

    pub fn count_messages(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE user_id=?1",
            params![user_id],
            |r| r.get(0),
        )?;
        Ok(n as u64)
    }
}

impl UserDirectory for InboxDb {
    fn load_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT user_id, username, display_name, icon_url FROM users WHERE user_id=?1",
            params![user_id],
            |r| {
                Ok(User {
                    user_id: r.get(0)?,
                    username: r.get(1)?,
                    display_name: r.get(2)?,
                    icon_url: r.get(3)?,
                })
            },
        )
        .optional()
        .map_err(Into::into)
    }
}

const FOLLOWING_COLUMNS: &str = "following_id, user_id, profile_url, label, image_url, method, folder_id, secret, poll_duration_secs, state, status_note";

fn following_from_row(r: &Row<'_>) -> rusqlite::Result<Following> {
    let method: String = r.get(5)?;
    let poll: i64 = r.get(8)?;
    let state: u32 = r.get(9)?;
    Ok(Following {
        following_id: r.get(0)?,
        user_id: r.get(1)?,
        profile_url: r.get(2)?,
        label: r.get(3)?,
        image_url: r.get(4)?,
        method: FollowMethod::parse(&method).unwrap_or(FollowMethod::Generic),
        folder_id: r.get(6)?,
        secret: r.get(7)?,
        poll_duration_secs: poll.max(0) as u64,
        state: FollowingState::from_u32(state).unwrap_or(FollowingState::Failure),
        status_note: r.get(10)?,
    })
}

impl FollowingStore for InboxDb {
    fn load_following_by_id(&self, user_id: &str, following_id: &str) -> Result<Option<Following>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {FOLLOWING_COLUMNS} FROM followings WHERE user_id=?1 AND following_id=?2"),
            params![user_id, following_id],
            following_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn load_following_by_url(&self, user_id: &str, profile_url: &str) -> Result<Option<Following>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {FOLLOWING_COLUMNS} FROM followings WHERE user_id=?1 AND profile_url=?2"),
            params![user_id, norm_actor(profile_url)],
            following_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn save_following(&self, following: &mut Following) -> Result<()> {
        let conn = self.conn()?;
        following.profile_url = norm_actor(&following.profile_url).to_string();
        if following.following_id.is_empty() {
            if let Some(id) = conn
                .query_row(
                    "SELECT following_id FROM followings WHERE user_id=?1 AND profile_url=?2",
                    params![following.user_id, following.profile_url],
                    |r| r.get::<_, String>(0),
                )
                .optional()?
            {
                following.following_id = id;
            }
        }
        ensure_id(&mut following.following_id);
        conn.execute(
            &format!("INSERT OR REPLACE INTO followings({FOLLOWING_COLUMNS}, updated_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"),
            params![
                following.following_id,
                following.user_id,
                following.profile_url,
                following.label,
                following.image_url,
                following.method.as_str(),
                following.folder_id,
                following.secret,
                following.poll_duration_secs as i64,
                following.state as u32,
                following.status_note,
                now_ms(),
            ],
        )?;
        Ok(())
    }

    fn delete_following(&self, following: &Following) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM followings WHERE following_id=?1",
            params![following.following_id],
        )?;
        Ok(())
    }
}

const FOLLOWER_COLUMNS: &str =
    "follower_id, parent_id, actor_url, actor_name, actor_image_url, actor_email, method, state, format";

fn follower_from_row(r: &Row<'_>) -> rusqlite::Result<Follower> {
    let method: String = r.get(6)?;
    let state: u32 = r.get(7)?;
    Ok(Follower {
        follower_id: r.get(0)?,
        parent_id: r.get(1)?,
        actor: PersonLink {
            profile_url: r.get(2)?,
            name: r.get(3)?,
            image_url: r.get(4)?,
            email: r.get(5)?,
        },
        method: FollowMethod::parse(&method).unwrap_or(FollowMethod::ActivityPub),
        state: FollowerState::from_u32(state).unwrap_or(FollowerState::Pending),
        format: r.get(8)?,
    })
}

impl FollowerStore for InboxDb {
    fn load_follower_by_id(&self, user_id: &str, follower_id: &str) -> Result<Option<Follower>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {FOLLOWER_COLUMNS} FROM followers WHERE parent_id=?1 AND follower_id=?2"),
            params![user_id, follower_id],
            follower_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn load_activitypub_follower(&self, user_id: &str, actor_url: &str) -> Result<Option<Follower>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {FOLLOWER_COLUMNS} FROM followers WHERE parent_id=?1 AND actor_url=?2"),
            params![user_id, norm_actor(actor_url)],
            follower_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn save_follower(&self, follower: &mut Follower) -> Result<()> {
        let conn = self.conn()?;
        follower.actor.profile_url = norm_actor(&follower.actor.profile_url).to_string();
        if follower.follower_id.is_empty() {
            if let Some(id) = conn
                .query_row(
                    "SELECT follower_id FROM followers WHERE parent_id=?1 AND actor_url=?2",
                    params![follower.parent_id, follower.actor.profile_url],
                    |r| r.get::<_, String>(0),
                )
                .optional()?
            {
                follower.follower_id = id;
            }
        }
        ensure_id(&mut follower.follower_id);
        conn.execute(
            &format!("INSERT OR REPLACE INTO followers({FOLLOWER_COLUMNS}, updated_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                follower.follower_id,
                follower.parent_id,
                follower.actor.profile_url,
                follower.actor.name,
                follower.actor.image_url,
                follower.actor.email,
                follower.method.as_str(),
                follower.state as u32,
                follower.format,
                now_ms(),
            ],
        )?;
        Ok(())
    }

    fn delete_follower(&self, follower: &Follower) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM followers WHERE follower_id=?1",
            params![follower.follower_id],
        )?;
        Ok(())
    }
}

const MESSAGE_COLUMNS: &str = "message_id, user_id, url, origin_json, social_role, label, summary, image_url, attributed_to_json, content_html, in_reply_to_json, folder_id, publish_date_ms, like_count, dislike_count";

struct MessageRow {
    message: Message,
    origin_json: String,
    attributed_to_json: String,
    in_reply_to_json: String,
}

fn message_from_row(r: &Row<'_>) -> rusqlite::Result<MessageRow> {
    let like_count: i64 = r.get(13)?;
    let dislike_count: i64 = r.get(14)?;
    let mut message = Message::new(r.get::<_, String>(1)?, r.get::<_, String>(2)?);
    message.message_id = r.get(0)?;
    message.social_role = r.get(4)?;
    message.label = r.get(5)?;
    message.summary = r.get(6)?;
    message.image_url = r.get(7)?;
    message.content_html = r.get(9)?;
    message.folder_id = r.get(11)?;
    message.publish_date_ms = r.get(12)?;
    message.responses = ResponseCounts {
        like_count: like_count.max(0) as u64,
        dislike_count: dislike_count.max(0) as u64,
    };
    Ok(MessageRow {
        message,
        origin_json: r.get(3)?,
        attributed_to_json: r.get(8)?,
        in_reply_to_json: r.get(10)?,
    })
}

impl MessageRow {
    fn into_message(self) -> Result<Message> {
        let mut message = self.message;
        message.origin = serde_json::from_str::<OriginLink>(&self.origin_json)
            .with_context(|| format!("decode origin of message {}", message.message_id))?;
        message.attributed_to = serde_json::from_str(&self.attributed_to_json)
            .with_context(|| format!("decode attributed_to of message {}", message.message_id))?;
        message.in_reply_to = serde_json::from_str(&self.in_reply_to_json)
            .with_context(|| format!("decode in_reply_to of message {}", message.message_id))?;
        Ok(message)
    }
}

impl InboxStore for InboxDb {
    fn load_message_by_url(&self, user_id: &str, url: &str) -> Result<Option<Message>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE user_id=?1 AND url=?2"),
                params![user_id, url],
                message_from_row,
            )
            .optional()?;
        row.map(MessageRow::into_message).transpose()
    }

    fn save_message(&self, message: &mut Message) -> Result<()> {
        let conn = self.conn()?;
        if message.message_id.is_empty() {
            if let Some(id) = conn
                .query_row(
                    "SELECT message_id FROM messages WHERE user_id=?1 AND url=?2",
                    params![message.user_id, message.url],
                    |r| r.get::<_, String>(0),
                )
                .optional()?
            {
                message.message_id = id;
            }
        }
        ensure_id(&mut message.message_id);
        let origin_json = serde_json::to_string(&message.origin)?;
        let attributed_to_json = serde_json::to_string(&message.attributed_to)?;
        let in_reply_to_json = serde_json::to_string(&message.in_reply_to)?;
        conn.execute(
            &format!("INSERT OR REPLACE INTO messages({MESSAGE_COLUMNS}, updated_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"),
            params![
                message.message_id,
                message.user_id,
                message.url,
                origin_json,
                message.social_role,
                message.label,
                message.summary,
                message.image_url,
                attributed_to_json,
                message.content_html,
                in_reply_to_json,
                message.folder_id,
                message.publish_date_ms,
                message.responses.like_count as i64,
                message.responses.dislike_count as i64,
                now_ms(),
            ],
        )?;
        Ok(())
    }

    fn delete_message(&self, message: &Message) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM messages WHERE message_id=?1",
            params![message.message_id],
        )?;
        Ok(())
    }
}

impl ResponseStore for InboxDb {
    fn load_responses_by_actor_and_object(&self, actor: &str, object: &str) -> Result<Vec<Response>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT response_id, user_id, actor, object, type FROM responses WHERE actor=?1 AND object=?2 ORDER BY created_at_ms DESC",
        )?;
        let rows = stmt.query_map(params![norm_actor(actor), object], |r| {
            Ok(Response {
                response_id: r.get(0)?,
                user_id: r.get(1)?,
                actor: r.get(2)?,
                object: r.get(3)?,
                kind: r.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    fn save_response(&self, response: &mut Response) -> Result<()> {
        let conn = self.conn()?;
        response.actor = norm_actor(&response.actor).to_string();
        if response.response_id.is_empty() {
            if let Some(id) = conn
                .query_row(
                    "SELECT response_id FROM responses WHERE actor=?1 AND object=?2 AND type=?3",
                    params![response.actor, response.object, response.kind],
                    |r| r.get::<_, String>(0),
                )
                .optional()?
            {
                response.response_id = id;
            }
        }
        ensure_id(&mut response.response_id);
        conn.execute(
            "INSERT OR REPLACE INTO responses(response_id, user_id, actor, object, type, created_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                response.response_id,
                response.user_id,
                response.actor,
                response.object,
                response.kind,
                now_ms(),
            ],
        )?;
        Ok(())
    }

    fn delete_response(&self, response: &Response) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM responses WHERE response_id=?1",
            params![response.response_id],
        )?;
        Ok(())
    }
}

fn norm_actor(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{new_record_id, ReplySummary};

    fn temp_db() -> InboxDb {
        let path = std::env::temp_dir()
            .join(format!("stoa-test-{}", new_record_id()))
            .join("inbox.sqlite");
        InboxDb::open(path).unwrap()
    }

    #[test]
    fn reopen_keeps_schema() {
        let db = temp_db();
        let again = InboxDb::open(db.path()).unwrap();
        assert_eq!(again.count_messages("bob").unwrap(), 0);
    }

    #[test]
    fn user_round_trip() {
        let db = temp_db();
        let user = User {
            user_id: "bob".to_string(),
            username: "bob".to_string(),
            display_name: "Bob".to_string(),
            icon_url: "https://local.example/bob.png".to_string(),
        };
        db.upsert_user(&user).unwrap();
        assert_eq!(db.load_user("bob").unwrap(), Some(user));
        assert_eq!(db.load_user("nobody").unwrap(), None);
    }

    #[test]
    fn following_upsert_by_natural_key() {
        let db = temp_db();
        let mut f = Following::new("bob", "", "https://remote.example/users/alice/");
        f.folder_id = "inbox".to_string();
        db.save_following(&mut f).unwrap();
        assert_eq!(f.profile_url, "https://remote.example/users/alice");

        let mut dup = Following::new("bob", "", "https://remote.example/users/alice");
        db.save_following(&mut dup).unwrap();
        assert_eq!(dup.following_id, f.following_id);

        let mut loaded = db
            .load_following_by_url("bob", "https://remote.example/users/alice/")
            .unwrap()
            .unwrap();
        db.set_following_status(&mut loaded, FollowingState::Success, "accepted")
            .unwrap();
        let by_id = db.load_following_by_id("bob", &f.following_id).unwrap().unwrap();
        assert_eq!(by_id.state, FollowingState::Success);
        assert_eq!(by_id.status_note, "accepted");

        db.delete_following(&by_id).unwrap();
        assert!(db.load_following_by_id("bob", &f.following_id).unwrap().is_none());
    }

    #[test]
    fn follower_create_and_delete() {
        let db = temp_db();
        let user = User {
            user_id: "bob".to_string(),
            username: "bob".to_string(),
            display_name: String::new(),
            icon_url: String::new(),
        };
        let actor = PersonLink {
            profile_url: "https://remote.example/users/alice".to_string(),
            name: "Alice".to_string(),
            ..PersonLink::default()
        };
        let a = db.new_activitypub_follower(&user, actor.clone()).unwrap();
        let b = db.new_activitypub_follower(&user, actor).unwrap();
        assert_eq!(a.follower_id, b.follower_id);
        assert_eq!(db.count_followers("bob").unwrap(), 1);

        let loaded = db
            .load_activitypub_follower("bob", "https://remote.example/users/alice")
            .unwrap()
            .unwrap();
        assert_eq!(loaded.state, FollowerState::Active);
        db.delete_follower(&loaded).unwrap();
        assert_eq!(db.count_followers("bob").unwrap(), 0);
    }

    #[test]
    fn message_nested_fields_survive() {
        let db = temp_db();
        let mut m = db.load_or_create_message("bob", "https://remote.example/notes/1").unwrap();
        m.label = "Hello".to_string();
        m.attributed_to = vec![PersonLink {
            profile_url: "https://remote.example/users/alice".to_string(),
            name: "Alice".to_string(),
            ..PersonLink::default()
        }];
        m.in_reply_to = vec![ReplySummary {
            url: "https://remote.example/notes/0".to_string(),
            ..ReplySummary::default()
        }];
        m.origin.url = "https://remote.example/users/alice".to_string();
        m.responses.like_count = 3;
        m.responses.dislike_count = 2;
        db.save_message(&mut m).unwrap();

        let mut again = db.load_or_create_message("bob", "https://remote.example/notes/1").unwrap();
        assert_eq!(again, m);
        again.label = "Edited".to_string();
        db.save_message(&mut again).unwrap();
        assert_eq!(db.count_messages("bob").unwrap(), 1);

        db.delete_message(&again).unwrap();
        assert!(db.load_message_by_url("bob", "https://remote.example/notes/1").unwrap().is_none());
    }

    #[test]
    fn responses_are_keyed_by_type() {
        let db = temp_db();
        for kind in ["Like", "Announce", "Like"] {
            let mut r = Response {
                response_id: String::new(),
                user_id: "bob".to_string(),
                actor: "https://remote.example/users/alice".to_string(),
                object: "https://local.example/@bob/notes/1".to_string(),
                kind: kind.to_string(),
            };
            db.save_response(&mut r).unwrap();
        }
        let all = db
            .load_responses_by_actor_and_object(
                "https://remote.example/users/alice",
                "https://local.example/@bob/notes/1",
            )
            .unwrap();
        assert_eq!(all.len(), 2);
        for r in &all {
            db.delete_response(r).unwrap();
        }
        assert!(db
            .load_responses_by_actor_and_object(
                "https://remote.example/users/alice",
                "https://local.example/@bob/notes/1",
            )
            .unwrap()
            .is_empty());
    }

    #[test]
    fn corrupt_json_column_is_an_error() {
        let db = temp_db();
        let mut m = Message::new("bob", "https://remote.example/notes/9");
        db.save_message(&mut m).unwrap();
        let conn = Connection::open(db.path()).unwrap();
        conn.execute(
            "UPDATE messages SET attributed_to_json='{not json' WHERE message_id=?1",
            params![m.message_id],
        )
        .unwrap();

        let err = db
            .load_message_by_url("bob", "https://remote.example/notes/9")
            .unwrap_err();
        assert!(err.to_string().contains("attributed_to"), "{err:#}");
    }
}
