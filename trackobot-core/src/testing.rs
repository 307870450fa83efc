//! Scripted profile service for unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::profile::{ProfileApi, UploadReceipt};
use crate::settings::Credentials;
use crate::stats::Meta;
use crate::types::{GameMode, HeroClass, MatchResult, Outcome, QueuedResult, TurnOrder};

/// Canned reply for the next call
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Succeed (uploads use the value as result id)
    Ok(i64),
    /// Fail with this HTTP status; 0 means an unparseable reply
    Status(u16),
}

fn failure(status: u16) -> Error {
    if status == 0 {
        Error::malformed_reply("unexpected reply")
    } else {
        Error::Service {
            status,
            message: "scripted failure".to_string(),
        }
    }
}

/// [`ProfileApi`] answering from a script.
///
/// Uploads with no scripted reply succeed with increasing ids.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    upload_replies: Mutex<VecDeque<Reply>>,
    account_reply: Mutex<Option<Reply>>,
    uploads: Mutex<Vec<(QueuedResult, Meta)>>,
    account_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    next_id: AtomicI64,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn reply_to_uploads(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.upload_replies
            .lock()
            .unwrap()
            .extend(replies);
        self
    }

    pub fn reply_to_account(self, reply: Reply) -> Self {
        *self.account_reply.lock().unwrap() = Some(reply);
        self
    }

    /// Everything uploaded so far, in send order
    pub fn uploads(&self) -> Vec<(QueuedResult, Meta)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn account_calls(&self) -> usize {
        self.account_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

impl ProfileApi for ScriptedApi {
    async fn create_account(&self) -> Result<Credentials> {
        self.account_calls.fetch_add(1, Ordering::SeqCst);
        match self.account_reply.lock().unwrap().clone() {
            Some(Reply::Status(status)) => Err(failure(status)),
            _ => Ok(Credentials {
                username: "u".to_string(),
                password: "p".to_string(),
            }),
        }
    }

    async fn upload_result(&self, result: &QueuedResult, meta: &Meta) -> Result<UploadReceipt> {
        self.uploads.lock().unwrap().push((result.clone(), *meta));

        let reply = self.upload_replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Status(status)) => Err(failure(status)),
            Some(Reply::Ok(id)) => UploadReceipt::from_response(
                serde_json::json!({"result": {"id": id}}),
            ),
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                UploadReceipt::from_response(serde_json::json!({"result": {"id": id}}))
            }
        }
    }

    async fn one_time_auth(&self) -> Result<String> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        Ok("https://trackobot.com/one_time_auth/abc".to_string())
    }
}

/// A complete ranked match with the given heroes
pub(crate) fn match_result(hero: HeroClass, opponent: HeroClass) -> MatchResult {
    MatchResult::new(
        GameMode::Ranked,
        Outcome::Victory,
        TurnOrder::First,
        hero,
        opponent,
    )
}

/// Queued form of [`match_result`]
pub(crate) fn queued(hero: HeroClass, opponent: HeroClass) -> QueuedResult {
    QueuedResult::try_from(&match_result(hero, opponent)).unwrap()
}
