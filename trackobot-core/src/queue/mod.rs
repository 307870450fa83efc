//! Durable queue of results waiting for upload
//!
//! Results are uploaded one at a time from the head of the queue. While the
//! service answers, a backlog drains at one upload per upload period; after a
//! failure the queue backs off and only the check timer triggers the next
//! attempt.
//!
//! ```text
//! IDLE      Q empty, upload timer stopped
//! DRAINING  Q non-empty, upload timer ticking
//! BACKOFF   Q non-empty, upload timer stopped, waiting for the check timer
//! ```
//!
//! The queue is snapshotted to the settings store under `resultsQueue` when
//! it is dropped, and picked up (and the key removed) when the next queue is
//! created. A result whose upload is in flight at shutdown is not part of the
//! snapshot.

mod ticker;

pub use ticker::{sleep_until, Ticker};

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::{QueueConfig, RequeuePosition};
use crate::error::Result;
use crate::profile::{ProfileApi, UploadReceipt};
use crate::settings::{keys, SettingsStore};
use crate::stats::ObserverStats;
use crate::types::{MatchResult, QueuedResult, Rejection};

/// Timer periods and retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueOptions {
    /// How often a backed-off queue retries
    pub check_period: Duration,
    /// Pace of uploads while draining a backlog
    pub upload_period: Duration,
    pub requeue: RequeuePosition,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            check_period: Duration::from_millis(1_800_000),
            upload_period: Duration::from_millis(300_000),
            requeue: RequeuePosition::Tail,
        }
    }
}

impl From<&QueueConfig> for QueueOptions {
    fn from(config: &QueueConfig) -> Self {
        Self {
            check_period: Duration::from_secs(config.check_period_secs),
            upload_period: Duration::from_secs(config.upload_period_secs),
            requeue: config.requeue,
        }
    }
}

/// Result of one upload attempt; exactly one is reported per upload
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Succeeded(UploadReceipt),
    Failed {
        result: QueuedResult,
        /// HTTP status, or 0 when the request never got a usable reply
        status: u16,
    },
}

/// Something the queue has to react to
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Outcome(UploadOutcome),
    UploadTimer,
    CheckTimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Draining,
    Backoff,
}

impl QueueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::Idle => "idle",
            QueueState::Draining => "draining",
            QueueState::Backoff => "backoff",
        }
    }
}

/// FIFO of validated results with paced, retried uploads.
///
/// All methods must be called from one task. Uploads run as spawned tasks
/// and report back through [`ResultQueue::wait`].
pub struct ResultQueue<S: SettingsStore + ?Sized, A: ProfileApi> {
    settings: Arc<S>,
    api: Arc<A>,
    stats: Arc<ObserverStats>,
    pending: VecDeque<QueuedResult>,
    check_timer: Ticker,
    upload_timer: Ticker,
    requeue: RequeuePosition,
    outcome_tx: mpsc::UnboundedSender<UploadOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<UploadOutcome>,
    in_flight: usize,
}

impl<S: SettingsStore + ?Sized, A: ProfileApi> ResultQueue<S, A> {
    /// Create a queue, taking over any results persisted by a previous run.
    ///
    /// The persisted snapshot is removed from the settings store right away;
    /// it is written again when this queue is dropped.
    pub fn new(
        settings: Arc<S>,
        api: Arc<A>,
        stats: Arc<ObserverStats>,
        options: QueueOptions,
    ) -> Self {
        let pending = load(&*settings);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let mut check_timer = Ticker::new(options.check_period);
        check_timer.start();

        Self {
            settings,
            api,
            stats,
            pending,
            check_timer,
            upload_timer: Ticker::new(options.upload_period),
            requeue: options.requeue,
            outcome_tx,
            outcome_rx,
            in_flight: 0,
        }
    }

    /// Validate a match result, queue it and start uploading.
    pub fn add(&mut self, result: &MatchResult) -> std::result::Result<(), Rejection> {
        match QueuedResult::try_from(result) {
            Ok(queued) => {
                tracing::info!(
                    mode = result.mode.as_str(),
                    outcome = result.outcome.as_str(),
                    hero = result.hero.as_str(),
                    opponent = result.opponent.as_str(),
                    order = result.order.as_str(),
                    "Result recorded"
                );
                self.enqueue(queued);
                Ok(())
            }
            Err(rejection) => {
                tracing::info!(%rejection, "Result not queued");
                Err(rejection)
            }
        }
    }

    /// Append an already validated result and start uploading.
    pub fn enqueue(&mut self, result: QueuedResult) {
        tracing::debug!(fingerprint = %result.fingerprint(), "Queueing result");
        self.pending.push_back(result);
        self.upload();
    }

    /// Send the head of the queue, if any.
    ///
    /// Does not check whether another upload is still running; the head is
    /// removed before sending, so two uploads never carry the same result.
    pub fn upload(&mut self) {
        let Some(result) = self.pending.pop_front() else {
            return;
        };

        if self.pending.is_empty() {
            tracing::info!(fingerprint = %result.fingerprint(), "Uploading result");
        } else {
            tracing::info!(
                fingerprint = %result.fingerprint(),
                remaining = self.pending.len(),
                "Found an old result, uploading that first"
            );
        }

        let meta = self.stats.meta();
        let api = Arc::clone(&self.api);
        let outcome_tx = self.outcome_tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let reply = api.upload_result(&result, &meta).await;
            let outcome = match reply {
                Ok(receipt) => UploadOutcome::Succeeded(receipt),
                Err(e) => {
                    tracing::debug!(error = %e, "Upload request failed");
                    UploadOutcome::Failed {
                        status: e.status_code(),
                        result,
                    }
                }
            };
            // The receiver only goes away with the queue itself
            let _ = outcome_tx.send(outcome);
        });
    }

    /// Periodic retry: upload unless a backlog is already draining.
    pub fn check(&mut self) {
        if self.upload_timer.is_active() {
            return;
        }
        self.upload();
    }

    /// Wait for the next upload outcome or timer tick.
    ///
    /// Cancel safe: dropping the future loses nothing.
    pub async fn wait(&mut self) -> QueueEvent {
        let upload_deadline = self.upload_timer.deadline();
        let check_deadline = self.check_timer.deadline();

        tokio::select! {
            Some(outcome) = self.outcome_rx.recv() => QueueEvent::Outcome(outcome),
            _ = sleep_until(upload_deadline) => QueueEvent::UploadTimer,
            _ = sleep_until(check_deadline) => QueueEvent::CheckTimer,
        }
    }

    /// React to an event from [`ResultQueue::wait`].
    ///
    /// Returns the service id of a result that was just uploaded.
    pub fn dispatch(&mut self, event: QueueEvent) -> Option<i64> {
        match event {
            QueueEvent::Outcome(outcome) => self.handle_outcome(outcome),
            QueueEvent::UploadTimer => {
                self.upload_timer.rearm();
                self.upload();
                None
            }
            QueueEvent::CheckTimer => {
                self.check_timer.rearm();
                self.check();
                None
            }
        }
    }

    fn handle_outcome(&mut self, outcome: UploadOutcome) -> Option<i64> {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            UploadOutcome::Succeeded(receipt) => {
                tracing::info!(id = receipt.id, "Result uploaded");
                // Roll the rest of the backlog out slowly
                if self.pending.is_empty() {
                    self.upload_timer.stop();
                } else {
                    self.upload_timer.start();
                }
                Some(receipt.id)
            }
            UploadOutcome::Failed { result, status } => {
                tracing::error!(
                    status,
                    fingerprint = %result.fingerprint(),
                    "There was a problem uploading the result; keeping it to try again later"
                );
                match self.requeue {
                    RequeuePosition::Tail => self.pending.push_back(result),
                    RequeuePosition::Head => self.pending.push_front(result),
                }
                // Uploads are not going through, only the check timer retries
                self.upload_timer.stop();
                None
            }
        }
    }

    /// Write the pending results to the settings store.
    pub fn save(&self) -> Result<()> {
        tracing::info!(count = self.pending.len(), "Saving results");
        let pending: Vec<&QueuedResult> = self.pending.iter().collect();
        let snapshot = serde_json::to_vec(&pending)?;
        self.settings.set(keys::RESULTS_QUEUE, &snapshot)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending results, head first
    pub fn iter(&self) -> impl Iterator<Item = &QueuedResult> {
        self.pending.iter()
    }

    /// Uploads sent but not answered yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn check_timer(&self) -> &Ticker {
        &self.check_timer
    }

    pub fn upload_timer(&self) -> &Ticker {
        &self.upload_timer
    }

    pub fn state(&self) -> QueueState {
        if self.pending.is_empty() {
            QueueState::Idle
        } else if self.upload_timer.is_active() {
            QueueState::Draining
        } else {
            QueueState::Backoff
        }
    }
}

impl<S: SettingsStore + ?Sized, A: ProfileApi> Drop for ResultQueue<S, A> {
    fn drop(&mut self) {
        if let Err(e) = self.save() {
            tracing::error!(error = %e, "Failed to save pending results");
        }
    }
}

/// Results persisted by a previous run, without taking them over
pub fn peek_persisted<S: SettingsStore + ?Sized>(settings: &S) -> Result<Vec<QueuedResult>> {
    Ok(settings
        .get(keys::RESULTS_QUEUE)?
        .map(|raw| parse_snapshot(&raw))
        .unwrap_or_default())
}

/// Take over the persisted snapshot, removing it from the store
fn load<S: SettingsStore + ?Sized>(settings: &S) -> VecDeque<QueuedResult> {
    let raw = match settings.get(keys::RESULTS_QUEUE) {
        Ok(Some(raw)) => raw,
        Ok(None) => return VecDeque::new(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read saved results");
            return VecDeque::new();
        }
    };

    let pending: VecDeque<QueuedResult> = parse_snapshot(&raw).into();
    tracing::info!(count = pending.len(), "Unsaved results found");

    if let Err(e) = settings.remove(keys::RESULTS_QUEUE) {
        tracing::warn!(error = %e, "Failed to clear saved results");
    }
    pending
}

/// Parse a snapshot, skipping entries that are not complete results
fn parse_snapshot(raw: &[u8]) -> Vec<QueuedResult> {
    let entries: Vec<serde_json::Value> = match serde_json::from_slice(raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Saved results are not a JSON array, discarding");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<QueuedResult>(entry) {
            Ok(result) if result.is_complete() => Some(result),
            Ok(result) => {
                tracing::warn!(fingerprint = %result.fingerprint(), "Skipping incomplete saved result");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable saved result");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;
    use crate::testing::{match_result, queued, Reply, ScriptedApi};
    use crate::types::{GameMode, HeroClass, Outcome, TurnOrder};
    use tokio::time::Instant;

    fn queue(
        settings: &Arc<MemorySettings>,
        api: &Arc<ScriptedApi>,
    ) -> ResultQueue<MemorySettings, ScriptedApi> {
        queue_with(settings, api, QueueOptions::default())
    }

    fn queue_with(
        settings: &Arc<MemorySettings>,
        api: &Arc<ScriptedApi>,
        options: QueueOptions,
    ) -> ResultQueue<MemorySettings, ScriptedApi> {
        crate::logging::init_test();
        ResultQueue::new(
            Arc::clone(settings),
            Arc::clone(api),
            Arc::new(ObserverStats::new()),
            options,
        )
    }

    fn persist(settings: &MemorySettings, results: &[QueuedResult]) {
        settings
            .set(keys::RESULTS_QUEUE, &serde_json::to_vec(results).unwrap())
            .unwrap();
    }

    /// Wait for the next event and handle it
    async fn step(queue: &mut ResultQueue<MemorySettings, ScriptedApi>) -> (QueueEvent, Option<i64>) {
        let event = queue.wait().await;
        let uploaded = queue.dispatch(event.clone());
        (event, uploaded)
    }

    #[test]
    fn test_default_periods() {
        let options = QueueOptions::default();
        assert_eq!(options.check_period.as_millis(), 1_800_000);
        assert_eq!(options.upload_period.as_millis(), 300_000);
        assert_eq!(options.requeue, RequeuePosition::Tail);

        assert_eq!(QueueOptions::from(&QueueConfig::default()), options);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_rejects_unknown_fields() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new());
        let mut queue = queue(&settings, &api);

        let base = match_result(HeroClass::Mage, HeroClass::Warrior);
        let mut variants = Vec::new();
        let mut m = base.clone();
        m.outcome = Outcome::Unknown;
        variants.push(m);
        let mut m = base.clone();
        m.mode = GameMode::Unknown;
        variants.push(m);
        let mut m = base.clone();
        m.order = TurnOrder::Unknown;
        variants.push(m);
        let mut m = base.clone();
        m.hero = HeroClass::Unknown;
        variants.push(m);
        let mut m = base.clone();
        m.opponent = HeroClass::Unknown;
        variants.push(m);
        let mut m = base;
        m.mode = GameMode::SoloAdventures;
        variants.push(m);

        for result in &variants {
            assert!(queue.add(result).is_err());
            assert_eq!(queue.len(), 0);
            assert_eq!(queue.in_flight(), 0);
        }

        tokio::task::yield_now().await;
        assert!(api.uploads().is_empty());
        assert_eq!(queue.state(), QueueState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_valid_result_uploads_it() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new().reply_to_uploads([Reply::Ok(42)]));
        let mut queue = queue(&settings, &api);

        queue
            .add(&match_result(HeroClass::Mage, HeroClass::Warrior))
            .unwrap();
        // Head is taken off the queue when the upload is sent
        assert_eq!(queue.len() + queue.in_flight(), 1);

        let (_, uploaded) = step(&mut queue).await;
        assert_eq!(uploaded, Some(42));
        assert!(queue.is_empty());
        assert!(!queue.upload_timer().is_active());
        assert_eq!(queue.state(), QueueState::Idle);

        let uploads = api.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(
            serde_json::to_value(&uploads[0].0).unwrap(),
            serde_json::json!({
                "coin": false,
                "hero": "mage",
                "opponent": "warrior",
                "win": true,
                "mode": "ranked",
                "card_history": []
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_upload_backs_off_until_check() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(
            ScriptedApi::new().reply_to_uploads([Reply::Status(500), Reply::Ok(7)]),
        );
        let mut queue = queue(&settings, &api);
        let start = Instant::now();

        queue
            .add(&match_result(HeroClass::Mage, HeroClass::Warrior))
            .unwrap();
        let (event, uploaded) = step(&mut queue).await;
        assert!(matches!(
            event,
            QueueEvent::Outcome(UploadOutcome::Failed { status: 500, .. })
        ));
        assert_eq!(uploaded, None);
        assert_eq!(queue.len(), 1);
        assert!(!queue.upload_timer().is_active());
        assert_eq!(queue.state(), QueueState::Backoff);

        // Nothing happens before the check timer
        let early = tokio::time::timeout(Duration::from_secs(29 * 60), queue.wait()).await;
        assert!(early.is_err());
        assert_eq!(api.uploads().len(), 1);

        let (event, _) = step(&mut queue).await;
        assert_eq!(event, QueueEvent::CheckTimer);
        assert_eq!(Instant::now() - start, Duration::from_secs(30 * 60));

        let (_, uploaded) = step(&mut queue).await;
        assert_eq!(uploaded, Some(7));
        assert!(queue.is_empty());
        assert_eq!(api.uploads().len(), 2);
        assert_eq!(api.uploads()[0].0, api.uploads()[1].0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_with_backlog_drains_at_upload_period() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new());
        let backlog = [
            queued(HeroClass::Mage, HeroClass::Warrior),
            queued(HeroClass::Druid, HeroClass::Rogue),
            queued(HeroClass::Priest, HeroClass::Hunter),
        ];
        persist(&settings, &backlog);
        let mut queue = queue(&settings, &api);
        assert_eq!(queue.state(), QueueState::Backoff);

        queue.upload();
        let (_, uploaded) = step(&mut queue).await;
        assert_eq!(uploaded, Some(1));
        assert_eq!(queue.len(), 2);
        assert_eq!(
            queue.upload_timer().deadline(),
            Some(Instant::now() + Duration::from_secs(300))
        );
        assert_eq!(queue.state(), QueueState::Draining);

        let before = Instant::now();
        let (event, _) = step(&mut queue).await;
        assert_eq!(event, QueueEvent::UploadTimer);
        assert_eq!(Instant::now() - before, Duration::from_secs(300));

        let (_, uploaded) = step(&mut queue).await;
        assert_eq!(uploaded, Some(2));
        assert_eq!(queue.len(), 1);

        // Draining is under way, so the check timer does not add uploads
        queue.check();
        assert_eq!(queue.in_flight(), 0);
        assert_eq!(queue.len(), 1);

        let uploads: Vec<QueuedResult> = api.uploads().into_iter().map(|(r, _)| r).collect();
        assert_eq!(uploads, backlog[..2].to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_upload_requeues_at_tail() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new().reply_to_uploads([Reply::Status(503)]));
        let r1 = queued(HeroClass::Mage, HeroClass::Warrior);
        let r2 = queued(HeroClass::Druid, HeroClass::Rogue);
        persist(&settings, &[r1.clone(), r2.clone()]);
        let mut queue = queue(&settings, &api);

        queue.upload();
        step(&mut queue).await;
        assert_eq!(queue.iter().cloned().collect::<Vec<_>>(), vec![r2, r1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_upload_requeues_at_head_when_configured() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new().reply_to_uploads([Reply::Status(503)]));
        let r1 = queued(HeroClass::Mage, HeroClass::Warrior);
        let r2 = queued(HeroClass::Druid, HeroClass::Rogue);
        persist(&settings, &[r1.clone(), r2.clone()]);
        let options = QueueOptions {
            requeue: RequeuePosition::Head,
            ..QueueOptions::default()
        };
        let mut queue = queue_with(&settings, &api, options);

        queue.upload();
        step(&mut queue).await;
        assert_eq!(queue.iter().cloned().collect::<Vec<_>>(), vec![r1, r2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_without_id_is_a_failure() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new().reply_to_uploads([Reply::Status(0)]));
        let mut queue = queue(&settings, &api);

        queue
            .add(&match_result(HeroClass::Mage, HeroClass::Warrior))
            .unwrap();
        let (event, uploaded) = step(&mut queue).await;
        assert!(matches!(
            event,
            QueueEvent::Outcome(UploadOutcome::Failed { status: 0, .. })
        ));
        assert_eq!(uploaded, None);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_clears_key_and_drop_saves() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new());
        let r1 = queued(HeroClass::Mage, HeroClass::Warrior);
        let r2 = queued(HeroClass::Druid, HeroClass::Rogue);
        let r3 = queued(HeroClass::Shaman, HeroClass::Paladin);
        persist(&settings, &[r1.clone(), r2.clone()]);

        let mut queue = queue(&settings, &api);
        assert!(!settings.contains(keys::RESULTS_QUEUE).unwrap());
        assert_eq!(queue.len(), 2);

        // Adding R3 sends R1, leaving [R2, R3]
        queue.enqueue(r3.clone());
        step(&mut queue).await;
        assert_eq!(api.uploads()[0].0, r1);
        assert!(!settings.contains(keys::RESULTS_QUEUE).unwrap());

        drop(queue);
        assert_eq!(peek_persisted(&*settings).unwrap(), vec![r2, r3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_roundtrip() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new());
        let mut ranked = match_result(HeroClass::Warlock, HeroClass::Mage);
        ranked.legend = Some(120);
        ranked.duration = Some(600);
        let backlog = vec![
            queued(HeroClass::Mage, HeroClass::Warrior),
            QueuedResult::try_from(&ranked).unwrap(),
            queued(HeroClass::Mage, HeroClass::Warrior),
        ];
        persist(&settings, &backlog);

        let queue = queue(&settings, &api);
        assert_eq!(queue.iter().cloned().collect::<Vec<_>>(), backlog);
        drop(queue);

        let queue = self::queue(&settings, &api);
        assert_eq!(queue.iter().cloned().collect::<Vec<_>>(), backlog);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_skips_broken_entries() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new());
        let good = queued(HeroClass::Mage, HeroClass::Warrior);
        let mut incomplete = serde_json::to_value(&good).unwrap();
        incomplete["hero"] = serde_json::json!("unknown");
        let snapshot = serde_json::json!([good, incomplete, {"coin": "maybe"}, 17]);
        settings
            .set(keys::RESULTS_QUEUE, snapshot.to_string().as_bytes())
            .unwrap();

        let queue = queue(&settings, &api);
        assert_eq!(queue.iter().cloned().collect::<Vec<_>>(), vec![good]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_garbage_snapshot_is_discarded() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new());
        settings.set(keys::RESULTS_QUEUE, b"{not json").unwrap();

        let queue = queue(&settings, &api);
        assert!(queue.is_empty());
        assert!(!settings.contains(keys::RESULTS_QUEUE).unwrap());
    }

    #[test]
    fn test_peek_persisted_leaves_key() {
        let settings = MemorySettings::new();
        assert!(peek_persisted(&settings).unwrap().is_empty());

        let r1 = queued(HeroClass::Hunter, HeroClass::Druid);
        persist(&settings, &[r1.clone()]);
        assert_eq!(peek_persisted(&settings).unwrap(), vec![r1]);
        assert!(settings.contains(keys::RESULTS_QUEUE).unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_upload_carries_current_meta() {
        let settings = Arc::new(MemorySettings::new());
        let api = Arc::new(ScriptedApi::new());
        let stats = Arc::new(ObserverStats::new());
        stats.set_screen_size(1280, 720);
        let mut queue = ResultQueue::new(
            Arc::clone(&settings),
            Arc::clone(&api),
            Arc::clone(&stats),
            QueueOptions::default(),
        );

        queue.enqueue(queued(HeroClass::Rogue, HeroClass::Mage));
        step(&mut queue).await;

        let meta = api.uploads()[0].1;
        assert_eq!((meta.screen_width, meta.screen_height), (1280, 720));
    }
}
