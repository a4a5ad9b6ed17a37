//! Progress engine
//!
//! Every operation is one transaction: load and sanitize the persisted
//! state, mutate a draft, repair it, persist it. The per-step rules live in
//! the sibling modules; this module only sequences them.

use chrono::{DateTime, Utc};
use rand::{RngCore, SeedableRng};
use rand_pcg::Mcg128Xsl64;
use serde_json::json;
use tracing::{debug, info};

use super::badges::{self, BadgeContext, BadgeView, UnlockedBadge};
use super::cache::TopicCache;
use super::calendar::{Calendar, Clock, SystemClock};
use super::levels::{self, LevelCurve, XpGrant, XpSource};
use super::minigames::{self, MinigameResult};
use super::missions::{self, MissionProgress};
use super::reminders::{self, NotificationReminder, NotificationSink};
use super::sanitize;
use super::seasonal::{self, SeasonalEventDef, SeasonalEventProgress};
use super::session::{CefrLevel, Session};
use super::state::ProgressState;
use super::streaks::{self, StreakPeriod, StreakUpdate};
use crate::config::EngineConfig;
use crate::store::{StateStore, StoreError};

/// Level change caused by one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
}

/// Something worth telling the learner about
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    LevelUp(LevelUp),
    StreakMilestone(u32),
    MissionCompleted { title: String, xp: u64 },
    BadgeUnlocked(UnlockedBadge),
    SeasonalEventCompleted { name: String, xp: u64 },
}

/// Borrowed engine settings handed to the pure session pipeline
pub struct EngineContext<'a> {
    pub config: &'a EngineConfig,
    pub calendar: &'a Calendar,
    pub curve: &'a LevelCurve,
    pub rng: &'a mut dyn RngCore,
}

/// Result of a completed session
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// Every XP grant made, in order
    pub xp_grants: Vec<XpGrant>,
    pub level_up: Option<LevelUp>,
    pub streaks: StreakUpdate,
    pub reminders: Vec<NotificationReminder>,
    pub assigned_missions: Vec<MissionProgress>,
    pub completed_missions: Vec<MissionProgress>,
    pub unlocked_badges: Vec<UnlockedBadge>,
    pub completed_events: Vec<SeasonalEventProgress>,
    /// State after the session, as persisted
    pub state: ProgressState,
}

impl SessionOutcome {
    pub fn xp_gained(&self) -> u64 {
        self.xp_grants.iter().map(|g| g.amount).sum()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        if let Some(level_up) = self.level_up {
            events.push(ProgressEvent::LevelUp(level_up));
        }
        if let Some(value) = self.streaks.milestone {
            events.push(ProgressEvent::StreakMilestone(value));
        }
        events.extend(completion_events(
            &self.completed_missions,
            &self.unlocked_badges,
            &self.completed_events,
        ));
        events
    }
}

/// Result of a recorded minigame
#[derive(Debug, Clone)]
pub struct MinigameOutcome {
    pub result: MinigameResult,
    pub xp_grants: Vec<XpGrant>,
    pub level_up: Option<LevelUp>,
    pub completed_missions: Vec<MissionProgress>,
    pub unlocked_badges: Vec<UnlockedBadge>,
    pub state: ProgressState,
}

impl MinigameOutcome {
    pub fn events(&self) -> Vec<ProgressEvent> {
        let mut events: Vec<_> = self.level_up.map(ProgressEvent::LevelUp).into_iter().collect();
        events.extend(completion_events(
            &self.completed_missions,
            &self.unlocked_badges,
            &[],
        ));
        events
    }
}

fn completion_events(
    missions: &[MissionProgress],
    badges: &[UnlockedBadge],
    events: &[SeasonalEventProgress],
) -> Vec<ProgressEvent> {
    let missions = missions.iter().map(|m| ProgressEvent::MissionCompleted {
        title: m.title.clone(),
        xp: m.reward.xp,
    });
    let badges = badges.iter().cloned().map(ProgressEvent::BadgeUnlocked);
    let seasonal = events.iter().filter_map(|e| {
        SeasonalEventDef::get(&e.id).map(|def| ProgressEvent::SeasonalEventCompleted {
            name: def.name.to_string(),
            xp: def.reward_xp,
        })
    });
    missions.chain(badges).chain(seasonal).collect()
}

fn level_change(before: u32, after: u32) -> Option<LevelUp> {
    (after > before).then_some(LevelUp {
        old_level: before,
        new_level: after,
    })
}

/// Grants XP into a draft and remembers every grant
struct XpLedger<'a> {
    config: &'a EngineConfig,
    curve: &'a LevelCurve,
    now: DateTime<Utc>,
    grants: Vec<XpGrant>,
}

impl<'a> XpLedger<'a> {
    fn new(config: &'a EngineConfig, curve: &'a LevelCurve, now: DateTime<Utc>) -> Self {
        Self {
            config,
            curve,
            now,
            grants: Vec::new(),
        }
    }

    fn grant(
        &mut self,
        state: &mut ProgressState,
        amount: u64,
        source: XpSource,
        metadata: serde_json::Value,
    ) {
        if amount == 0 {
            return;
        }
        let grant = levels::grant_xp(
            &mut state.xp,
            self.curve,
            amount as f64,
            source,
            Some(metadata),
            self.now,
            self.config.xp.history_limit,
        );
        self.grants.push(grant);
    }

    fn rewards(
        &mut self,
        state: &mut ProgressState,
        missions: &[MissionProgress],
        badges: &[UnlockedBadge],
        events: &[SeasonalEventProgress],
    ) {
        for mission in missions {
            self.grant(
                state,
                mission.reward.xp,
                XpSource::Mission,
                json!({ "mission_id": mission.id, "template_id": mission.template_id }),
            );
        }
        for badge in badges {
            self.grant(
                state,
                badge.xp_reward,
                XpSource::Badge,
                json!({ "badge": badge.id.as_str() }),
            );
        }
        for event in events {
            let reward = SeasonalEventDef::get(&event.id).map_or(0, |def| def.reward_xp);
            self.grant(
                state,
                reward,
                XpSource::SeasonalEvent,
                json!({ "event": event.id }),
            );
        }
    }
}

/// Run the whole session pipeline against a copy of `state`.
///
/// Order: streaks and reminders, missions, badges (against the level before
/// this session's XP), seasonal events, then XP for the session and every
/// reward earned on the way. The returned state is already repaired.
pub fn apply_session(
    state: &ProgressState,
    session: &Session,
    now: DateTime<Utc>,
    ctx: &mut EngineContext<'_>,
) -> SessionOutcome {
    let config = ctx.config;
    let mut draft = state.clone();
    let level_before = draft.xp.level;

    draft.totals.sessions += 1;

    let streaks = streaks::update_streaks(&mut draft.streaks, now, ctx.calendar, &config.streaks);

    let mut scheduled = Vec::new();
    if config.reminders.enabled {
        let min_delay = config.reminders.min_delay();
        for period in StreakPeriod::all() {
            let lead_hours = match period {
                StreakPeriod::Daily => config.reminders.daily_lead_hours,
                StreakPeriod::Weekly => config.reminders.weekly_lead_hours,
            };
            scheduled.push(reminders::schedule_streak_reminder(
                &mut draft.reminders,
                *period,
                streaks.deadlines.get(*period),
                lead_hours,
                now,
                min_delay,
            ));
        }
    }

    let assigned_missions = missions::ensure_daily_missions(
        &mut draft.missions,
        session.level,
        now,
        &mut *ctx.rng,
        &config.missions,
    );
    let completed_missions = missions::apply_session_to_missions(&mut draft.missions, session, now);
    draft.totals.missions_completed += completed_missions.len() as u64;

    let badge_context = BadgeContext::from_state(&draft);
    let unlocked_badges = badges::evaluate_badges(&mut draft.badges, &badge_context, now);

    let completed_events = seasonal::apply_seasonal_progress(
        &mut draft.seasonal_events,
        session,
        now,
        ctx.calendar,
        config.seasonal.reopen_completed,
    );

    let mut xp = XpLedger::new(config, ctx.curve, now);
    xp.grant(
        &mut draft,
        config.xp.session_xp,
        XpSource::Session,
        json!({
            "level": session.level.as_str(),
            "activity": session.activity,
            "goal": session.goal,
        }),
    );
    if streaks.daily_current > 0 {
        xp.grant(
            &mut draft,
            levels::streak_bonus(
                streaks.daily_current,
                config.xp.streak_bonus_per_day,
                config.xp.streak_bonus_cap,
            ),
            XpSource::StreakBonus,
            json!({ "streak": streaks.daily_current }),
        );
    }
    xp.rewards(
        &mut draft,
        &completed_missions,
        &unlocked_badges,
        &completed_events,
    );

    draft.updated_at = Some(now);
    sanitize::repair(&mut draft, config);

    let level_up = level_change(level_before, draft.xp.level);
    if let Some(up) = level_up {
        info!(from = up.old_level, to = up.new_level, "Level up after session");
    }

    SessionOutcome {
        xp_grants: xp.grants,
        level_up,
        streaks,
        reminders: scheduled,
        assigned_missions,
        completed_missions,
        unlocked_badges,
        completed_events,
        state: draft,
    }
}

/// Owns the configuration, clock, randomness, topic cache and store for one
/// learner's state.
pub struct ProgressEngine<S: StateStore> {
    config: EngineConfig,
    calendar: Calendar,
    curve: LevelCurve,
    clock: Box<dyn Clock>,
    rng: Box<dyn RngCore>,
    store: S,
    key: String,
    topics: TopicCache,
}

impl<S: StateStore> ProgressEngine<S> {
    pub fn new(store: S, key: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            calendar: config.calendar(),
            curve: config.level_curve(),
            topics: TopicCache::from_settings(&config.cache),
            config,
            clock: Box::new(SystemClock),
            rng: Box::new(Mcg128Xsl64::from_entropy()),
            store,
            key: key.into(),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rng(mut self, rng: Box<dyn RngCore>) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn level_curve(&self) -> &LevelCurve {
        &self.curve
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn topic_cache(&self) -> &TopicCache {
        &self.topics
    }

    pub fn topic_cache_mut(&mut self) -> &mut TopicCache {
        &mut self.topics
    }

    /// Current sanitized state (read-only, nothing persisted)
    pub fn state(&self) -> Result<ProgressState, StoreError> {
        let raw = self.store.load(&self.key)?;
        Ok(sanitize::ensure(raw, &self.config))
    }

    /// Run `f` on the sanitized state inside one store transaction.
    ///
    /// A changed draft is stamped, repaired and saved before the lock is
    /// released; an unchanged one is not written. Returns `f`'s value and
    /// the resulting state.
    fn update<T>(
        &mut self,
        f: impl FnOnce(&mut ProgressState, &mut EngineContext<'_>, DateTime<Utc>) -> T,
    ) -> Result<(T, ProgressState), StoreError> {
        let now = self.now();
        let config = &self.config;
        let mut ctx = EngineContext {
            config,
            calendar: &self.calendar,
            curve: &self.curve,
            rng: &mut *self.rng,
        };

        let (value, state) = self.store.transaction(&self.key, |raw| {
            let mut state = sanitize::ensure(raw, config);
            let before = state.clone();
            let value = f(&mut state, &mut ctx, now);
            if state == before {
                return (None, (value, state));
            }
            state.updated_at = Some(now);
            sanitize::repair(&mut state, config);
            (Some(state.clone()), (value, state))
        })?;
        debug!(key = %self.key, "Progress transaction finished");
        Ok((value, state))
    }

    pub fn complete_session(&mut self, session: &Session) -> Result<SessionOutcome, StoreError> {
        let (mut outcome, state) = self.update(|state, ctx, now| {
            let outcome = apply_session(state, session, now, ctx);
            *state = outcome.state.clone();
            outcome
        })?;
        outcome.state = state;

        info!(
            activity = %session.activity,
            xp = outcome.xp_gained(),
            total = outcome.state.xp.total,
            "Session completed"
        );
        Ok(outcome)
    }

    /// Grant XP from an outside source. Invalid amounts are a no-op.
    pub fn grant_xp(
        &mut self,
        amount: f64,
        source: XpSource,
        metadata: Option<serde_json::Value>,
    ) -> Result<XpGrant, StoreError> {
        let (grant, _) = self.update(|state, ctx, now| {
            levels::grant_xp(
                &mut state.xp,
                ctx.curve,
                amount,
                source,
                metadata,
                now,
                ctx.config.xp.history_limit,
            )
        })?;
        Ok(grant)
    }

    pub fn record_minigame_result(
        &mut self,
        game: &str,
        score: u32,
        max_score: u32,
    ) -> Result<MinigameOutcome, StoreError> {
        let ((level_before, result, xp_grants, completed_missions, unlocked_badges), state) =
            self.update(|state, ctx, now| {
                let level_before = state.xp.level;

                let mut bytes = [0u8; 16];
                ctx.rng.fill_bytes(&mut bytes);
                let result = MinigameResult {
                    id: uuid::Builder::from_random_bytes(bytes).into_uuid().to_string(),
                    game: game.to_string(),
                    score,
                    max_score,
                    played_at: now,
                };
                minigames::record_minigame_result(
                    &mut state.minigames,
                    result.clone(),
                    ctx.config.minigames.history_limit,
                );
                state.totals.minigames += 1;

                let completed = missions::apply_minigame_to_missions(&mut state.missions, now);
                state.totals.missions_completed += completed.len() as u64;
                let context = BadgeContext::from_state(state);
                let unlocked = badges::evaluate_badges(&mut state.badges, &context, now);

                let mut xp = XpLedger::new(ctx.config, ctx.curve, now);
                if score > 0 {
                    xp.grant(
                        state,
                        ctx.config.xp.minigame_xp,
                        XpSource::Minigame,
                        json!({ "game": game, "score": score, "max_score": max_score }),
                    );
                }
                xp.rewards(state, &completed, &unlocked, &[]);

                (level_before, result, xp.grants, completed, unlocked)
            })?;
        debug!(game, score, max_score, "Recorded minigame result");

        Ok(MinigameOutcome {
            result,
            xp_grants,
            level_up: level_change(level_before, state.xp.level),
            completed_missions,
            unlocked_badges,
            state,
        })
    }

    /// Refill the mission pool for a learner at `level`. Returns new missions.
    pub fn ensure_daily_missions(
        &mut self,
        level: CefrLevel,
    ) -> Result<Vec<MissionProgress>, StoreError> {
        let (assigned, _) = self.update(|state, ctx, now| {
            missions::ensure_daily_missions(
                &mut state.missions,
                level,
                now,
                &mut *ctx.rng,
                &ctx.config.missions,
            )
        })?;
        Ok(assigned)
    }

    /// Refresh seasonal windows and statuses. Returns every tracked event.
    pub fn ensure_seasonal_events(&mut self) -> Result<Vec<SeasonalEventProgress>, StoreError> {
        let ((), state) = self.update(|state, ctx, now| {
            seasonal::ensure_seasonal_events(
                &mut state.seasonal_events,
                now,
                ctx.calendar,
                ctx.config.seasonal.reopen_completed,
            );
        })?;
        Ok(state.seasonal_events)
    }

    /// Unlock badges for an explicit context and grant their rewards.
    pub fn evaluate_badges(
        &mut self,
        context: &BadgeContext,
    ) -> Result<Vec<UnlockedBadge>, StoreError> {
        let (unlocked, _) = self.update(|state, ctx, now| {
            let unlocked = badges::evaluate_badges(&mut state.badges, context, now);
            let mut xp = XpLedger::new(ctx.config, ctx.curve, now);
            xp.rewards(state, &[], &unlocked, &[]);
            unlocked
        })?;
        Ok(unlocked)
    }

    pub fn badge_catalog(&self) -> Result<Vec<BadgeView>, StoreError> {
        Ok(badges::catalog(&self.state()?))
    }

    pub fn schedule_streak_reminder(
        &mut self,
        period: StreakPeriod,
        deadline: DateTime<Utc>,
        lead_hours: i64,
    ) -> Result<NotificationReminder, StoreError> {
        let (reminder, _) = self.update(|state, ctx, now| {
            reminders::schedule_streak_reminder(
                &mut state.reminders,
                period,
                deadline,
                lead_hours,
                now,
                ctx.config.reminders.min_delay(),
            )
        })?;
        Ok(reminder)
    }

    /// Show due reminders through `sink` and persist their delivery.
    /// Nothing is written when no reminder was delivered or dropped.
    pub fn deliver_due_reminders(
        &mut self,
        sink: &mut dyn NotificationSink,
    ) -> Result<Vec<NotificationReminder>, StoreError> {
        let (delivered, _) = self.update(|state, ctx, now| {
            reminders::deliver_due(&mut state.reminders, now, sink, ctx.config.reminders.retained)
        })?;
        Ok(delivered)
    }

    /// Replace the persisted state with a fresh one
    pub fn reset(&mut self) -> Result<ProgressState, StoreError> {
        let now = self.now();
        let mut state = ProgressState::default();
        state.updated_at = Some(now);
        sanitize::repair(&mut state, &self.config);

        self.store
            .transaction(&self.key, |_| (Some(state.clone()), ()))?;
        self.topics.clear();
        info!(key = %self.key, "Progress reset");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::calendar::ManualClock;
    use crate::progress::missions::MissionStatus;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
    }

    fn engine() -> (ProgressEngine<MemoryStore>, ManualClock) {
        let clock = ManualClock::new(start());
        let mut config = EngineConfig::default();
        config.utc_offset_minutes = Some(0);
        let engine = ProgressEngine::new(MemoryStore::new(), "learner", config)
            .with_clock(Box::new(clock.clone()))
            .with_rng(Box::new(Mcg128Xsl64::seed_from_u64(3)));
        (engine, clock)
    }

    fn session() -> Session {
        Session::new(CefrLevel::B1, "conversation", "travel")
    }

    #[test]
    fn test_first_session_flow() {
        let (mut engine, _clock) = engine();
        let outcome = engine.complete_session(&session()).unwrap();

        assert_eq!(outcome.streaks.daily_current, 1);
        assert_eq!(outcome.state.totals.sessions, 1);
        assert_eq!(outcome.assigned_missions.len(), 3);
        assert_eq!(outcome.reminders.len(), 2);
        assert!(
            outcome
                .unlocked_badges
                .iter()
                .any(|b| b.id == badges::BadgeId::FirstSession)
        );
        assert_eq!(outcome.xp_grants[0].source, XpSource::Session);
        assert_eq!(outcome.xp_grants[0].amount, 10);
        assert_eq!(outcome.xp_grants[1].source, XpSource::StreakBonus);
        assert_eq!(outcome.xp_grants[1].amount, 2);

        // Persisted
        let state = engine.state().unwrap();
        assert_eq!(state, outcome.state);
        assert_eq!(state.xp.total, outcome.xp_gained());
        assert_eq!(state.active_missions().count() + outcome.completed_missions.len(), 3);
    }

    #[test]
    fn test_same_day_sessions_keep_streak() {
        let (mut engine, clock) = engine();
        engine.complete_session(&session()).unwrap();
        clock.advance(Duration::hours(3));
        let outcome = engine.complete_session(&session()).unwrap();

        assert_eq!(outcome.streaks.daily, None);
        assert_eq!(outcome.state.streaks.daily.current, 1);
        assert_eq!(outcome.state.totals.sessions, 2);
        assert_eq!(outcome.state.pending_reminders().count(), 2);
    }

    #[test]
    fn test_apply_session_leaves_input_untouched() {
        let state = ProgressState::default();
        let config = EngineConfig::default();
        let calendar = Calendar::utc();
        let curve = config.level_curve();
        let mut rng = Mcg128Xsl64::seed_from_u64(1);
        let mut ctx = EngineContext {
            config: &config,
            calendar: &calendar,
            curve: &curve,
            rng: &mut rng,
        };

        let outcome = apply_session(&state, &session(), start(), &mut ctx);
        assert_eq!(state, ProgressState::default());
        assert_eq!(outcome.state.totals.sessions, 1);
        assert_eq!(outcome.state.updated_at, Some(start()));
    }

    #[test]
    fn test_grant_xp_rejects_invalid_amounts() {
        let (mut engine, _clock) = engine();
        engine.grant_xp(120.4, XpSource::Manual, None).unwrap();

        for amount in [-5.0, 0.0, f64::NAN, f64::INFINITY] {
            let grant = engine.grant_xp(amount, XpSource::Manual, None).unwrap();
            assert_eq!(grant.amount, 0);
            assert_eq!(grant.total, 120);
        }
        let state = engine.state().unwrap();
        assert_eq!(state.xp.total, 120);
        assert_eq!(state.xp.level, 2);
        assert_eq!(state.xp.history.len(), 1);
    }

    #[test]
    fn test_minigame_results_capped_and_rewarded() {
        let (mut engine, clock) = engine();
        for n in 0..55 {
            clock.advance(Duration::minutes(1));
            engine.record_minigame_result("word-match", n, 10).unwrap();
        }

        let state = engine.state().unwrap();
        assert_eq!(state.minigames.len(), 50);
        assert_eq!(state.minigames[0].score, 5);
        assert_eq!(state.minigames[49].score, 54);
        assert_eq!(state.totals.minigames, 55);
        // First result scored zero and earned nothing
        let minigame_xp: u64 = state
            .xp
            .history
            .iter()
            .filter(|e| e.source == XpSource::Minigame)
            .map(|e| e.amount)
            .sum();
        assert_eq!(minigame_xp, 54 * 5);
    }

    #[test]
    fn test_evaluate_badges_is_idempotent() {
        let (mut engine, _clock) = engine();
        let context = BadgeContext {
            level: 5,
            total_sessions: 1,
            daily_streak: 3,
            missions_completed: 0,
        };
        let first = engine.evaluate_badges(&context).unwrap();
        assert_eq!(first.len(), 3);
        assert!(engine.evaluate_badges(&context).unwrap().is_empty());

        let unlocked = engine
            .badge_catalog()
            .unwrap()
            .into_iter()
            .filter(|v| v.is_unlocked())
            .count();
        assert_eq!(unlocked, 3);
        assert_eq!(engine.state().unwrap().xp.total, 25 + 10 + 15);
    }

    #[test]
    fn test_deliver_due_reminders_through_engine() {
        struct Count(usize);
        impl NotificationSink for Count {
            fn show(&mut self, _: &reminders::Notification) -> anyhow::Result<()> {
                self.0 += 1;
                Ok(())
            }
        }

        let (mut engine, clock) = engine();
        engine.complete_session(&session()).unwrap();

        let mut sink = Count(0);
        assert!(engine.deliver_due_reminders(&mut sink).unwrap().is_empty());

        // Daily reminder fires at 20:00 the same day
        clock.set(Utc.with_ymd_and_hms(2024, 7, 1, 20, 30, 0).unwrap());
        let delivered = engine.deliver_due_reminders(&mut sink).unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].payload.period, StreakPeriod::Daily);
        assert_eq!(sink.0, 1);
    }

    #[test]
    fn test_extreme_lead_hours_do_not_panic() {
        let (mut engine, _clock) = engine();
        let deadline = Utc.with_ymd_and_hms(2024, 7, 2, 0, 0, 0).unwrap();

        for lead_hours in [i64::MAX, i64::MIN] {
            let reminder = engine
                .schedule_streak_reminder(StreakPeriod::Daily, deadline, lead_hours)
                .unwrap();
            assert_eq!(reminder.scheduled_for, start() + Duration::minutes(5));
        }
        assert_eq!(engine.state().unwrap().pending_reminders().count(), 1);
    }

    #[test]
    fn test_out_of_range_config_falls_back() {
        let mut config = EngineConfig::default();
        config.utc_offset_minutes = Some(0);
        config.missions.expiry_hours = i64::MAX / 1000;
        config.reminders.min_delay_minutes = i64::MAX;
        config.cache.topic_ttl_minutes = i64::MAX;
        config.levels.max_level = u32::MAX;
        let mut engine = ProgressEngine::new(MemoryStore::new(), "learner", config)
            .with_clock(Box::new(ManualClock::new(start())))
            .with_rng(Box::new(Mcg128Xsl64::seed_from_u64(3)));

        let outcome = engine.complete_session(&session()).unwrap();
        assert_eq!(outcome.assigned_missions.len(), 3);
        assert!(
            outcome
                .assigned_missions
                .iter()
                .all(|m| m.expires_at == Some(start() + Duration::hours(24)))
        );
        assert_eq!(engine.level_curve().max_level(), levels::MAX_LEVEL_CAP);
    }

    #[test]
    fn test_idle_delivery_writes_nothing() {
        struct Silent;
        impl NotificationSink for Silent {
            fn show(&mut self, _: &reminders::Notification) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let (mut engine, clock) = engine();
        assert!(engine.deliver_due_reminders(&mut Silent).unwrap().is_empty());
        assert_eq!(engine.state().unwrap().updated_at, None);

        engine.complete_session(&session()).unwrap();
        clock.advance(Duration::hours(1));
        assert!(engine.deliver_due_reminders(&mut Silent).unwrap().is_empty());
        assert_eq!(engine.state().unwrap().updated_at, Some(start()));
    }

    #[test]
    fn test_reset_clears_state() {
        let (mut engine, _clock) = engine();
        engine.complete_session(&session()).unwrap();
        engine
            .topic_cache_mut()
            .insert(CefrLevel::B1, "conversation", vec!["food".into()], start());

        let fresh = engine.reset().unwrap();
        assert_eq!(fresh.xp.total, 0);
        assert!(engine.state().unwrap().missions.is_empty());
        assert!(engine.topic_cache().is_empty());
    }

    #[test]
    fn test_expired_missions_replaced_next_day() {
        let (mut engine, clock) = engine();
        let first = engine.complete_session(&session()).unwrap();
        clock.advance(Duration::hours(25));
        let second = engine.complete_session(&session()).unwrap();

        assert_eq!(second.streaks.daily_current, 2);
        assert!(
            second
                .state
                .missions
                .iter()
                .all(|m| m.status != MissionStatus::Expired)
        );
        let old_ids: Vec<_> = first.assigned_missions.iter().map(|m| &m.id).collect();
        assert!(
            second
                .state
                .active_missions()
                .all(|m| !old_ids.contains(&&m.id))
        );
    }
}
