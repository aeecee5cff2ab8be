//! The monitoring state machine: one polling loop that classifies the
//! current screen into a [`GameState`] each tick, performs the action
//! that state calls for, and keeps completion statistics.
//!
//! The sensor gives no events, only point-in-time lookups that flicker.
//! Every transition here is therefore gated on debounce or stability
//! windows; a single odd frame must never change what the bot does.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::actuator::{click_jittered, random_pause, Actuator, ClickRetry, Jitter};
use crate::marker::{Marker, MarkerQuery};
use crate::sensor::{Point, ScreenSensor};
use crate::state::{GameMode, GameState, Timers};
use crate::stats::{format_duration, RunStats};

/// Every interval, window and click offset the loop uses.
#[derive(Debug, Clone, Copy)]
pub struct MonitorConfig {
    /// Pause between polling ticks.
    pub tick_interval: Duration,
    /// Runtime heartbeat cadence.
    pub heartbeat_every: Duration,
    /// Aggregate statistics report cadence.
    pub stats_every: Duration,
    /// How long in-battle detection must stay absent before the battle
    /// is considered over.
    pub battle_lost_window: Duration,
    /// Suppress battle-button clicks this long after a successful one.
    pub battle_click_debounce: Duration,
    /// Ignore the battle button while `Unknown` is younger than this
    /// (transition frames show false positives).
    pub unknown_menu_grace: Duration,
    /// Demote a battle-complete state to `Unknown` after this long with
    /// nothing on screen resolving it.
    pub stale_complete_window: Duration,
    /// In trophy-road mode, probe for the OK button once `Unknown` has
    /// persisted this long.
    pub fallback_probe_after: Duration,
    /// Screen-transition pause after a completion click.
    pub transition_pause: Duration,
    /// Pause when the battle button shows right after a completion.
    pub post_complete_pause: Duration,
    /// Pauses between the two card placements.
    pub first_card_pause: Duration,
    pub second_card_pause: Duration,
    /// Pause after the primary launch click.
    pub launch_pause: Duration,
    /// Min/max randomized pause after the 2v2 queue-select click.
    pub duo_select_pause: (Duration, Duration),
    /// First card placement, relative to the in-battle marker.
    pub card_click_offset: (i32, i32),
    /// Second card placement, relative to the first.
    pub second_card_lift: i32,
    /// Launch click, relative to the battle button.
    pub launch_click_lift: i32,
    /// 2v2 queue-select click, relative to the battle button.
    pub duo_click_offset: (i32, i32),
    /// Completion click, relative to the OK button.
    pub ok_click_offset: (i32, i32),
    /// Looser confidence used when re-locating the battle button to
    /// click it.
    pub launch_threshold: f32,
    pub click_retry: ClickRetry,
    pub jitter: Jitter,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            heartbeat_every: Duration::from_secs(10),
            stats_every: Duration::from_secs(40),
            battle_lost_window: Duration::from_secs(5),
            battle_click_debounce: Duration::from_secs(5),
            unknown_menu_grace: Duration::from_secs(3),
            stale_complete_window: Duration::from_secs(5),
            fallback_probe_after: Duration::from_secs(10),
            transition_pause: Duration::from_secs(2),
            post_complete_pause: Duration::from_secs(1),
            first_card_pause: Duration::from_secs(2),
            second_card_pause: Duration::from_secs(1),
            launch_pause: Duration::from_secs(1),
            duo_select_pause: (Duration::from_secs(1), Duration::from_secs(2)),
            card_click_offset: (300, -100),
            second_card_lift: -300,
            launch_click_lift: -200,
            duo_click_offset: (150, -400),
            ok_click_offset: (-30, 0),
            launch_threshold: 0.6,
            click_retry: ClickRetry::default(),
            jitter: Jitter::default(),
        }
    }
}

/// The match state machine. Owns all mutable state of the run; the
/// sensor and actuator are injected so the loop can be driven against
/// fakes.
pub struct Monitor {
    sensor: Arc<dyn ScreenSensor>,
    actuator: Arc<dyn Actuator>,
    mode: GameMode,
    config: MonitorConfig,
    state: GameState,
    timers: Timers,
    stats: RunStats,
}

impl Monitor {
    pub fn new(sensor: Arc<dyn ScreenSensor>, actuator: Arc<dyn Actuator>, mode: GameMode) -> Self {
        Self::with_config(sensor, actuator, mode, MonitorConfig::default())
    }

    pub fn with_config(
        sensor: Arc<dyn ScreenSensor>,
        actuator: Arc<dyn Actuator>,
        mode: GameMode,
        config: MonitorConfig,
    ) -> Self {
        let now = Instant::now();
        Self {
            sensor,
            actuator,
            mode,
            config,
            state: GameState::Unknown,
            timers: Timers::new(now),
            stats: RunStats::new(now),
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: GameState) {
        self.state = state;
    }

    /// Poll until the process is killed.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn run(&mut self) {
        info!(mode = %self.mode, "monitor started");
        loop {
            self.tick().await;
            sleep(self.config.tick_interval).await;
        }
    }

    /// One full observe-classify-act cycle.
    pub async fn tick(&mut self) {
        let now = Instant::now();
        self.emit_periodic_reports(now);

        // The unknown timestamp only survives while the screen is
        // unrecognized or a completion is waiting to resolve.
        if self.state != GameState::Unknown && !self.state.is_battle_complete() {
            self.timers.unknown_since = None;
        }

        match self.probe(Marker::InBattle.query()).await {
            Some(location) => self.on_battle_signal(location, now).await,
            None if self.state == GameState::InBattle => self.on_battle_signal_lost(now),
            None => self.classify_idle(now).await,
        }
    }

    fn emit_periodic_reports(&mut self, now: Instant) {
        if now - self.timers.last_heartbeat >= self.config.heartbeat_every {
            let runtime = now - self.stats.started_at();
            info!("bot has been running for {}", format_duration(runtime));
            self.timers.last_heartbeat = now;
        }
        if now - self.timers.last_stats_report >= self.config.stats_every {
            self.stats.report(now).log();
            self.timers.last_stats_report = now;
        }
    }

    /// The in-battle marker is visible: refresh stability tracking,
    /// enter the battle state if needed, and place cards.
    async fn on_battle_signal(&mut self, location: Point, now: Instant) {
        self.timers.battle_signal_lost_at = None;

        if self.state != GameState::InBattle {
            let waited = now - self.timers.finding_game_since;
            info!(
                "battle detected, found a game in {:.2} seconds",
                waited.as_secs_f64()
            );
            self.stats.record_find(waited);
            self.set_state(GameState::InBattle);
            self.timers.battle_started_at = Some(now);
        }

        debug!("selecting and placing cards");
        let first = location.offset(
            self.config.card_click_offset.0,
            self.config.card_click_offset.1,
        );
        self.place_card(first).await;
        sleep(self.config.first_card_pause).await;

        let second = first.offset(0, self.config.second_card_lift);
        self.place_card(second).await;
        sleep(self.config.second_card_pause).await;
    }

    /// The in-battle marker is gone while we believe a battle is on.
    /// A single missed frame must not end the battle: only a continuous
    /// gap longer than the stability window does.
    fn on_battle_signal_lost(&mut self, now: Instant) {
        match self.timers.battle_signal_lost_at {
            None => {
                self.timers.battle_signal_lost_at = Some(now);
                info!("lost in-battle detection, waiting for stability");
            }
            Some(since) if now - since >= self.config.battle_lost_window => {
                info!(
                    "in-battle detection gone for {:.0}+ seconds, battle likely ended",
                    self.config.battle_lost_window.as_secs_f64()
                );
                self.set_state(GameState::BattleEndedWaitingForResults);
                self.timers.battle_signal_lost_at = None;
            }
            Some(_) => {}
        }
    }

    /// Not in a battle: walk the remaining markers in fixed priority
    /// order. First hit wins; at most one branch acts per tick.
    async fn classify_idle(&mut self, now: Instant) {
        if self.mode == GameMode::TwoVsTwo
            && self.probe(Marker::TwoVsTwoEnd.query()).await.is_some()
        {
            self.on_duo_end(now).await;
            return;
        }

        if self.mode == GameMode::TrophyRoad && self.probe(Marker::PlayAgain.query()).await.is_some()
        {
            self.on_play_again(now).await;
            return;
        }

        if self.probe(Marker::OkButton.query()).await.is_some() {
            self.on_ok_button(now).await;
            return;
        }

        if let Some(location) = self.probe(Marker::BattleButton.query()).await {
            self.on_battle_button(location, now).await;
            return;
        }

        self.on_nothing_recognized(now).await;
    }

    /// 2v2 results screen. Bookkeeping and click are both one-shot: once
    /// the completion is recorded, later sightings of the marker do
    /// nothing until the state moves on.
    async fn on_duo_end(&mut self, now: Instant) {
        if self.state.is_battle_complete() {
            return;
        }
        self.complete_battle(GameState::BattleComplete2v2, now);

        info!("clicking 2v2 end button");
        self.retry_click(Marker::TwoVsTwoEnd.query(), (0, 0)).await;
        sleep(self.config.transition_pause).await;
        self.return_to_menu();
    }

    /// Trophy-road results screen. Unlike the 2v2 end button, the click
    /// is repeated every tick the marker stays visible.
    async fn on_play_again(&mut self, now: Instant) {
        if !self.state.is_battle_complete() {
            self.complete_battle(GameState::BattleComplete1v1TrophyRoad, now);
        }

        info!("clicking play-again button");
        self.retry_click(Marker::PlayAgain.query(), (0, 0)).await;
        sleep(self.config.transition_pause).await;
        self.return_to_menu();
    }

    /// Generic 1v1 end screen; also the landing spot for the trophy-road
    /// fallback probe.
    async fn on_ok_button(&mut self, now: Instant) {
        if !self.state.is_battle_complete() {
            self.complete_battle(GameState::BattleComplete1v1, now);
        }

        info!("clicking OK button to return to the main menu");
        self.retry_click(Marker::OkButton.query(), self.config.ok_click_offset)
            .await;
        sleep(self.config.transition_pause).await;
        self.return_to_menu();
    }

    /// The main-menu battle button is visible. Three suppression rules
    /// guard against spurious relaunches before anything is clicked.
    async fn on_battle_button(&mut self, _location: Point, now: Instant) {
        if self.state.is_battle_complete() {
            // A completion marker should resolve this screen first.
            debug!("battle button visible right after a completion, waiting for the results screen");
            sleep(self.config.post_complete_pause).await;
            return;
        }

        if let Some(last) = self.timers.last_battle_click {
            if now - last < self.config.battle_click_debounce {
                // Probably still on a loading or transition frame.
                return;
            }
        }

        if self.state == GameState::Unknown {
            if let Some(since) = self.timers.unknown_since {
                if now - since < self.config.unknown_menu_grace {
                    // Transition frames show false battle buttons.
                    return;
                }
            }
        }

        if self.state != GameState::NotInBattle {
            info!("main menu detected, launching a new game");
            self.set_state(GameState::NotInBattle);
            if self.launch_battle().await {
                self.timers.last_battle_click = Some(Instant::now());
            } else {
                info!("battle launch did not land, will retry next tick");
            }
            self.timers.finding_game_since = Instant::now();
        }
    }

    /// Nothing recognizable on screen.
    async fn on_nothing_recognized(&mut self, now: Instant) {
        match self.state {
            GameState::Unknown => {}
            state if state.is_battle_complete() => match self.timers.unknown_since {
                None => self.timers.unknown_since = Some(now),
                Some(since) if now - since > self.config.stale_complete_window => {
                    info!("completion state went stale, resetting to allow menu detection");
                    self.set_state(GameState::Unknown);
                    self.timers.unknown_since = Some(now);
                }
                Some(_) => {}
            },
            _ => {
                info!("unknown or loading screen");
                self.set_state(GameState::Unknown);
                self.timers.unknown_since = Some(now);
            }
        }

        // Safety net for trophy road: a missed play-again detection can
        // strand the bot on the OK screen, so after a long unknown spell
        // probe for the OK button directly.
        if self.mode == GameMode::TrophyRoad && self.state == GameState::Unknown {
            let Some(since) = self.timers.unknown_since else {
                return;
            };
            if now - since <= self.config.fallback_probe_after {
                return;
            }
            if self.probe(Marker::OkButton.query()).await.is_some() {
                info!("unknown state persisted, found the OK button as a fallback");
                if !self.state.is_battle_complete() {
                    self.complete_battle(GameState::BattleComplete1v1, now);
                }
                info!("clicking OK button to return to the main menu");
                self.retry_click(Marker::OkButton.query(), self.config.ok_click_offset)
                    .await;
                sleep(self.config.transition_pause).await;
                self.return_to_menu();
                self.timers.unknown_since = None;
            }
        }
    }

    /// Record a completed battle. Counters update strictly before the
    /// state transition and before any completion click goes out.
    fn complete_battle(&mut self, completed: GameState, now: Instant) {
        let fought = self
            .timers
            .battle_started_at
            .map(|started| now - started)
            .unwrap_or_default();
        info!(
            "battle finished, lasted {:.2} seconds",
            fought.as_secs_f64()
        );
        self.stats.record_completion(fought);
        info!("{} game(s) completed so far", self.stats.games_completed());
        self.set_state(completed);
    }

    /// The launch sequence: re-locate the button at a looser threshold,
    /// click above it, and for 2v2 add the queue-select click. Landing is
    /// judged by the button no longer resolving afterwards.
    async fn launch_battle(&mut self) -> bool {
        let query = Marker::BattleButton
            .query()
            .with_threshold(self.config.launch_threshold);
        let Some(location) = self.probe(query).await else {
            info!("battle button not found when trying to click");
            return false;
        };

        info!("clicking the main battle button");
        self.click(location.offset(0, self.config.launch_click_lift))
            .await;
        sleep(self.config.launch_pause).await;

        if self.mode == GameMode::TwoVsTwo {
            info!("selecting the 2v2 queue with an additional click");
            self.click(location.offset(
                self.config.duo_click_offset.0,
                self.config.duo_click_offset.1,
            ))
            .await;
            let pause = random_pause(self.config.duo_select_pause);
            sleep(pause).await;
        }

        if self.probe(query).await.is_none() {
            info!("battle button click landed, searching for a game");
            true
        } else {
            info!("battle button still visible after click");
            false
        }
    }

    fn return_to_menu(&mut self) {
        self.set_state(GameState::ReturningToMenu);
        self.timers.finding_game_since = Instant::now();
    }

    async fn place_card(&mut self, target: Point) {
        match click_jittered(self.actuator.as_ref(), target, self.config.jitter).await {
            Ok(()) => self.stats.record_card(),
            Err(err) => warn!(%err, "card placement click failed"),
        }
    }

    async fn click(&self, target: Point) {
        if let Err(err) = click_jittered(self.actuator.as_ref(), target, self.config.jitter).await {
            warn!(%err, "click dispatch failed");
        }
    }

    async fn retry_click(&self, query: MarkerQuery, offset: (i32, i32)) -> bool {
        self.config
            .click_retry
            .run(
                self.sensor.as_ref(),
                self.actuator.as_ref(),
                &query,
                offset,
                self.config.jitter,
            )
            .await
    }

    async fn probe(&self, query: MarkerQuery) -> Option<Point> {
        self.sensor.detect(&query).await.location
    }

    fn set_state(&mut self, next: GameState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
    }
}
