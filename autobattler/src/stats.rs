//! Run statistics: counters accumulated by the monitor for its entire
//! process lifetime, and the periodic aggregate report built from them.

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

/// Counters owned by the monitor loop. Mutated only by the loop, never
/// reset except at process start.
#[derive(Debug, Clone)]
pub struct RunStats {
    started_at: Instant,
    games_completed: u64,
    cards_placed: u64,
    find_times: Vec<Duration>,
    battle_durations: Vec<Duration>,
}

impl RunStats {
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            games_completed: 0,
            cards_placed: 0,
            find_times: Vec::new(),
            battle_durations: Vec::new(),
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn games_completed(&self) -> u64 {
        self.games_completed
    }

    pub fn cards_placed(&self) -> u64 {
        self.cards_placed
    }

    pub fn find_times(&self) -> &[Duration] {
        &self.find_times
    }

    pub fn battle_durations(&self) -> &[Duration] {
        &self.battle_durations
    }

    /// How long it took to get from the menu into this battle.
    pub fn record_find(&mut self, waited: Duration) {
        self.find_times.push(waited);
    }

    pub fn record_card(&mut self) {
        self.cards_placed += 1;
    }

    /// A battle finished; `fought` is zero when the battle start was
    /// never observed.
    pub fn record_completion(&mut self, fought: Duration) {
        self.battle_durations.push(fought);
        self.games_completed += 1;
    }

    /// Aggregate snapshot over the whole run so far.
    pub fn report(&self, now: Instant) -> StatsReport {
        let runtime = (now - self.started_at).as_secs_f64();
        let games = self.games_completed as f64;
        let per_second = if runtime > 0.0 { games / runtime } else { 0.0 };
        StatsReport {
            games_completed: self.games_completed,
            avg_find_secs: mean_secs(&self.find_times),
            avg_battle_secs: mean_secs(&self.battle_durations),
            avg_cards_per_game: if self.games_completed > 0 {
                self.cards_placed as f64 / games
            } else {
                0.0
            },
            games_per_hour: per_second * 3_600.0,
            games_per_day: per_second * 86_400.0,
            games_per_week: per_second * 86_400.0 * 7.0,
            games_per_month: per_second * 86_400.0 * 30.0,
        }
    }
}

fn mean_secs(samples: &[Duration]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(Duration::as_secs_f64).sum::<f64>() / samples.len() as f64
}

/// One aggregate statistics snapshot, as logged every reporting interval.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub games_completed: u64,
    pub avg_find_secs: f64,
    pub avg_battle_secs: f64,
    pub avg_cards_per_game: f64,
    pub games_per_hour: f64,
    pub games_per_day: f64,
    pub games_per_week: f64,
    pub games_per_month: f64,
}

impl StatsReport {
    pub fn log(&self) {
        info!("--------------------------------------------------");
        info!("current automation stats");
        info!("  games completed: {}", self.games_completed);
        info!("  avg game find time: {:.2}s", self.avg_find_secs);
        info!("  avg battle duration: {:.2}s", self.avg_battle_secs);
        info!("  avg cards per game: {:.2}", self.avg_cards_per_game);
        info!("  avg games per hour: {:.2}", self.games_per_hour);
        info!("  avg games per 24 hours: {:.2}", self.games_per_day);
        info!("  avg games per week: {:.2}", self.games_per_week);
        info!("  avg games per month: {:.2}", self.games_per_month);
        info!("--------------------------------------------------");
    }
}

/// Humanize a duration as "N days, N hours, N minutes, N seconds",
/// omitting leading zero parts but always including seconds.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days} day{}", plural(days)));
    }
    if hours > 0 {
        parts.push(format!("{hours} hour{}", plural(hours)));
    }
    if minutes > 0 {
        parts.push(format!("{minutes} minute{}", plural(minutes)));
    }
    parts.push(format!(
        "{seconds} second{}",
        if seconds == 1 { "" } else { "s" }
    ));

    parts.join(", ")
}

fn plural(count: u64) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
