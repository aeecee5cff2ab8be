//! Lifecycle vocabulary for the monitor: game modes, the state machine's
//! states, and the named timers that gate its transitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::errors::BotError;

/// Which queue the bot drives. Chosen once at startup, immutable for the
/// process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    OneVsOne,
    TwoVsTwo,
    TrophyRoad,
}

impl GameMode {
    /// Parse the interactive menu choice (`1`, `2` or `3`). Anything else
    /// is an invalid selection the prompt loop retries on.
    pub fn from_menu_choice(choice: &str) -> Result<Self, BotError> {
        match choice.trim() {
            "1" => Ok(GameMode::OneVsOne),
            "2" => Ok(GameMode::TwoVsTwo),
            "3" => Ok(GameMode::TrophyRoad),
            other => Err(BotError::InvalidMode(format!(
                "expected 1, 2 or 3, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::OneVsOne => "1v1",
            GameMode::TwoVsTwo => "2v2",
            GameMode::TrophyRoad => "1v1 trophy road",
        };
        write!(f, "{name}")
    }
}

/// The lifecycle state the monitor believes the game is in. Exactly one
/// is active per tick; transitions come from sensor evidence only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Nothing recognizable on screen (loading, transition, popup).
    Unknown,
    /// Main menu detected, a launch has been issued or is imminent.
    NotInBattle,
    /// The in-battle HUD is (or was very recently) visible.
    InBattle,
    /// In-battle detection has been gone past the stability window; the
    /// results screen has not shown a completion marker yet.
    BattleEndedWaitingForResults,
    BattleComplete1v1,
    BattleComplete2v2,
    BattleComplete1v1TrophyRoad,
    /// A completion click went out; expecting the main menu next.
    ReturningToMenu,
}

impl GameState {
    pub fn is_battle_complete(self) -> bool {
        matches!(
            self,
            GameState::BattleComplete1v1
                | GameState::BattleComplete2v2
                | GameState::BattleComplete1v1TrophyRoad
        )
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameState::Unknown => "unknown",
            GameState::NotInBattle => "not_in_battle",
            GameState::InBattle => "in_battle",
            GameState::BattleEndedWaitingForResults => "battle_ended_waiting_for_results",
            GameState::BattleComplete1v1 => "battle_complete_1v1",
            GameState::BattleComplete2v2 => "battle_complete_2v2",
            GameState::BattleComplete1v1TrophyRoad => "battle_complete_1v1_trophy_road",
            GameState::ReturningToMenu => "returning_to_menu",
        };
        write!(f, "{name}")
    }
}

/// Named timestamps owned by the monitor loop. Each represents "when X
/// last happened" and is cleared as soon as its condition lapses.
#[derive(Debug, Clone, Copy)]
pub struct Timers {
    /// When the current search for a game began (process start, or the
    /// last return to the menu).
    pub finding_game_since: Instant,
    /// When the current battle was first detected.
    pub battle_started_at: Option<Instant>,
    /// When the battle button was last successfully clicked.
    pub last_battle_click: Option<Instant>,
    /// When the screen stopped being recognizable.
    pub unknown_since: Option<Instant>,
    /// First tick of the current in-battle detection gap.
    pub battle_signal_lost_at: Option<Instant>,
    pub last_heartbeat: Instant,
    pub last_stats_report: Instant,
}

impl Timers {
    pub fn new(now: Instant) -> Self {
        Self {
            finding_game_since: now,
            battle_started_at: None,
            last_battle_click: None,
            unknown_since: None,
            battle_signal_lost_at: None,
            last_heartbeat: now,
            last_stats_report: now,
        }
    }
}
