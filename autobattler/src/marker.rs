//! The closed set of on-screen markers the bot recognizes, and the asset
//! catalog that maps them to reference images on disk.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::BotError;

/// A recognizable UI element, identified by a reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// The main-menu button that launches a new match.
    BattleButton,
    /// The post-battle confirmation button (generic 1v1 end screen).
    OkButton,
    /// The "play again" button on the trophy-road end screen.
    PlayAgain,
    /// The end-of-match button specific to 2v2 results.
    TwoVsTwoEnd,
    /// A HUD element only visible while a battle is running.
    InBattle,
}

impl Marker {
    pub const ALL: [Marker; 5] = [
        Marker::BattleButton,
        Marker::OkButton,
        Marker::PlayAgain,
        Marker::TwoVsTwoEnd,
        Marker::InBattle,
    ];

    /// File name of the reference image inside the assets directory.
    pub fn asset_file(self) -> &'static str {
        match self {
            Marker::BattleButton => "battle_button.png",
            Marker::OkButton => "ok.png",
            Marker::PlayAgain => "playagain.png",
            Marker::TwoVsTwoEnd => "2v2end.png",
            Marker::InBattle => "inbattle.png",
        }
    }

    /// Default recognition parameters for this marker.
    ///
    /// The in-battle HUD is matched strictly to keep the battle state
    /// stable; the OK button is matched loosely (and in grayscale)
    /// because the end screen varies a lot between match outcomes.
    pub fn query(self) -> MarkerQuery {
        match self {
            Marker::BattleButton => MarkerQuery::new(self, 0.7, false),
            Marker::OkButton => MarkerQuery::new(self, 0.5, true),
            Marker::PlayAgain => MarkerQuery::new(self, 0.8, false),
            Marker::TwoVsTwoEnd => MarkerQuery::new(self, 0.8, true),
            Marker::InBattle => MarkerQuery::new(self, 0.9, false),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Marker::BattleButton => "battle_button",
            Marker::OkButton => "ok_button",
            Marker::PlayAgain => "play_again",
            Marker::TwoVsTwoEnd => "2v2_end",
            Marker::InBattle => "in_battle",
        };
        write!(f, "{name}")
    }
}

/// One sensor lookup: which marker to find and how strictly to match it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerQuery {
    pub marker: Marker,
    /// Minimum match confidence in `0.0..=1.0`.
    pub threshold: f32,
    /// Match against a grayscale rendition of screen and template.
    pub grayscale: bool,
}

impl MarkerQuery {
    pub fn new(marker: Marker, threshold: f32, grayscale: bool) -> Self {
        Self {
            marker,
            threshold,
            grayscale,
        }
    }

    /// Override the confidence threshold for a specific call site.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Resolves markers to image files under a single assets directory.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    dir: PathBuf,
}

impl AssetCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, marker: Marker) -> PathBuf {
        self.dir.join(marker.asset_file())
    }

    /// Check every marker image on disk. The report lists both found and
    /// missing assets so the startup diagnostics can show a full status.
    pub fn verify(&self) -> AssetReport {
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for marker in Marker::ALL {
            let path = self.path(marker);
            if path.exists() {
                found.push((marker, path));
            } else {
                missing.push((marker, path));
            }
        }
        AssetReport { found, missing }
    }
}

/// Outcome of an asset-directory verification pass.
#[derive(Debug, Clone)]
pub struct AssetReport {
    pub found: Vec<(Marker, PathBuf)>,
    pub missing: Vec<(Marker, PathBuf)>,
}

impl AssetReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Fail with `AssetMissing` naming every absent file.
    pub fn into_result(self) -> Result<(), BotError> {
        if self.missing.is_empty() {
            return Ok(());
        }
        let files = self
            .missing
            .iter()
            .map(|(_, path)| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(BotError::AssetMissing(files))
    }
}
