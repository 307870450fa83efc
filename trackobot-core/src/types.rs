//! Core domain types for trackobot
//!
//! | Term | Definition |
//! |------|------------|
//! | **MatchResult** | Outcome of one completed game, as reported by the observer |
//! | **QueuedResult** | Validated wire form of a MatchResult; the only thing ever persisted |
//! | **Coin** | Sentinel card (`GAME_005`) whose first appearance reveals turn order |
//!
//! Every observer-facing enum carries an `Unknown` variant: the observer
//! scrapes the game and may miss things. A [`QueuedResult`] can only be built
//! from a record where none of the mandatory fields are unknown.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Card id of The Coin, handed to whoever goes second
pub const COIN_CARD_ID: &str = "GAME_005";

// ============================================
// Observer vocabulary
// ============================================

/// Game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Ranked,
    Casual,
    Arena,
    Practice,
    SoloAdventures,
    TavernBrawl,
    #[default]
    Unknown,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Ranked => "ranked",
            GameMode::Casual => "casual",
            GameMode::Arena => "arena",
            GameMode::Practice => "practice",
            GameMode::SoloAdventures => "solo_adventures",
            GameMode::TavernBrawl => "tavern_brawl",
            GameMode::Unknown => "unknown",
        }
    }
}

/// Match outcome from the player's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
    #[default]
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
            Outcome::Unknown => "unknown",
        }
    }
}

/// Whether the player moved first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnOrder {
    First,
    Second,
    #[default]
    Unknown,
}

impl TurnOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOrder::First => "first",
            TurnOrder::Second => "second",
            TurnOrder::Unknown => "unknown",
        }
    }
}

/// Hero class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeroClass {
    Priest,
    Rogue,
    Mage,
    Paladin,
    Warrior,
    Warlock,
    Hunter,
    Shaman,
    Druid,
    #[default]
    Unknown,
}

impl HeroClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeroClass::Priest => "priest",
            HeroClass::Rogue => "rogue",
            HeroClass::Mage => "mage",
            HeroClass::Paladin => "paladin",
            HeroClass::Warrior => "warrior",
            HeroClass::Warlock => "warlock",
            HeroClass::Hunter => "hunter",
            HeroClass::Shaman => "shaman",
            HeroClass::Druid => "druid",
            HeroClass::Unknown => "unknown",
        }
    }
}

/// Who played a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Player {
    #[serde(rename = "self")]
    Me,
    Opponent,
}

/// One entry of the observed card history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPlay {
    pub player: Player,
    pub card_id: String,
    /// Turn the card was played on, when the observer tracked it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<u32>,
}

impl CardPlay {
    pub fn new(player: Player, card_id: impl Into<String>) -> Self {
        Self {
            player,
            card_id: card_id.into(),
            turn: None,
        }
    }
}

/// A completed match as reported by the observer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MatchResult {
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub outcome: Outcome,
    #[serde(default)]
    pub order: TurnOrder,
    #[serde(default)]
    pub hero: HeroClass,
    #[serde(default)]
    pub opponent: HeroClass,
    #[serde(default)]
    pub card_history: Vec<CardPlay>,
    /// Ladder rank (ranked mode only)
    #[serde(default)]
    pub rank: Option<u32>,
    /// Legend rank (ranked mode only)
    #[serde(default)]
    pub legend: Option<u32>,
    /// Match length in seconds
    #[serde(default)]
    pub duration: Option<u32>,
}

impl MatchResult {
    pub fn new(
        mode: GameMode,
        outcome: Outcome,
        order: TurnOrder,
        hero: HeroClass,
        opponent: HeroClass,
    ) -> Self {
        Self {
            mode,
            outcome,
            order,
            hero,
            opponent,
            ..Default::default()
        }
    }

    pub fn with_history(mut self, card_history: Vec<CardPlay>) -> Self {
        self.card_history = card_history;
        self
    }

    /// Turn order implied by the first coin in the card history.
    ///
    /// Whoever plays the coin went second.
    pub fn order_from_coin(&self) -> Option<TurnOrder> {
        self.card_history
            .iter()
            .find(|play| play.card_id == COIN_CARD_ID)
            .map(|play| match play.player {
                Player::Me => TurnOrder::Second,
                Player::Opponent => TurnOrder::First,
            })
    }
}

// ============================================
// Validation
// ============================================

/// Mandatory field of a match result, in the order they are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Outcome,
    Mode,
    Order,
    Hero,
    Opponent,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::Outcome => "outcome",
            Field::Mode => "mode",
            Field::Order => "order",
            Field::Hero => "own class",
            Field::Opponent => "class of opponent",
        };
        f.write_str(name)
    }
}

/// Why a match result was not queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The mode is never tracked (or not in this build)
    #[error("ignoring {} game", .0.as_str())]
    Filtered(GameMode),

    /// A mandatory field was not observed
    #[error("{0} unknown, skipping result")]
    Missing(Field),
}

// ============================================
// Wire format
// ============================================

/// Card history entry as sent to the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCard {
    /// `"me"` or `"opponent"`
    pub player: WireSide,
    pub card_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireSide {
    Me,
    Opponent,
}

impl From<&CardPlay> for WireCard {
    fn from(play: &CardPlay) -> Self {
        WireCard {
            player: match play.player {
                Player::Me => WireSide::Me,
                Player::Opponent => WireSide::Opponent,
            },
            card_id: play.card_id.clone(),
            turn: play.turn,
        }
    }
}

/// A validated match result in the shape the service accepts.
///
/// This is what the queue holds and what gets persisted under `resultsQueue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedResult {
    /// We went second (and got the coin)
    pub coin: bool,
    pub hero: HeroClass,
    pub opponent: HeroClass,
    pub win: bool,
    pub mode: GameMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<u32>,
    pub card_history: Vec<WireCard>,
}

impl QueuedResult {
    /// Whether every mandatory field holds a known value.
    ///
    /// Always true for values built from a [`MatchResult`]; persisted data is
    /// checked with this on load.
    pub fn is_complete(&self) -> bool {
        self.hero != HeroClass::Unknown
            && self.opponent != HeroClass::Unknown
            && !matches!(
                self.mode,
                GameMode::Unknown | GameMode::SoloAdventures | GameMode::TavernBrawl
            )
    }

    /// Short content hash used to correlate a result across log lines
    pub fn fingerprint(&self) -> String {
        let content = serde_json::to_string(self).unwrap_or_default();
        let digest = Sha256::digest(content.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl TryFrom<&MatchResult> for QueuedResult {
    type Error = Rejection;

    fn try_from(result: &MatchResult) -> Result<Self, Self::Error> {
        match result.mode {
            GameMode::SoloAdventures | GameMode::TavernBrawl => {
                return Err(Rejection::Filtered(result.mode))
            }
            _ => {}
        }

        if result.outcome == Outcome::Unknown {
            return Err(Rejection::Missing(Field::Outcome));
        }
        if result.mode == GameMode::Unknown {
            return Err(Rejection::Missing(Field::Mode));
        }
        if result.order == TurnOrder::Unknown {
            return Err(Rejection::Missing(Field::Order));
        }
        if result.hero == HeroClass::Unknown {
            return Err(Rejection::Missing(Field::Hero));
        }
        if result.opponent == HeroClass::Unknown {
            return Err(Rejection::Missing(Field::Opponent));
        }

        // Rank and legend rank only mean something on the ladder, and a
        // legend rank supersedes the regular rank.
        let ranked = result.mode == GameMode::Ranked;
        let legend = result.legend.filter(|legend| ranked && *legend > 0);
        let rank = result
            .rank
            .filter(|rank| ranked && *rank > 0 && legend.is_none());

        Ok(QueuedResult {
            coin: result.order == TurnOrder::Second,
            hero: result.hero,
            opponent: result.opponent,
            win: result.outcome == Outcome::Victory,
            mode: result.mode,
            duration: result.duration.filter(|secs| *secs > 0),
            rank,
            legend,
            card_history: result.card_history.iter().map(WireCard::from).collect(),
        })
    }
}
