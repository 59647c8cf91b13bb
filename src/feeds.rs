//! The fixed set of realtime feeds and the two-level line selection.
//!
//! Each feed groups several routes (e.g. `bdfm` carries the B, D, F and M).
//! A [`LineSelection`] picks one feed and optionally narrows it to a single
//! route inside it.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SelectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum FeedKey {
    #[serde(rename = "ace")]
    Ace,
    #[default]
    #[serde(rename = "bdfm")]
    Bdfm,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "jz")]
    Jz,
    #[serde(rename = "nqrw")]
    Nqrw,
    #[serde(rename = "l")]
    L,
    #[serde(rename = "1234567s")]
    Numbered,
    #[serde(rename = "sir")]
    Sir,
}

impl FeedKey {
    /// Every feed, in the order they are offered to the user.
    pub const ALL: [FeedKey; 8] = [
        FeedKey::Bdfm,
        FeedKey::Ace,
        FeedKey::G,
        FeedKey::Jz,
        FeedKey::L,
        FeedKey::Nqrw,
        FeedKey::Numbered,
        FeedKey::Sir,
    ];

    /// Path segment used when requesting the feed.
    pub fn key(self) -> &'static str {
        match self {
            FeedKey::Ace => "ace",
            FeedKey::Bdfm => "bdfm",
            FeedKey::G => "g",
            FeedKey::Jz => "jz",
            FeedKey::Nqrw => "nqrw",
            FeedKey::L => "l",
            FeedKey::Numbered => "1234567s",
            FeedKey::Sir => "sir",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedKey::Ace => "A C E",
            FeedKey::Bdfm => "B D F M",
            FeedKey::G => "G",
            FeedKey::Jz => "J Z",
            FeedKey::Nqrw => "N Q R W",
            FeedKey::L => "L",
            FeedKey::Numbered => "1 2 3 4 5 6 7",
            FeedKey::Sir => "Staten Island Railway",
        }
    }

    /// Routes that can be picked as a sub-line of this feed.
    ///
    /// The Staten Island Railway is a single line and offers none.
    pub fn sub_lines(self) -> &'static [char] {
        match self {
            FeedKey::Ace => &['A', 'C', 'E'],
            FeedKey::Bdfm => &['B', 'D', 'F', 'M'],
            FeedKey::G => &['G'],
            FeedKey::Jz => &['J', 'Z'],
            FeedKey::Nqrw => &['N', 'Q', 'R', 'W'],
            FeedKey::L => &['L'],
            FeedKey::Numbered => &['1', '2', '3', '4', '5', '6', '7', 'S'],
            FeedKey::Sir => &[],
        }
    }

    /// Request path for this feed's trip list.
    pub fn trips_path(self) -> String {
        format!("/{}", self.key())
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FeedKey {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FeedKey::ALL
            .into_iter()
            .find(|feed| feed.key() == wanted)
            .ok_or_else(|| SelectionError::UnknownFeed(s.to_string()))
    }
}

/// A feed plus an optional single route inside it (`None` means "all").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LineSelection {
    pub feed: FeedKey,
    pub sub_line: Option<char>,
}

impl LineSelection {
    pub fn new(feed: FeedKey) -> Self {
        Self {
            feed,
            sub_line: None,
        }
    }

    /// Narrows the selection to `line`, which must belong to the feed.
    pub fn with_sub_line(self, line: Option<char>) -> Result<Self, SelectionError> {
        let line = line.map(|c| c.to_ascii_uppercase());
        if let Some(c) = line {
            if !self.feed.sub_lines().contains(&c) {
                return Err(SelectionError::UnknownSubLine {
                    feed: self.feed.to_string(),
                    line: c.to_string(),
                });
            }
        }
        Ok(Self {
            feed: self.feed,
            sub_line: line,
        })
    }

    /// Parses a user-facing sub-line argument: a single route character,
    /// or `all` / empty for no filter.
    pub fn parse_sub_line(raw: &str) -> Result<Option<char>, SelectionError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(None);
        }
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Some(c.to_ascii_uppercase())),
            _ => Err(SelectionError::UnknownSubLine {
                feed: String::new(),
                line: raw.to_string(),
            }),
        }
    }
}
