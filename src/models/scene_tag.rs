use std::{fmt, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// The fixed vocabulary of scene tags a reviewer can attach to an interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SceneTag {
    Action,
    Dialogue,
    Romance,
    Comedy,
    Horror,
    Suspense,
    Drama,
    Music,
    Montage,
    Chase,
    Fight,
    Landscape,
    Flashback,
    Twist,
    Climax,
    Credits,
}

impl SceneTag {
    pub const ALL: [SceneTag; 16] = [
        SceneTag::Action,
        SceneTag::Dialogue,
        SceneTag::Romance,
        SceneTag::Comedy,
        SceneTag::Horror,
        SceneTag::Suspense,
        SceneTag::Drama,
        SceneTag::Music,
        SceneTag::Montage,
        SceneTag::Chase,
        SceneTag::Fight,
        SceneTag::Landscape,
        SceneTag::Flashback,
        SceneTag::Twist,
        SceneTag::Climax,
        SceneTag::Credits,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneTag::Action => "action",
            SceneTag::Dialogue => "dialogue",
            SceneTag::Romance => "romance",
            SceneTag::Comedy => "comedy",
            SceneTag::Horror => "horror",
            SceneTag::Suspense => "suspense",
            SceneTag::Drama => "drama",
            SceneTag::Music => "music",
            SceneTag::Montage => "montage",
            SceneTag::Chase => "chase",
            SceneTag::Fight => "fight",
            SceneTag::Landscape => "landscape",
            SceneTag::Flashback => "flashback",
            SceneTag::Twist => "twist",
            SceneTag::Climax => "climax",
            SceneTag::Credits => "credits",
        }
    }

    /// Lowercase letter that triggers this tag from the keyboard.
    pub fn hotkey(&self) -> char {
        match self {
            SceneTag::Action => 'a',
            SceneTag::Dialogue => 'd',
            SceneTag::Romance => 'r',
            SceneTag::Comedy => 'o',
            SceneTag::Horror => 'h',
            SceneTag::Suspense => 's',
            SceneTag::Drama => 'e',
            SceneTag::Music => 'u',
            SceneTag::Montage => 'g',
            SceneTag::Chase => 'q',
            SceneTag::Fight => 'f',
            SceneTag::Landscape => 'l',
            SceneTag::Flashback => 'k',
            SceneTag::Twist => 'w',
            SceneTag::Climax => 'x',
            SceneTag::Credits => 'z',
        }
    }

    pub fn from_hotkey(key: char) -> Option<SceneTag> {
        let key = key.to_ascii_lowercase();
        SceneTag::ALL.into_iter().find(|tag| tag.hotkey() == key)
    }
}

impl fmt::Display for SceneTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SceneTag {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SceneTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == value)
            .ok_or_else(|| anyhow!("unknown scene tag '{value}'"))
    }
}
