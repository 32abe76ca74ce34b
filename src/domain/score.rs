use serde::{Deserialize, Serialize};

/// One of the two sides of a singles match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Side {
    One,
    Two,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Side::One => 1,
            Side::Two => 2,
        }
    }
}

impl From<Side> for u8 {
    fn from(side: Side) -> Self {
        side.as_u8()
    }
}

impl TryFrom<u8> for Side {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Side::One),
            2 => Ok(Side::Two),
            other => Err(format!("side must be 1 or 2, got {}", other)),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Point value inside a game, ordered "0" < "15" < "30" < "40" < "AD"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum PointValue {
    #[default]
    #[serde(rename = "0")]
    Love,
    #[serde(rename = "15")]
    Fifteen,
    #[serde(rename = "30")]
    Thirty,
    #[serde(rename = "40")]
    Forty,
    #[serde(rename = "AD")]
    Advantage,
}

impl PointValue {
    pub const SEQUENCE: [PointValue; 5] = [
        PointValue::Love,
        PointValue::Fifteen,
        PointValue::Thirty,
        PointValue::Forty,
        PointValue::Advantage,
    ];

    /// Position in the point sequence (0..=4)
    pub fn index(&self) -> u8 {
        match self {
            PointValue::Love => 0,
            PointValue::Fifteen => 1,
            PointValue::Thirty => 2,
            PointValue::Forty => 3,
            PointValue::Advantage => 4,
        }
    }

    /// Next value in the sequence; saturates at AD
    pub fn next(&self) -> Self {
        let idx = (self.index() as usize + 1).min(Self::SEQUENCE.len() - 1);
        Self::SEQUENCE[idx]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PointValue::Love => "0",
            PointValue::Fifteen => "15",
            PointValue::Thirty => "30",
            PointValue::Forty => "40",
            PointValue::Advantage => "AD",
        }
    }
}

impl TryFrom<&str> for PointValue {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "0" => Ok(PointValue::Love),
            "15" => Ok(PointValue::Fifteen),
            "30" => Ok(PointValue::Thirty),
            "40" => Ok(PointValue::Forty),
            "AD" => Ok(PointValue::Advantage),
            other => Err(format!("unknown point value: {}", other)),
        }
    }
}

impl std::fmt::Display for PointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Live score of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    pub sets_p1: u8,
    pub sets_p2: u8,
    pub games_p1: u8,
    pub games_p2: u8,
    pub points_p1: PointValue,
    pub points_p2: PointValue,
    pub serving: Side,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self {
            sets_p1: 0,
            sets_p2: 0,
            games_p1: 0,
            games_p2: 0,
            points_p1: PointValue::Love,
            points_p2: PointValue::Love,
            serving: Side::One,
        }
    }
}

impl ScoreState {
    pub fn points(&self, side: Side) -> PointValue {
        match side {
            Side::One => self.points_p1,
            Side::Two => self.points_p2,
        }
    }

    pub fn games(&self, side: Side) -> u8 {
        match side {
            Side::One => self.games_p1,
            Side::Two => self.games_p2,
        }
    }

    pub fn sets(&self, side: Side) -> u8 {
        match side {
            Side::One => self.sets_p1,
            Side::Two => self.sets_p2,
        }
    }

    pub(crate) fn points_mut(&mut self, side: Side) -> &mut PointValue {
        match side {
            Side::One => &mut self.points_p1,
            Side::Two => &mut self.points_p2,
        }
    }

    pub(crate) fn games_mut(&mut self, side: Side) -> &mut u8 {
        match side {
            Side::One => &mut self.games_p1,
            Side::Two => &mut self.games_p2,
        }
    }

    pub(crate) fn sets_mut(&mut self, side: Side) -> &mut u8 {
        match side {
            Side::One => &mut self.sets_p1,
            Side::Two => &mut self.sets_p2,
        }
    }

    /// Receiving side for the current game
    pub fn receiver(&self) -> Side {
        self.serving.opposite()
    }
}

/// Games of a completed set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetScore {
    pub set_number: u8,
    pub games_p1: u8,
    pub games_p2: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_value_wire_format() {
        assert_eq!(serde_json::to_string(&PointValue::Advantage).unwrap(), "\"AD\"");
        assert_eq!(serde_json::to_string(&PointValue::Love).unwrap(), "\"0\"");
        let parsed: PointValue = serde_json::from_str("\"30\"").unwrap();
        assert_eq!(parsed, PointValue::Thirty);
        assert!(serde_json::from_str::<PointValue>("\"45\"").is_err());
    }

    #[test]
    fn test_point_value_next_saturates() {
        assert_eq!(PointValue::Love.next(), PointValue::Fifteen);
        assert_eq!(PointValue::Forty.next(), PointValue::Advantage);
        assert_eq!(PointValue::Advantage.next(), PointValue::Advantage);
    }

    #[test]
    fn test_side_serializes_as_number() {
        let score = ScoreState::default();
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["serving"], 1);
        assert_eq!(json["points_p1"], "0");

        let back: ScoreState = serde_json::from_value(json).unwrap();
        assert_eq!(back, score);
        assert!(serde_json::from_str::<Side>("3").is_err());
    }
}
