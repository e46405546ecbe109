use serde::{Deserialize, Serialize};

/// Self-reported recall quality, 1 through 5 on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
  Again = 1,
  Hard = 2,
  Good = 3,
  Easy = 4,
  Perfect = 5,
}

impl Rating {
  pub fn from_value(value: i64) -> Option<Self> {
    match value {
      1 => Some(Self::Again),
      2 => Some(Self::Hard),
      3 => Some(Self::Good),
      4 => Some(Self::Easy),
      5 => Some(Self::Perfect),
      _ => None,
    }
  }

  pub fn value(&self) -> u8 {
    *self as u8
  }

  /// Again and Hard count as a lapse
  pub fn is_failure(&self) -> bool {
    matches!(self, Self::Again | Self::Hard)
  }
}

impl TryFrom<u8> for Rating {
  type Error = String;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    Self::from_value(value as i64).ok_or_else(|| format!("invalid rating {}", value))
  }
}

impl From<Rating> for u8 {
  fn from(rating: Rating) -> Self {
    rating.value()
  }
}
