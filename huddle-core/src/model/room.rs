use crate::model::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Room identifier: 6-8 alphanumeric characters.
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
pub struct RoomId(String);

impl RoomId {
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        let ok = (6..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric());
        if ok {
            Ok(Self(s.to_owned()))
        } else {
            Err(ModelError::InvalidRoomId(s.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
