use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::{Validate, ValidationError};

use crate::constants::MAX_PRIZES;
use crate::error::WheelError;
use crate::prize::Prize;

static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Cc}").expect("valid control character pattern"));

pub fn validate_prize_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("blank_prize_name"));
    }
    if CONTROL_CHARS.is_match(name) {
        return Err(ValidationError::new("control_characters"));
    }
    Ok(())
}

/// Checks a prize list sent by the admin before it replaces the current one.
pub fn validate_prize_list(prizes: &[Prize]) -> Result<(), WheelError> {
    if prizes.is_empty() {
        return Err(WheelError::InvalidPrizeList("the list is empty".to_string()));
    }
    if prizes.len() > MAX_PRIZES {
        return Err(WheelError::InvalidPrizeList(format!(
            "{} prizes, at most {} allowed",
            prizes.len(),
            MAX_PRIZES
        )));
    }

    let mut seen = HashSet::new();
    for prize in prizes {
        prize
            .validate()
            .map_err(|e| WheelError::InvalidPrizeList(format!("{}: {}", prize.name, e)))?;
        validate_prize_name(&prize.name)
            .map_err(|e| WheelError::InvalidPrizeList(format!("{:?}: {}", prize.name, e.code)))?;
        if !seen.insert(prize.name.as_str()) {
            return Err(WheelError::InvalidPrizeList(format!("duplicate prize {:?}", prize.name)));
        }
    }
    Ok(())
}

/// Parses a JSON array of prizes, names or objects, and validates it.
pub fn parse_prize_list(raw: &str) -> Result<Vec<Prize>, WheelError> {
    let prizes: Vec<Prize> =
        serde_json::from_str(raw).map_err(|e| WheelError::InvalidPrizeList(format!("malformed JSON: {}", e)))?;
    validate_prize_list(&prizes)?;
    Ok(prizes)
}
