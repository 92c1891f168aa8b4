use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Names shown on a display that has lost its relay connection.
pub const DEFAULT_PRIZE_NAMES: [&str; 11] = [
    "Tote", "Sticker", "Cool Cap", "Tattoo", "Socks", "T-Shirt", "Mug", "Label", "PeraWallet", "Pin", "Lanyard",
];

static DEFAULT_PRIZES: Lazy<Vec<Prize>> =
    Lazy::new(|| DEFAULT_PRIZE_NAMES.iter().map(|name| Prize::named(*name)).collect());

/// One sector of the wheel.
///
/// A prize arrives either as a bare string (`"Mug"`) or as an object
/// (`{"name": "Mug", "quantity": 3, "winText": "Enjoy your coffee"}`). Both
/// forms are folded into this record while deserializing, so nothing past the
/// wire boundary has to care which one was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(from = "PrizeEntry", rename_all = "camelCase")]
pub struct Prize {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    /// Remaining stock. `None` means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[validate(length(max = 280))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PrizeEntry {
    Name(String),
    Record(PrizeRecord),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrizeRecord {
    name: String,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    win_text: Option<String>,
}

impl From<PrizeEntry> for Prize {
    fn from(entry: PrizeEntry) -> Self {
        match entry {
            PrizeEntry::Name(name) => Prize::named(name),
            PrizeEntry::Record(record) => Prize {
                name: record.name,
                quantity: record.quantity,
                win_text: record.win_text,
            },
        }
    }
}

impl Prize {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: None,
            win_text: None,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_win_text(mut self, text: impl Into<String>) -> Self {
        self.win_text = Some(text.into());
        self
    }

    /// Unlimited prizes are always available, stocked ones only while some remain.
    pub fn is_available(&self) -> bool {
        self.quantity.map_or(true, |q| q > 0)
    }

    /// Takes one unit out of stock. Unlimited prizes are left alone.
    pub fn decrement(&mut self) {
        if let Some(q) = self.quantity.as_mut() {
            *q = (*q - 1).max(0);
        }
    }

    /// Text for the winner popup.
    pub fn announcement(&self) -> &str {
        self.win_text.as_deref().unwrap_or(&self.name)
    }
}

pub fn default_prizes() -> Vec<Prize> {
    DEFAULT_PRIZES.clone()
}

/// Decrements the prize called `name`. Returns false when no such prize exists.
pub fn decrement_by_name(prizes: &mut [Prize], name: &str) -> bool {
    match prizes.iter_mut().find(|p| p.name == name) {
        Some(prize) => {
            prize.decrement();
            true
        }
        None => false,
    }
}
