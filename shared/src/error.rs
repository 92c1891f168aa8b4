use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WheelError {
    #[error("No prizes available")]
    NoPrizes,
    #[error("The wheel is already spinning")]
    AlreadySpinning,
    #[error("Invalid prize list: {0}")]
    InvalidPrizeList(String),
}
