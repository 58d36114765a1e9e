/// Outcome of validating the shipping address and rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorStatus {
    #[default]
    Pristine,
    Valid,
    InvalidAddress,
    UnknownError,
}

impl ErrorStatus {
    pub fn has_error(self) -> bool {
        matches!(self, Self::InvalidAddress | Self::UnknownError)
    }
}
