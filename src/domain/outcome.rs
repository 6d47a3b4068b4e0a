use crate::error::AppError;

/// Result of an operation whose secondary steps may fail without failing the
/// whole operation. `Degraded` carries a usable value plus the warning that
/// explains what was left out.
#[derive(Debug)]
pub enum Outcome<T> {
    Ok(T),
    Degraded { value: T, warning: String },
    Failed(AppError),
}

impl<T> Outcome<T> {
    /// Wraps a fallible secondary step: an error becomes a degraded result
    /// carrying `fallback` instead of propagating.
    pub fn or_degraded(res: Result<T, AppError>, fallback: T) -> Self {
        match res {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Degraded { value: fallback, warning: e.to_string() },
        }
    }

    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(value) | Self::Degraded { value, .. } => Some(value),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Degraded { warning, .. } => Some(warning.as_str()),
            _ => None,
        }
    }

    /// Splits into the carried value and an optional warning, propagating
    /// `Failed` as a hard error.
    ///
    /// # Errors
    /// Returns the inner error for the `Failed` variant.
    pub fn into_parts(self) -> Result<(T, Option<String>), AppError> {
        match self {
            Self::Ok(value) => Ok((value, None)),
            Self::Degraded { value, warning } => Ok((value, Some(warning))),
            Self::Failed(e) => Err(e),
        }
    }
}
