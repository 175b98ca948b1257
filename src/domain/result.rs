//! Result type alias for the loader
//!
//! This module provides a convenient Result type alias that uses LoaderError
//! as the error type.

use super::errors::LoaderError;

/// Result type alias for loader operations
///
/// # Examples
///
/// ```
/// use redcap_loader::domain::result::Result;
/// use redcap_loader::domain::errors::LoaderError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(LoaderError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, LoaderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::LoaderError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(LoaderError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
