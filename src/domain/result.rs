//! Result type alias for cristin-sync

use super::errors::SyncError;

/// Result type alias for cristin-sync operations
///
/// # Examples
///
/// ```
/// use cristin_sync::domain::result::Result;
/// use cristin_sync::domain::errors::SyncError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(SyncError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::SyncError;

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(SyncError::Validation("test error".to_string()));
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
