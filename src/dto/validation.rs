//! Validation helpers for DTOs.

use validator::ValidationError;

/// Judges must identify themselves; whitespace alone does not count.
pub fn validate_judge_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("judge_name_required");
        err.message = Some("Judge name required".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects empty or whitespace-only text such as robot names.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_judge_name() {
        assert!(validate_judge_name("Alex").is_ok());
        assert!(validate_judge_name("  Robin ").is_ok());
        let err = validate_judge_name(" \t").unwrap_err();
        assert_eq!(err.message.as_deref(), Some("Judge name required"));
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Beetleweight").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }
}
