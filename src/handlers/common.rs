use crate::errors::ServiceError;
use validator::Validate;

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input.validate().map_err(ServiceError::from)
}

/// Parses a path segment that must be a positive number.
pub fn parse_path_number(what: &str, raw: &str) -> Result<i32, ServiceError> {
    raw.parse::<i32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ServiceError::InvalidInput(format!("Invalid {} '{}'", what, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn path_numbers_must_be_positive() {
        assert_eq!(parse_path_number("year", "2024").unwrap(), 2024);
        assert_matches!(parse_path_number("year", "0"), Err(ServiceError::InvalidInput(_)));
        assert_matches!(parse_path_number("number", "12a"), Err(ServiceError::InvalidInput(_)));
    }
}
