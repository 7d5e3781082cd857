// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Validation helpers for API contract types

use crate::error::ApiContractError;
use crate::types::*;
use conf_domain_types::{AttendanceEventType, QrPayload};
use std::collections::HashMap;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate an event creation or update request
pub fn validate_event_request(request: &EventRequest) -> Result<(), ApiContractError> {
    request.validate()?;
    Ok(())
}

/// Validate an attendee registration request
pub fn validate_user_register_request(
    request: &UserRegisterRequest,
) -> Result<(), ApiContractError> {
    request.validate()?;
    Ok(())
}

/// Validate a staff registration request
pub fn validate_admin_register_request(
    request: &AdminRegisterRequest,
) -> Result<(), ApiContractError> {
    request.validate()?;
    Ok(())
}

/// Validate a scan request, including the QR payload and the requested action
pub fn validate_scan_request(request: &ScanRequest) -> Result<(), ApiContractError> {
    request.validate()?;
    QrPayload::extract_code(&request.code)?;
    if let Some(action) = &request.action {
        AttendanceEventType::parse_action(action)?;
    }
    Ok(())
}

/// Flatten validator output into `field -> messages`, using wire field names.
///
/// Struct-level failures are reported under `request`.
pub fn field_errors(errors: &ValidationErrors) -> HashMap<String, Vec<String>> {
    let mut out = HashMap::new();
    for (field, kind) in errors.errors() {
        let ValidationErrorsKind::Field(list) = kind else {
            continue;
        };
        let field = field.to_string();
        let key = if field == "__all__" {
            "request".to_string()
        } else {
            camel_case(&field)
        };
        let messages = list
            .iter()
            .map(|err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("invalid ({})", err.code),
            })
            .collect::<Vec<_>>();
        out.entry(key).or_insert_with(Vec::new).extend(messages);
    }
    out
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(name: &str, start_hour: u32, end_hour: u32) -> EventRequest {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        EventRequest {
            event_name: name.to_string(),
            event_start_time: day.and_hms_opt(start_hour, 0, 0).unwrap(),
            event_end_time: day.and_hms_opt(end_hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_validate_event_request_valid() {
        assert!(validate_event_request(&event("RustConf", 9, 17)).is_ok());
        // zero-length events are allowed
        assert!(validate_event_request(&event("Keynote", 9, 9)).is_ok());
    }

    #[test]
    fn test_validate_event_request_blank_name() {
        let err = validate_event_request(&event("   ", 9, 17)).unwrap_err();
        let ApiContractError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields = field_errors(&errors);
        assert_eq!(fields["eventName"], vec!["Event name is required".to_string()]);
    }

    #[test]
    fn test_validate_event_request_inverted_window() {
        let err = validate_event_request(&event("RustConf", 17, 9)).unwrap_err();
        let ApiContractError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields = field_errors(&errors);
        assert!(fields["request"][0].contains("start time"));
    }

    #[test]
    fn test_validate_user_register_request() {
        let valid = UserRegisterRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(validate_user_register_request(&valid).is_ok());

        let invalid = UserRegisterRequest {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
        };
        let Err(ApiContractError::Validation(errors)) = validate_user_register_request(&invalid)
        else {
            panic!("expected validation error");
        };
        let fields = field_errors(&errors);
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_validate_admin_register_request_uses_wire_names() {
        let invalid = AdminRegisterRequest {
            staff_name: "".to_string(),
            email: "staff@example.com".to_string(),
            password: "secret1".to_string(),
            validation_code: None,
        };
        let Err(ApiContractError::Validation(errors)) = validate_admin_register_request(&invalid)
        else {
            panic!("expected validation error");
        };
        assert!(field_errors(&errors).contains_key("staffName"));
    }

    #[test]
    fn test_validate_scan_request() {
        let mut request = ScanRequest {
            code: "REG:abc:EVENT:1:USER:2".to_string(),
            action: Some("checkout".to_string()),
            idempotency_key: Some("scan_1_abc".to_string()),
        };
        assert!(validate_scan_request(&request).is_ok());

        request.action = Some("TELEPORT".to_string());
        assert!(matches!(
            validate_scan_request(&request),
            Err(ApiContractError::Domain(_))
        ));

        request.action = None;
        request.code = "  ".to_string();
        assert!(matches!(
            validate_scan_request(&request),
            Err(ApiContractError::Validation(_))
        ));
    }

    #[test]
    fn test_problem_details_mirrors_message() {
        let problem = crate::ProblemDetails::new("about:blank", "Not Found", 404, "Invalid code");
        let value = serde_json::to_value(&problem).unwrap();
        assert_eq!(value["type"], "about:blank");
        assert_eq!(value["detail"], "Invalid code");
        assert_eq!(value["message"], "Invalid code");
        assert!(value.get("errors").is_none());
    }
}
