//! Building `action_outcome` events from a dispatched request.

use auditchain_contracts::ActionOutcome;

use crate::chain::fnv1a64;

/// Summarize one request/response exchange as an `ActionOutcome`.
///
/// The payload itself is not retained: only its byte length and FNV-1a
/// hash are recorded (`0` / `None` when the request carried no payload).
pub fn observe(
    action: &str,
    status: &str,
    message: Option<&str>,
    request_version: u32,
    confirmation_id: Option<&str>,
    payload: Option<&str>,
) -> ActionOutcome {
    ActionOutcome {
        action: action.to_string(),
        status: status.to_string(),
        message: message.unwrap_or_default().to_string(),
        request_version,
        has_confirmation_id: confirmation_id.is_some_and(|id| !id.is_empty()),
        payload_len: payload.map_or(0, |p| p.len() as u64),
        payload_hash: payload.map(|p| fnv1a64(p.as_bytes())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_summarized_not_stored() {
        let outcome = observe(
            "calendar_add_event",
            "ok",
            Some("added"),
            1,
            Some("c-42"),
            Some("dentist at 3pm"),
        );

        assert_eq!(outcome.payload_len, 14);
        assert_eq!(outcome.payload_hash, Some(fnv1a64(b"dentist at 3pm")));
        assert!(outcome.has_confirmation_id);
        assert_eq!(outcome.message, "added");
    }

    #[test]
    fn missing_payload_and_message() {
        let outcome = observe("ping", "ok", None, 1, None, None);

        assert_eq!(outcome.payload_len, 0);
        assert_eq!(outcome.payload_hash, None);
        assert!(!outcome.has_confirmation_id);
        assert_eq!(outcome.message, "");
    }

    #[test]
    fn empty_confirmation_id_does_not_count() {
        let outcome = observe("power_off", "pending", None, 1, Some(""), None);
        assert!(!outcome.has_confirmation_id);
    }
}
