//! Field keys and event names shared by the logging macros and the test
//! capture layer
//!
//! Every operation boundary is logged as one event carrying `component`,
//! `op` and `event`, where `event` is one of `start`, `end` or `end_error`.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

/// Whether `event` closes an operation, successfully or not
pub fn is_terminal_event(event: &str) -> bool {
    event == EVENT_END || event == EVENT_END_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(!is_terminal_event(EVENT_START));
        assert!(is_terminal_event(EVENT_END));
        assert!(is_terminal_event(EVENT_END_ERROR));
        assert!(!is_terminal_event("begin"));
    }
}
