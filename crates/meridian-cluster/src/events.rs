//! The fixed wire-event catalogue (spec §4.6 step 3, §6: "the names and
//! their `params` shapes are fixed"). Both the outbound relay (C6) and the
//! inbound dispatcher (C7) look a `FieldChanged { field }` signal up here
//! by field name (outbound) or by `event::<Name>` method (inbound), so the
//! two directions can never drift apart.
//!
//! Only the checkable/notification/custom-var fields spec §4.6 names are
//! covered (check intervals, next-check, force-next-*, the enable-*
//! flags, command/period names, vars). A type may carry other config
//! fields outside this catalogue (e.g. a plain `Host.address`); those fall
//! back to the generic `event::FieldChanged` carrying `{field, value}`,
//! which is not itself one of the fixed names.

pub struct FieldEvent {
    pub field: &'static str,
    pub event: &'static str,
    pub param_key: &'static str,
}

pub const FIELD_EVENTS: &[FieldEvent] = &[
    FieldEvent { field: "last_check_result", event: "CheckResult", param_key: "cr" },
    FieldEvent { field: "next_check", event: "SetNextCheck", param_key: "next_check" },
    FieldEvent { field: "force_next_check", event: "SetForceNextCheck", param_key: "forced" },
    FieldEvent {
        field: "force_next_notification",
        event: "SetForceNextNotification",
        param_key: "forced",
    },
    FieldEvent { field: "check_interval", event: "SetCheckInterval", param_key: "interval" },
    FieldEvent { field: "retry_interval", event: "SetRetryInterval", param_key: "interval" },
    FieldEvent {
        field: "max_check_attempts",
        event: "SetMaxCheckAttempts",
        param_key: "max_check_attempts",
    },
    FieldEvent { field: "active_checks_enabled", event: "EnableActiveChecks", param_key: "enabled" },
    FieldEvent { field: "passive_checks_enabled", event: "EnablePassiveChecks", param_key: "enabled" },
    FieldEvent { field: "notifications_enabled", event: "EnableNotifications", param_key: "enabled" },
    FieldEvent { field: "event_handler_enabled", event: "EnableEventHandler", param_key: "enabled" },
    FieldEvent { field: "flapping_enabled", event: "EnableFlapping", param_key: "enabled" },
    FieldEvent { field: "perfdata_enabled", event: "EnablePerfdata", param_key: "enabled" },
    FieldEvent { field: "check_command", event: "SetCheckCommand", param_key: "command" },
    FieldEvent { field: "event_command", event: "SetEventCommand", param_key: "command" },
    FieldEvent { field: "check_period", event: "SetCheckPeriod", param_key: "period" },
    FieldEvent { field: "notification_period", event: "SetNotificationPeriod", param_key: "period" },
    FieldEvent { field: "vars", event: "SetVars", param_key: "vars" },
];

/// Looks the fixed event up by the kernel field name that changed (used by
/// the outbound relay).
pub fn by_field(field: &str) -> Option<&'static FieldEvent> {
    FIELD_EVENTS.iter().find(|fe| fe.field == field)
}

/// Looks the fixed event up by its wire method name (used by the inbound
/// dispatcher).
pub fn by_event(event: &str) -> Option<&'static FieldEvent> {
    FIELD_EVENTS.iter().find(|fe| fe.event == event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_and_event_lookups_agree() {
        let fe = by_field("check_interval").unwrap();
        assert_eq!(fe.event, "SetCheckInterval");
        assert_eq!(by_event("SetCheckInterval").unwrap().field, "check_interval");
    }

    #[test]
    fn unlisted_field_and_event_are_absent() {
        assert!(by_field("address").is_none());
        assert!(by_event("FieldChanged").is_none());
    }
}
