//! Status text parsing for the injury feed
//!
//! The feed reports statuses as loose free text ("Out", "IR-LT", "Day-To-Day",
//! "GTD", ...). This is the only place that text is interpreted; everything
//! downstream works with [`AvailabilityStatus`].

use edge_core::AvailabilityStatus;

/// Parse a raw status string from the injury feed
///
/// Unrecognized text maps to [`AvailabilityStatus::Unknown`], which
/// reconciliation treats as doubtful.
pub fn parse_status(raw: &str) -> AvailabilityStatus {
    let normalized: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    let tokens: Vec<&str> = normalized.split_whitespace().collect();

    if tokens.is_empty() {
        return AvailabilityStatus::Unknown;
    }

    let joined = tokens.join(" ");

    if tokens.iter().any(|t| matches!(*t, "ir" | "ltir" | "lt")) || joined.contains("injured reserve") {
        return AvailabilityStatus::InjuredReserve;
    }
    if tokens.iter().any(|t| matches!(*t, "suspended" | "suspension" | "susp")) {
        return AvailabilityStatus::Suspended;
    }
    if tokens.iter().any(|t| matches!(*t, "out" | "inactive" | "scratched" | "scratch")) {
        return AvailabilityStatus::Out;
    }
    if joined.contains("day to day") || tokens.iter().any(|t| matches!(*t, "dtd" | "daytoday")) {
        return AvailabilityStatus::DayToDay;
    }
    if tokens
        .iter()
        .any(|t| matches!(*t, "questionable" | "gtd" | "doubtful"))
        || joined.contains("game time")
    {
        return AvailabilityStatus::Questionable;
    }
    // Probable means expected to play
    if tokens
        .iter()
        .any(|t| matches!(*t, "active" | "healthy" | "available" | "cleared" | "probable"))
    {
        return AvailabilityStatus::Active;
    }

    AvailabilityStatus::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_statuses() {
        assert_eq!(parse_status("Out"), AvailabilityStatus::Out);
        assert_eq!(parse_status("  OUT (upper body) "), AvailabilityStatus::Out);
        assert_eq!(parse_status("IR-LT"), AvailabilityStatus::InjuredReserve);
        assert_eq!(parse_status("Injured Reserve"), AvailabilityStatus::InjuredReserve);
        assert_eq!(parse_status("Suspended"), AvailabilityStatus::Suspended);
    }

    #[test]
    fn test_doubtful_statuses() {
        assert_eq!(parse_status("Day-To-Day"), AvailabilityStatus::DayToDay);
        assert_eq!(parse_status("DTD"), AvailabilityStatus::DayToDay);
        assert_eq!(parse_status("GTD"), AvailabilityStatus::Questionable);
        assert_eq!(parse_status("Game-time decision"), AvailabilityStatus::Questionable);
    }

    #[test]
    fn test_active_and_unknown() {
        assert_eq!(parse_status("Healthy"), AvailabilityStatus::Active);
        assert_eq!(parse_status("Probable"), AvailabilityStatus::Active);
        assert_eq!(parse_status("Probable (GTD)"), AvailabilityStatus::Questionable);
        assert_eq!(parse_status(""), AvailabilityStatus::Unknown);
        assert_eq!(parse_status("see notes"), AvailabilityStatus::Unknown);
    }
}
