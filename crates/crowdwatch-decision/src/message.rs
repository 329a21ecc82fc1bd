//! Alert text generation.

use crate::status::whole_percentage;

/// Render the alert text for a location's current load.
///
/// Three templates, chosen by the same rules as the status:
/// overload (`count > capacity`) names the counts, states that entry was
/// closed, and names the reroute target when there is one; warning gives
/// the whole percentage; anything else reports normal operation.
pub fn alert_message(
    location: &str,
    count: u32,
    capacity: u32,
    warning_percent: u32,
    reroute: Option<&str>,
) -> String {
    if count > capacity {
        let mut message = format!(
            "{location} is overloaded ({count}/{capacity}). Entry has been closed automatically."
        );
        if let Some(target) = reroute {
            message.push_str(&format!(" Visitors are being rerouted to {target}."));
        }
        return message;
    }

    let percent = whole_percentage(count, capacity);
    if capacity > 0 && percent >= u64::from(warning_percent) {
        return format!("Crowd approaching limit in {location} ({percent}%). Please slow entry.");
    }

    format!("{location} operating normally.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overload_with_reroute() {
        let msg = alert_message("Cafeteria", 31, 30, 80, Some("Academic Block"));
        assert_eq!(
            msg,
            "Cafeteria is overloaded (31/30). Entry has been closed automatically. \
             Visitors are being rerouted to Academic Block."
        );
    }

    #[test]
    fn overload_without_reroute() {
        let msg = alert_message("Cafeteria", 31, 30, 80, None);
        assert!(msg.contains("31/30"));
        assert!(msg.contains("closed automatically"));
        assert!(!msg.contains("rerouted"));
    }

    #[test]
    fn warning_uses_whole_percent() {
        let msg = alert_message("Admin Block", 45, 50, 80, None);
        assert_eq!(
            msg,
            "Crowd approaching limit in Admin Block (90%). Please slow entry."
        );
    }

    #[test]
    fn normal_template() {
        assert_eq!(
            alert_message("Basketball Court", 3, 20, 80, None),
            "Basketball Court operating normally."
        );
    }
}
