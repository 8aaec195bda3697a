//! Terminal output utilities.
//!
//! Provides formatting helpers for terminal output.

use crate::processing::{CleanupOutcome, LifecycleReport};
use colored::Colorize;

/// Width of the label column in the report.
const LABEL_WIDTH: usize = 16;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Plain `label: "value"` lines for a report, without colors.
pub fn report_lines(report: &LifecycleReport) -> Vec<String> {
    let rows = [
        ("resource_group", report.group.id.clone()),
        ("location", report.group.location.clone()),
        ("resource", report.resource.id.clone()),
        ("state", report.resource.provisioning_state().to_string()),
        ("polls", report.polls.to_string()),
        ("cleanup", report.cleanup.to_string()),
    ];
    rows.iter()
        .map(|(label, value)| format!("{}: {}", format_field(label, LABEL_WIDTH), value))
        .collect()
}

/// Print a run summary to stdout.
pub fn print_report(report: &LifecycleReport) {
    for line in report_lines(report) {
        println!("{line}");
    }
    match &report.cleanup {
        CleanupOutcome::Failed(_) => println!(
            "#{}# resource group {} may still exist",
            "NOTE".on_red(),
            report.group.name
        ),
        CleanupOutcome::Skipped => println!(
            "#{}# resource group {} kept, delete it to stop billing",
            "NOTE".on_yellow(),
            report.group.name
        ),
        CleanupOutcome::Deleted => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Resource, ResourceGroup};
    use serde_json::json;

    #[test]
    fn test_format_field_short() {
        assert_eq!(format_field("test", 10), "    \"test\"");
    }

    #[test]
    fn test_format_field_long() {
        assert_eq!(format_field("long_value", 5), "\"long_value\"");
    }

    #[test]
    fn test_format_field_number() {
        assert_eq!(format_field(42, 6), "  \"42\"");
    }

    #[test]
    fn test_report_lines() {
        let report = LifecycleReport {
            group: ResourceGroup {
                id: "/subscriptions/s/resourceGroups/rg".to_string(),
                name: "rg".to_string(),
                location: "westus".to_string(),
                tags: None,
                properties: json!({}),
            },
            resource: Resource {
                id: "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Network/virtualNetworks/v"
                    .to_string(),
                name: "v".to_string(),
                resource_type: "Microsoft.Network/virtualNetworks".to_string(),
                location: Some("westus".to_string()),
                properties: json!({ "provisioningState": "Succeeded" }),
            },
            polls: 3,
            cleanup: CleanupOutcome::Skipped,
        };
        let lines = report_lines(&report);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "\"resource_group\": /subscriptions/s/resourceGroups/rg");
        assert_eq!(lines[3], "         \"state\": Succeeded");
        assert_eq!(lines[4], "         \"polls\": 3");
        assert!(lines[5].ends_with("skipped (KEEP_RESOURCE)"));
    }
}
