//! Breaking-change acquisition.
//!
//! The store pulls new records through the [`ChangeFeed`] seam. The shipped
//! implementation is a curated dataset; a feed backed by release-note
//! scraping would implement the same trait.

use super::{BreakingChange, Severity};

pub trait ChangeFeed: Send + Sync {
    fn fetch(&self) -> anyhow::Result<Vec<BreakingChange>>;
}

/// Curated records for recent platform releases.
pub struct CuratedFeed;

impl ChangeFeed for CuratedFeed {
    fn fetch(&self) -> anyhow::Result<Vec<BreakingChange>> {
        Ok(curated_changes())
    }
}

fn record(
    id: &str,
    version: &str,
    integration: &str,
    title: &str,
    description: &str,
    severity: Severity,
    url: &str,
) -> BreakingChange {
    BreakingChange {
        id: id.to_string(),
        version: version.to_string(),
        integration: integration.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        severity,
        url: url.to_string(),
    }
}

fn curated_changes() -> Vec<BreakingChange> {
    vec![
        record(
            "mqtt_2024_10",
            "2024.10.0",
            "mqtt",
            "MQTT Discovery Topic Changes",
            "MQTT discovery topics have been reorganized. Devices may need to be reconfigured.",
            Severity::Medium,
            "https://www.home-assistant.io/blog/2024/10/01/release-202410/",
        ),
        record(
            "zha_2024_9",
            "2024.9.0",
            "zha",
            "ZHA Device Naming Convention Changed",
            "Zigbee device names now follow a new convention. Automations may need updates.",
            Severity::High,
            "https://www.home-assistant.io/blog/2024/09/01/release-20249/",
        ),
        record(
            "esphome_2024_8",
            "2024.8.0",
            "esphome",
            "ESPHome API Version Requirement",
            "ESPHome devices must be running API version 1.9 or higher.",
            Severity::Medium,
            "https://www.home-assistant.io/blog/2024/08/01/release-20248/",
        ),
        record(
            "homekit_2024_7",
            "2024.7.0",
            "homekit",
            "HomeKit Bridge Configuration Changes",
            "HomeKit bridge configuration format has changed. Manual reconfiguration required.",
            Severity::High,
            "https://www.home-assistant.io/blog/2024/07/01/release-20247/",
        ),
        record(
            "template_2024_6",
            "2024.6.0",
            "template",
            "Template Sensor Syntax Update",
            "Template sensors now require explicit state_class definition.",
            Severity::Low,
            "https://www.home-assistant.io/blog/2024/06/01/release-20246/",
        ),
        record(
            "automation_2024_5",
            "2024.5.0",
            "automation",
            "Automation Trigger ID Requirement",
            "Automation triggers now require unique IDs for proper tracking.",
            Severity::Low,
            "https://www.home-assistant.io/blog/2024/05/01/release-20245/",
        ),
        record(
            "shelly_2024_4",
            "2024.4.0",
            "shelly",
            "Shelly Integration Rewrite",
            "Shelly integration has been completely rewritten. Devices need to be re-added.",
            Severity::High,
            "https://www.home-assistant.io/blog/2024/04/01/release-20244/",
        ),
        record(
            "sensor_2024_3",
            "2024.3.0",
            "sensor",
            "Sensor Platform Deprecation",
            "Legacy sensor platform configuration is deprecated. Use modern format.",
            Severity::Medium,
            "https://www.home-assistant.io/blog/2024/03/01/release-20243/",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn curated_feed_ids_are_unique_and_versions_parse() {
        let changes = CuratedFeed.fetch().unwrap();
        assert_eq!(changes.len(), 8);

        let ids: HashSet<_> = changes.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), changes.len());

        for change in &changes {
            assert!(
                change.version.parse::<crate::version::Version>().is_ok(),
                "unparseable version in {}",
                change.id
            );
        }
    }
}
