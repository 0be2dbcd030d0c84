//! Shared fixtures for emitter unit tests.

use std::path::Path;

use chrono::NaiveDate;
use glean_parser::{parse_document, MergedDefinitionSet, Model, ModelBuilder, Validator};

pub(crate) const METRICS_YAML: &str = "\
$schema: moz://mozilla.org/schemas/glean/metrics/1-0-0

search:
  by_engine:
    type: labeled_counter
    description: Searches per engine.
    bugs:
      - https://bugzilla.mozilla.org/2
    data_reviews:
      - https://bugzilla.mozilla.org/2#c1
    notification_emails:
      - search@example.com
    expires: never
    send_in_pings:
      - search-usage
    labels:
      - bing
      - google

  performed:
    type: event
    description: |
      A search was performed.
      Includes the | engine used.
    bugs:
      - https://bugzilla.mozilla.org/2
    data_reviews:
      - https://bugzilla.mozilla.org/2#c1
    notification_emails:
      - search@example.com
    expires: never
    extra_keys:
      source:
        description: Where the search started.
      engine:
        description: Which engine was used.

browser.engagement:
  click_count:
    type: counter
    description: Counts \"clicks\" on $things.
    bugs:
      - https://bugzilla.mozilla.org/1
    data_reviews:
      - https://bugzilla.mozilla.org/1#c3
    notification_emails:
      - owner@example.com
    expires: never

  page_load:
    type: timing_distribution
    description: Page load time.
    bugs:
      - https://bugzilla.mozilla.org/1
    data_reviews: []
    notification_emails:
      - owner@example.com
    expires: 2020-01-01
    time_unit: millisecond
";

pub(crate) const PINGS_YAML: &str = "\
$schema: moz://mozilla.org/schemas/glean/pings/1-0-0

search-usage:
  description: Sent when search is used.
  include_client_id: true
  bugs:
    - https://bugzilla.mozilla.org/2
  notification_emails:
    - search@example.com
  reasons:
    startup: Sent at startup.
";

pub(crate) fn sample_model() -> Model {
    let set = MergedDefinitionSet {
        documents: vec![
            parse_document(Path::new("metrics.yaml"), METRICS_YAML).unwrap(),
            parse_document(Path::new("pings.yaml"), PINGS_YAML).unwrap(),
        ],
    };
    Validator::default().validate(&set).unwrap();
    ModelBuilder::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
        .build(&set)
        .unwrap()
}
