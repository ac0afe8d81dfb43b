//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! ```ignore
//! // [dev-dependencies]
//! // map-events = { path = "../map-events", features = ["test-fixtures"] }
//!
//! let records = map_events::fixtures::sample_dataset();
//! ```

use crate::{parse_dataset, ParkingLotRecord};

/// Returns the sample dataset from the fixtures file.
///
/// Contains 3 lots, one of them without an image, so one lot face of the
/// cube is left showing the "no data" face.
pub fn sample_dataset() -> Vec<ParkingLotRecord> {
    let json = include_str!("../tests/fixtures/sample_dataset.json");
    parse_dataset(json)
        .unwrap_or_else(|e| panic!("Failed to parse sample dataset: {}", e))
}

/// Raw JSON of the sample dataset.
pub fn sample_dataset_json() -> &'static str {
    include_str!("../tests/fixtures/sample_dataset.json")
}
