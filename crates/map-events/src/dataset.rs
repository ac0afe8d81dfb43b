//! Parking-Lot Dataset
//!
//! Records supplied by the host application, the faces of the clickable data
//! cube they decorate, and the navigation request emitted when a face is
//! picked.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A parking lot as delivered by the host's API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingLotRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub hourly_price: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ParkingLotRecord {
    /// Short caption shown on a cube face.
    pub fn caption(&self) -> String {
        format!("{}\n{:.2}/h", self.name, self.hourly_price)
    }
}

/// Parses a JSON array of lot records.
pub fn parse_dataset(json: &str) -> Result<Vec<ParkingLotRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

/// One face of the data cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeFace {
    Front,
    Right,
    Back,
    Left,
    Top,
    Bottom,
}

impl CubeFace {
    /// All faces in a fixed order.
    pub fn all() -> &'static [CubeFace] {
        &[
            CubeFace::Front,
            CubeFace::Right,
            CubeFace::Back,
            CubeFace::Left,
            CubeFace::Top,
            CubeFace::Bottom,
        ]
    }

    /// Faces that carry dataset records, in fill order.
    pub fn lot_faces() -> &'static [CubeFace] {
        &[CubeFace::Front, CubeFace::Right, CubeFace::Back, CubeFace::Left]
    }

    /// Outward unit normal as `(x, y, z)`.
    pub fn normal(self) -> (f32, f32, f32) {
        match self {
            CubeFace::Front => (0.0, 0.0, 1.0),
            CubeFace::Back => (0.0, 0.0, -1.0),
            CubeFace::Right => (1.0, 0.0, 0.0),
            CubeFace::Left => (-1.0, 0.0, 0.0),
            CubeFace::Top => (0.0, 1.0, 0.0),
            CubeFace::Bottom => (0.0, -1.0, 0.0),
        }
    }
}

/// What is drawn on a face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum FaceContent {
    Lot { record: ParkingLotRecord },
    /// Shown when the dataset is missing or too short.
    NoData,
    /// Branding on the non-lot faces.
    Brand,
}

impl FaceContent {
    /// Identifier of the lot on this face, if any.
    pub fn lot_id(&self) -> Option<&str> {
        match self {
            FaceContent::Lot { record } => Some(record.id.as_str()),
            _ => None,
        }
    }
}

/// Assigns content to every cube face. Lot faces take records in order; a
/// missing dataset leaves them showing [`FaceContent::NoData`].
pub fn decorate_faces(records: Option<&[ParkingLotRecord]>) -> Vec<(CubeFace, FaceContent)> {
    let records = records.unwrap_or(&[]);
    let mut lots = records.iter();

    CubeFace::all()
        .iter()
        .map(|&face| {
            let content = if CubeFace::lot_faces().contains(&face) {
                match lots.next() {
                    Some(record) => FaceContent::Lot {
                        record: record.clone(),
                    },
                    None => FaceContent::NoData,
                }
            } else {
                FaceContent::Brand
            };
            (face, content)
        })
        .collect()
}

/// Request for the host application to navigate to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub request_id: Uuid,
    pub target_id: String,
}

impl NavigationRequest {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            target_id: target_id.into(),
        }
    }
}

impl fmt::Display for NavigationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "navigate to {} ({})", self.target_id, self.request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> ParkingLotRecord {
        ParkingLotRecord {
            id: id.to_string(),
            name: format!("Lot {}", id),
            address: "1 Main St".to_string(),
            hourly_price: 2.5,
            image_url: None,
        }
    }

    #[test]
    fn test_parse_dataset_camel_case() {
        let json = r#"[
            {"id": "lot-1", "name": "Harbor", "address": "Pier 4", "hourlyPrice": 3.5, "imageUrl": "https://img/1.png"},
            {"id": "lot-2", "name": "Station"}
        ]"#;

        let records = parse_dataset(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hourly_price, 3.5);
        assert_eq!(records[0].image_url.as_deref(), Some("https://img/1.png"));
        assert_eq!(records[1].address, "");
        assert!(records[1].image_url.is_none());
    }

    #[test]
    fn test_decorate_without_data() {
        let faces = decorate_faces(None);
        assert_eq!(faces.len(), 6);

        for (face, content) in &faces {
            if CubeFace::lot_faces().contains(face) {
                assert_eq!(*content, FaceContent::NoData);
            } else {
                assert_eq!(*content, FaceContent::Brand);
            }
        }
    }

    #[test]
    fn test_decorate_partial_data() {
        let records = vec![record("a"), record("b")];
        let faces = decorate_faces(Some(&records));

        assert_eq!(faces[0].1.lot_id(), Some("a"));
        assert_eq!(faces[1].1.lot_id(), Some("b"));
        assert_eq!(faces[2].1, FaceContent::NoData);
        assert_eq!(faces[3].1, FaceContent::NoData);
        assert_eq!(faces[4].1, FaceContent::Brand);
    }

    #[test]
    fn test_extra_records_are_ignored() {
        let records: Vec<_> = (0..9).map(|i| record(&i.to_string())).collect();
        let faces = decorate_faces(Some(&records));
        let lot_ids: Vec<_> = faces.iter().filter_map(|(_, c)| c.lot_id()).collect();
        assert_eq!(lot_ids, vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn test_face_content_serialization() {
        assert_eq!(
            serde_json::to_string(&FaceContent::NoData).unwrap(),
            r#"{"type":"no_data"}"#
        );
    }

    #[test]
    fn test_navigation_request_ids_are_unique() {
        let a = NavigationRequest::new("lot-1");
        let b = NavigationRequest::new("lot-1");
        assert_eq!(a.target_id, b.target_id);
        assert_ne!(a.request_id, b.request_id);
    }
}
