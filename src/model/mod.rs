use derive_more::Constructor;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

/// What a building element rasterizes as. The geometry provider collapses the
/// source model's element classes into these four tags.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Sequence, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Wall,
    Floor,
    Door,
    Stair,
}

/// A triangle in world coordinates, vertices as `[x, y, z]`.
pub type Triangle = [[f64; 3]; 3];

/// A building element as emitted by the geometry provider: a type tag and a
/// triangle soup in world coordinates.
#[derive(Debug, Clone, Constructor, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    pub id: String,
    pub triangles: Vec<Triangle>,
}

/// Storey descriptor from the building model.
#[derive(Debug, Clone, Constructor, Serialize, Deserialize)]
pub struct Storey {
    pub elevation: f64,
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Complete rasterizer input: every relevant element plus the storey list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingModel {
    pub elements: Vec<Element>,
    pub storeys: Vec<Storey>,
}

#[cfg(test)]
mod tests {
    use crate::model::ElementKind;

    #[test]
    fn test_element_kind_serialization() {
        assert_eq!(serde_json::to_string(&ElementKind::Wall).unwrap(), "\"wall\"");
        assert_eq!(serde_json::to_string(&ElementKind::Stair).unwrap(), "\"stair\"");
        let kind: ElementKind = serde_json::from_str("\"door\"").unwrap();
        assert_eq!(kind, ElementKind::Door);
    }
}
