use serde::{Deserialize, Serialize};

/// Raw payload of the `/pokemon/{id}` endpoint, trimmed to the fields we keep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailPayload {
    pub id: u32,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub sprites: Sprites,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
}

/// A cached detail entry. Height is in decimetres and weight in hectograms,
/// as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub id: u32,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    #[serde(default)]
    pub image_ref: String,
}

impl DetailPayload {
    /// Reshape into a record keyed by `id`. The payload's own id is ignored.
    pub fn into_record(self, id: u32) -> DetailRecord {
        DetailRecord {
            id,
            name: self.name,
            height: self.height,
            weight: self.weight,
            image_ref: self.sprites.front_default.unwrap_or_default(),
        }
    }
}

impl DetailRecord {
    pub fn has_image(&self) -> bool {
        !self.image_ref.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detail_payload_ignores_extra_fields() {
        let json = r#"{"id":1,"name":"bulbasaur","height":7,"weight":69,"base_experience":64,"order":1,"sprites":{"front_default":"https://img/1.png","back_default":null}}"#;

        let payload: DetailPayload =
            serde_json::from_str(json).expect("Failed to parse detail test JSON");
        let record = payload.into_record(1);
        assert_eq!(
            record,
            DetailRecord {
                id: 1,
                name: "bulbasaur".into(),
                height: 7,
                weight: 69,
                image_ref: "https://img/1.png".into(),
            }
        );
        assert!(record.has_image());
    }

    #[test]
    fn test_missing_sprite_becomes_empty_image_ref() {
        let json = r#"{"id":10001,"name":"deoxys-attack","height":17,"weight":608,"sprites":{"front_default":null}}"#;
        let payload: DetailPayload = serde_json::from_str(json).unwrap();
        let record = payload.into_record(10001);
        assert_eq!(record.image_ref, "");
        assert!(!record.has_image());

        let json = r#"{"id":2,"name":"ivysaur","height":10,"weight":130}"#;
        let payload: DetailPayload = serde_json::from_str(json).unwrap();
        assert!(!payload.into_record(2).has_image());
    }

    #[test]
    fn test_into_record_uses_requested_id() {
        let payload = DetailPayload {
            id: 25,
            name: "pikachu".into(),
            height: 4,
            weight: 60,
            sprites: Sprites::default(),
        };
        assert_eq!(payload.into_record(3).id, 3);
    }
}
