use serde::{Deserialize, Serialize};

pub const BASE_API_URL: &str = "https://api.atlasacademy.io/";
pub const BASE_ASSET_URL: &str = "https://static.atlasacademy.io/";
pub const REGION: &str = "NA";
pub const DEFAULT_SERVANT_IDS: &[u32] = &[86];
pub const NO_EFFECT_TEXT: &str = "No effect data";

/// Display data for one card. Only `image_url` matters to the effects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: u32,
    pub name: String,
    pub rarity: u8,
    pub image_url: String,
    pub effect_text: String,
}

impl CardRecord {
    pub fn rarity_stars(&self) -> String {
        "★".repeat(self.rarity as usize)
    }
}

#[derive(Debug, Deserialize)]
struct ServantPayload {
    id: u32,
    name: String,
    rarity: u8,
    #[serde(default)]
    skills: Vec<SkillPayload>,
}

#[derive(Debug, Deserialize)]
struct SkillPayload {
    #[serde(default)]
    detail: Option<String>,
}

pub fn servant_url(servant_id: u32) -> String {
    format!("{BASE_API_URL}nice/{REGION}/servant/{servant_id}?lore=true&lang=en")
}

pub fn servant_image_url(servant_id: u32, suffix: &str, version: u32) -> String {
    format!("{BASE_ASSET_URL}{REGION}/CharaGraph/{servant_id}/{servant_id}{suffix}@{version}.png")
}

/// Decodes a servant payload into a card record.
pub fn parse_servant(json: &str) -> Result<CardRecord, serde_json::Error> {
    let payload: ServantPayload = serde_json::from_str(json)?;
    let effect_text = payload
        .skills
        .into_iter()
        .next()
        .and_then(|skill| skill.detail)
        .unwrap_or_else(|| NO_EFFECT_TEXT.to_string());
    Ok(CardRecord {
        id: payload.id,
        name: payload.name,
        rarity: payload.rarity,
        image_url: servant_image_url(payload.id, "b", 2),
        effect_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_atlas_layout() {
        assert_eq!(
            servant_url(86),
            "https://api.atlasacademy.io/nice/NA/servant/86?lore=true&lang=en"
        );
        assert_eq!(
            servant_image_url(86, "b", 2),
            "https://static.atlasacademy.io/NA/CharaGraph/86/86b@2.png"
        );
    }

    #[test]
    fn parses_first_skill_detail() {
        let json = r#"{
            "id": 86,
            "name": "Mordred",
            "rarity": 5,
            "collectionNo": 76,
            "skills": [
                {"num": 1, "detail": "Increases own Quick performance."},
                {"num": 2, "detail": "Second"}
            ]
        }"#;
        let record = parse_servant(json).expect("parse");
        assert_eq!(record.id, 86);
        assert_eq!(record.name, "Mordred");
        assert_eq!(record.effect_text, "Increases own Quick performance.");
        assert_eq!(record.rarity_stars(), "★★★★★");
        assert!(record.image_url.ends_with("86b@2.png"));
    }

    #[test]
    fn missing_skills_use_placeholder() {
        let record = parse_servant(r#"{"id": 1, "name": "Mash", "rarity": 3}"#).expect("parse");
        assert_eq!(record.effect_text, NO_EFFECT_TEXT);
        assert!(parse_servant("{\"id\": 1}").is_err());
    }
}
