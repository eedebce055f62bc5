use serde::{Deserialize, Serialize};

/// The kind of content entry a principle represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipleType {
    UxLaw,
    CognitiveBias,
    Heuristic,
}

/// A single content entry: a UX law, cognitive bias, or heuristic.
///
/// Principles are sourced from the remote catalog endpoint and never
/// mutated locally. The `id` is the stable reference used by quiz
/// questions and favorites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principle {
    pub id: String,
    #[serde(rename = "type")]
    pub principle_type: PrincipleType,
    pub title: String,
    pub one_liner: String,
    pub definition: String,
    #[serde(default)]
    pub applies_when: Vec<String>,
    #[serde(rename = "do", default)]
    pub do_list: Vec<String>,
    #[serde(rename = "dont", default)]
    pub dont_list: Vec<String>,
    #[serde(default)]
    pub example: Option<PrincipleExample>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipleExample {
    pub image: String,
    pub caption: String,
}

/// A content category, referenced by `Principle::category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    // The catalog endpoint uses "name" while older cached blobs use "label"
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principle_wire_format_round_trip() {
        let json = r#"{
            "id": "hicks-law",
            "type": "ux_law",
            "title": "Hick's Law",
            "oneLiner": "More choices mean slower decisions",
            "definition": "Decision time increases with the number and complexity of choices.",
            "appliesWhen": ["navigation design"],
            "do": ["group options"],
            "dont": ["show everything at once"],
            "tags": ["decision-making"],
            "category": "laws",
            "sources": ["https://lawsofux.com/hicks-law/"]
        }"#;

        let principle: Principle = serde_json::from_str(json).expect("parse principle");
        assert_eq!(principle.id, "hicks-law");
        assert_eq!(principle.principle_type, PrincipleType::UxLaw);
        assert_eq!(principle.one_liner, "More choices mean slower decisions");
        assert_eq!(principle.do_list, vec!["group options"]);
        assert!(principle.example.is_none());

        let back = serde_json::to_string(&principle).expect("serialize principle");
        assert!(back.contains("\"oneLiner\""));
        assert!(back.contains("\"ux_law\""));
    }

    #[test]
    fn test_category_accepts_name_alias() {
        let json = r#"{"id": "laws", "name": "UX Laws", "description": "Core laws"}"#;
        let category: Category = serde_json::from_str(json).expect("parse category");
        assert_eq!(category.label, "UX Laws");
        assert!(category.color.is_none());
    }
}
