use serde::Deserialize;

/// One configured bot identity, immutable after load.
///
/// `name` doubles as the mention trigger and the ledger partition key, so it
/// must be unique across the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub app_id: String,
    pub name: String,
    #[serde(rename = "slack_oauth_token")]
    pub delivery_token: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default, rename = "response_rules")]
    pub rules: Vec<ResponseRule>,
}

impl Persona {
    /// Parses one persona definition, trimming the system prompt.
    pub fn from_yaml(source: &str) -> Result<Self, serde_yaml::Error> {
        let mut persona: Persona = serde_yaml::from_str(source)?;
        persona.system_prompt = persona.system_prompt.trim().to_string();
        Ok(persona)
    }
}

/// One decision clause. Rules are evaluated in order; the first satisfied
/// rule wins.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRule {
    #[serde(rename = "rule_type")]
    pub kind: RuleKind,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub chance: Option<f64>,
}

/// Known rule kinds. Anything else deserializes to `Unknown`, which is never
/// satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RuleKind {
    Default,
    TextEndsWith,
    TextStartsWith,
    SpeakerIs,
    Unknown,
}

impl From<String> for RuleKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "default" => RuleKind::Default,
            "text_ends_with" => RuleKind::TextEndsWith,
            "text_starts_with" => RuleKind::TextStartsWith,
            "speaker_is" => RuleKind::SpeakerIs,
            _ => RuleKind::Unknown,
        }
    }
}
