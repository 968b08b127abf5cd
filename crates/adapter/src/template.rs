use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::samplers::SamplerId;

/// Family of HTTP APIs sharing one request/response JSON shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    OpenAi,
    Ollama,
    Cohere,
    Horde,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionType {
    ChatCompletions,
    TextCompletions,
}

/// Maps a canonical sampler to the field name a backend expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerField {
    #[serde(rename = "samplerID")]
    pub sampler: SamplerId,
    #[serde(rename = "externalName")]
    pub external_name: String,
}

/// Declarative description of one backend kind: which payload shape it
/// uses, which samplers it exposes under what external names, how prompt,
/// model and stop sequences are keyed in, and where model metadata lives
/// in its catalog responses.
///
/// Templates are static bundled data (or user-authored JSON); they are
/// validated once at load time and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendTemplate {
    pub name: String,
    pub payload_type: PayloadType,
    pub completion_type: CompletionType,
    /// Field name under which the assembled prompt/context is placed.
    pub prompt_key: String,
    pub stop_key: String,
    pub use_stop: bool,
    pub sampler_fields: Vec<SamplerField>,
    /// Suppress the context-length field after the prompt budget is read.
    pub remove_length_field: bool,
    /// Suppress the seed field when its value is negative ("unset").
    pub remove_seed_if_negative: bool,
    pub auth_header: String,
    pub auth_prefix: String,
    pub uses_api_key: bool,
    /// Whether a `model` field is emitted at all.
    pub use_model: bool,
    pub supports_multiple_models: bool,
    /// Dotted path to a model's display name inside a catalog entry.
    pub model_name_path: String,
    /// Dotted path to a model's context length inside a catalog entry.
    pub context_length_path: String,
    pub use_model_context_length: bool,
    /// Dotted path locating the model list inside a catalog response.
    pub model_list_path: String,
    /// Macro-token body for `PayloadType::Custom` backends only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_payload_template: Option<String>,
}

impl BackendTemplate {
    /// Checks template-authoring invariants.
    ///
    /// Violations are programming defects in a bundled or imported
    /// template, caught once at load time so a bad template never reaches
    /// request building.
    pub fn validate(&self) -> Result<()> {
        for (index, field) in self.sampler_fields.iter().enumerate() {
            let duplicate = self.sampler_fields[index + 1..]
                .iter()
                .any(|other| other.external_name == field.external_name);
            if duplicate {
                return Err(Error::DuplicateExternalName {
                    template: self.name.clone(),
                    field: field.external_name.clone(),
                });
            }
        }

        match (self.payload_type, &self.custom_payload_template) {
            (PayloadType::Custom, None) => Err(Error::MissingCustomPayload),
            (PayloadType::Custom, Some(_)) => Ok(()),
            (_, Some(_)) => Err(Error::UnexpectedCustomPayload(self.name.clone())),
            (_, None) => Ok(()),
        }
    }
}

/// Validates every template in a catalog, failing on the first defect.
pub fn validate_catalog(templates: &[BackendTemplate]) -> Result<()> {
    templates.iter().try_for_each(BackendTemplate::validate)
}

/// Per-connection instance values authored through the configuration
/// screens and persisted externally; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionValues {
    pub friendly_name: String,
    pub endpoint: String,
    #[serde(default)]
    pub model_endpoint: String,
    #[serde(default)]
    pub api_key: String,
    /// Opaque catalog entry (or entries, when the template supports
    /// multiple models); fields of interest are only reachable through the
    /// template's dotted paths.
    #[serde(default)]
    pub model: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefill: Option<String>,
    pub active: bool,
}

fn field(sampler: SamplerId, external_name: &str) -> SamplerField {
    SamplerField {
        sampler,
        external_name: external_name.to_string(),
    }
}

/// The fixed, bundled template catalog. The first entry is the default
/// selection in the connection screens.
pub fn builtin_templates() -> Vec<BackendTemplate> {
    vec![openai(), ollama(), cohere(), horde(), custom()]
}

fn openai() -> BackendTemplate {
    BackendTemplate {
        name: "OpenAI Compatible".to_string(),
        payload_type: PayloadType::OpenAi,
        completion_type: CompletionType::ChatCompletions,
        prompt_key: "messages".to_string(),
        stop_key: "stop".to_string(),
        use_stop: true,
        sampler_fields: vec![
            field(SamplerId::MaxLength, "max_context_length"),
            field(SamplerId::GeneratedLength, "max_tokens"),
            field(SamplerId::Temperature, "temperature"),
            field(SamplerId::TopP, "top_p"),
            field(SamplerId::FrequencyPenalty, "frequency_penalty"),
            field(SamplerId::PresencePenalty, "presence_penalty"),
            field(SamplerId::Seed, "seed"),
        ],
        remove_length_field: true,
        remove_seed_if_negative: true,
        auth_header: "Authorization".to_string(),
        auth_prefix: "Bearer ".to_string(),
        uses_api_key: true,
        use_model: true,
        supports_multiple_models: false,
        model_name_path: "id".to_string(),
        context_length_path: String::new(),
        use_model_context_length: false,
        model_list_path: "data".to_string(),
        custom_payload_template: None,
    }
}

fn ollama() -> BackendTemplate {
    BackendTemplate {
        name: "Ollama".to_string(),
        payload_type: PayloadType::Ollama,
        completion_type: CompletionType::TextCompletions,
        prompt_key: "prompt".to_string(),
        stop_key: "stop".to_string(),
        use_stop: true,
        sampler_fields: vec![
            field(SamplerId::MaxLength, "num_ctx"),
            field(SamplerId::GeneratedLength, "num_predict"),
            field(SamplerId::Temperature, "temperature"),
            field(SamplerId::TopP, "top_p"),
            field(SamplerId::TopK, "top_k"),
            field(SamplerId::MinP, "min_p"),
            field(SamplerId::RepetitionPenalty, "repeat_penalty"),
            field(SamplerId::Seed, "seed"),
        ],
        remove_length_field: false,
        remove_seed_if_negative: true,
        auth_header: "Authorization".to_string(),
        auth_prefix: "Bearer ".to_string(),
        uses_api_key: false,
        use_model: true,
        supports_multiple_models: false,
        model_name_path: "name".to_string(),
        context_length_path: String::new(),
        use_model_context_length: false,
        model_list_path: "models".to_string(),
        custom_payload_template: None,
    }
}

fn cohere() -> BackendTemplate {
    BackendTemplate {
        name: "Cohere".to_string(),
        payload_type: PayloadType::Cohere,
        completion_type: CompletionType::ChatCompletions,
        prompt_key: "message".to_string(),
        stop_key: "stop_sequences".to_string(),
        use_stop: true,
        sampler_fields: vec![
            field(SamplerId::MaxLength, "max_input_tokens"),
            field(SamplerId::GeneratedLength, "max_tokens"),
            field(SamplerId::Temperature, "temperature"),
            field(SamplerId::TopP, "p"),
            field(SamplerId::TopK, "k"),
            field(SamplerId::FrequencyPenalty, "frequency_penalty"),
            field(SamplerId::PresencePenalty, "presence_penalty"),
            field(SamplerId::Seed, "seed"),
        ],
        remove_length_field: true,
        remove_seed_if_negative: true,
        auth_header: "Authorization".to_string(),
        auth_prefix: "Bearer ".to_string(),
        uses_api_key: true,
        use_model: true,
        supports_multiple_models: false,
        model_name_path: "name".to_string(),
        context_length_path: "context_length".to_string(),
        use_model_context_length: true,
        model_list_path: "models".to_string(),
        custom_payload_template: None,
    }
}

fn horde() -> BackendTemplate {
    BackendTemplate {
        name: "AI Horde".to_string(),
        payload_type: PayloadType::Horde,
        completion_type: CompletionType::TextCompletions,
        prompt_key: "prompt".to_string(),
        stop_key: "stop_sequence".to_string(),
        use_stop: true,
        sampler_fields: vec![
            field(SamplerId::MaxLength, "max_context_length"),
            field(SamplerId::GeneratedLength, "max_length"),
            field(SamplerId::Temperature, "temperature"),
            field(SamplerId::TopP, "top_p"),
            field(SamplerId::TopK, "top_k"),
            field(SamplerId::TopA, "top_a"),
            field(SamplerId::TypicalP, "typical"),
            field(SamplerId::TailFreeSampling, "tfs"),
            field(SamplerId::RepetitionPenalty, "rep_pen"),
            field(SamplerId::RepetitionPenaltyRange, "rep_pen_range"),
        ],
        remove_length_field: false,
        remove_seed_if_negative: false,
        auth_header: "apikey".to_string(),
        auth_prefix: String::new(),
        uses_api_key: true,
        use_model: true,
        supports_multiple_models: true,
        model_name_path: "name".to_string(),
        context_length_path: String::new(),
        use_model_context_length: false,
        // The Horde status endpoint answers with a bare array.
        model_list_path: String::new(),
        custom_payload_template: None,
    }
}

fn custom() -> BackendTemplate {
    BackendTemplate {
        name: "Custom".to_string(),
        payload_type: PayloadType::Custom,
        completion_type: CompletionType::TextCompletions,
        prompt_key: "prompt".to_string(),
        stop_key: "stop".to_string(),
        use_stop: true,
        sampler_fields: vec![
            field(SamplerId::GeneratedLength, "max_tokens"),
            field(SamplerId::Temperature, "temperature"),
            field(SamplerId::TopP, "top_p"),
            field(SamplerId::Seed, "seed"),
        ],
        remove_length_field: false,
        remove_seed_if_negative: false,
        auth_header: "Authorization".to_string(),
        auth_prefix: "Bearer ".to_string(),
        uses_api_key: true,
        use_model: true,
        supports_multiple_models: false,
        model_name_path: String::new(),
        context_length_path: String::new(),
        use_model_context_length: false,
        model_list_path: String::new(),
        custom_payload_template: Some(
            concat!(
                r#"{"model": "{{model}}", "prompt": "{{prompt}}", "#,
                r#""temperature": {{temp}}, "max_tokens": {{genamt}}, "#,
                r#""stop": "{{stop}}"}"#
            )
            .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let templates = builtin_templates();
        assert!(!templates.is_empty());
        validate_catalog(&templates).unwrap();
    }

    #[test]
    fn duplicate_external_names_are_rejected() {
        let mut template = openai();
        template
            .sampler_fields
            .push(field(SamplerId::TopK, "temperature"));

        match template.validate() {
            Err(Error::DuplicateExternalName { field, .. }) => {
                assert_eq!(field, "temperature");
            }
            other => panic!("expected duplicate field error, got {other:?}"),
        }
    }

    #[test]
    fn custom_payload_required_iff_custom() {
        let mut custom = custom();
        custom.custom_payload_template = None;
        assert!(matches!(
            custom.validate(),
            Err(Error::MissingCustomPayload)
        ));

        let mut openai = openai();
        openai.custom_payload_template = Some("{}".to_string());
        assert!(matches!(
            openai.validate(),
            Err(Error::UnexpectedCustomPayload(_))
        ));
    }

    #[test]
    fn templates_round_trip_through_json() {
        let templates = builtin_templates();
        let json = serde_json::to_string(&templates).unwrap();
        let back: Vec<BackendTemplate> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), templates.len());
        assert_eq!(back[0].name, "OpenAI Compatible");
        assert_eq!(back[0].payload_type, PayloadType::OpenAi);
    }
}
