use serde_json::{json, Map, Value};

use crate::context::{assemble, ChatEntry, Prompt};
use crate::error::{Error, Result};
use crate::path::resolve;
use crate::samplers::{SamplerId, SamplerPreset, ValueKind, SAMPLERS};
use crate::template::{BackendTemplate, CompletionType, ConnectionValues, PayloadType};

/// Identifies this client to the Horde queue service.
const HORDE_CLIENT_AGENT: &str = concat!("relay:", env!("CARGO_PKG_VERSION"));

/// Final request body, ready for the external HTTP transport.
///
/// Custom backends produce a raw string (the substituted template text,
/// sent verbatim); every other backend produces a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Raw(String),
}

impl RequestBody {
    /// Serialized form to place on the wire.
    pub fn into_string(self) -> String {
        match self {
            RequestBody::Json(value) => value.to_string(),
            RequestBody::Raw(text) => text,
        }
    }
}

/// Splits a comma-delimited stop-sequence string, discarding empty
/// segments and preserving order. Empty input yields an empty sequence;
/// whether that suppresses the stop field is the template's call.
pub fn build_stop_sequence(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Common field bundle shared by every per-backend assembly branch.
struct Bundle {
    payload_fields: Map<String, Value>,
    model: Option<Value>,
    stop: Option<Value>,
    prompt: Prompt,
}

/// Builds backend-specific request bodies from one template, preset and
/// connection snapshot.
///
/// All inputs arrive as explicit arguments and are treated as immutable
/// for the duration of a build; building is pure and side-effect free, so
/// identical inputs always produce byte-identical output.
pub struct RequestBuilder<'a> {
    template: &'a BackendTemplate,
    preset: &'a SamplerPreset,
    connection: &'a ConnectionValues,
    stop_sequence: Vec<String>,
}

impl<'a> RequestBuilder<'a> {
    /// `stop_sequence` is the formatting configuration's comma-delimited
    /// stop string, after that collaborator has substituted its own macros.
    pub fn new(
        template: &'a BackendTemplate,
        preset: &'a SamplerPreset,
        connection: &'a ConnectionValues,
        stop_sequence: &str,
    ) -> Self {
        Self {
            template,
            preset,
            connection,
            stop_sequence: build_stop_sequence(stop_sequence),
        }
    }

    /// Produces the request body for `history`, dispatching on the
    /// template's payload type.
    ///
    /// # Errors
    ///
    /// Configuration mismatches (Cohere with text completions, a custom
    /// backend without a payload template) yield an error the caller
    /// surfaces to the user; no request is produced.
    pub fn build(&self, history: &[ChatEntry]) -> Result<RequestBody> {
        let bundle = self.bundle(history);
        match self.template.payload_type {
            PayloadType::OpenAi => Ok(RequestBody::Json(self.openai(bundle))),
            PayloadType::Ollama => Ok(RequestBody::Json(self.ollama(bundle))),
            PayloadType::Cohere => Ok(RequestBody::Json(self.cohere(bundle)?)),
            PayloadType::Horde => Ok(RequestBody::Json(self.horde(bundle))),
            PayloadType::Custom => Ok(RequestBody::Raw(self.custom(bundle)?)),
        }
    }

    /// Header map to authenticate the request, derived by the same rule as
    /// the catalog fetch.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if self.template.uses_api_key {
            headers.push((
                self.template.auth_header.clone(),
                format!("{}{}", self.template.auth_prefix, self.connection.api_key),
            ));
        }
        if self.template.payload_type == PayloadType::Horde {
            headers.push(("Client-Agent".to_string(), HORDE_CLIENT_AGENT.to_string()));
        }
        headers
    }

    /// Display name(s) of the selected model, resolved through the
    /// template's name path. Multiple-model templates resolve per element.
    pub fn model_name(&self) -> Value {
        let path = &self.template.model_name_path;
        if self.template.supports_multiple_models {
            if let Some(items) = self.connection.model.as_array() {
                return Value::Array(
                    items
                        .iter()
                        .map(|item| resolve(item, path).cloned().unwrap_or(Value::Null))
                        .collect(),
                );
            }
        }
        resolve(&self.connection.model, path)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Context length advertised by the selected model, honored only when
    /// the resolved value is an integer.
    pub fn model_context_length(&self) -> Option<u64> {
        resolve(&self.connection.model, &self.template.context_length_path)?.as_u64()
    }

    fn bundle(&self, history: &[ChatEntry]) -> Bundle {
        let (payload_fields, budget) = self.sampler_fields();

        let model = self.template.use_model.then(|| self.model_name());
        let stop = self
            .template
            .use_stop
            .then(|| Value::from(self.stop_sequence.clone()));
        let prompt = assemble(budget, self.template.completion_type, history);

        Bundle {
            payload_fields,
            model,
            stop,
            prompt,
        }
    }

    /// Maps the preset onto the template's external field names, in
    /// declared order, with type coercion. Returns the fields plus the
    /// prompt budget read from the context-length field (0 when absent).
    ///
    /// Whether a field is present or suppressed is decided here, before
    /// the map is handed to a backend branch; branches never delete keys.
    fn sampler_fields(&self) -> (Map<String, Value>, u64) {
        let model_context = self
            .template
            .use_model_context_length
            .then(|| self.model_context_length())
            .flatten();

        let mut fields = Map::new();
        let mut budget = 0;
        for sampler_field in &self.template.sampler_fields {
            let Some(raw) = self.preset.get(sampler_field.sampler) else {
                continue;
            };
            let value = coerce(sampler_field.sampler, raw, model_context);

            if sampler_field.sampler == SamplerId::MaxLength {
                budget = value.as_u64().unwrap_or(0);
                if self.template.remove_length_field {
                    continue;
                }
            }
            if sampler_field.sampler == SamplerId::Seed
                && self.template.remove_seed_if_negative
                && value.as_f64().is_some_and(|seed| seed < 0.0)
            {
                continue;
            }

            fields.insert(sampler_field.external_name.clone(), value);
        }
        (fields, budget)
    }

    fn openai(&self, bundle: Bundle) -> Value {
        let mut body = bundle.payload_fields;
        if let Some(model) = bundle.model {
            body.insert("model".to_string(), model);
        }
        if let Some(stop) = bundle.stop {
            body.insert(self.template.stop_key.clone(), stop);
        }
        body.insert(self.template.prompt_key.clone(), bundle.prompt.into_value());
        Value::Object(body)
    }

    fn ollama(&self, bundle: Bundle) -> Value {
        let mut options = bundle.payload_fields;
        if let Some(stop) = bundle.stop {
            options.insert(self.template.stop_key.clone(), stop);
        }

        let mut body = Map::new();
        body.insert("options".to_string(), Value::Object(options));
        if let Some(model) = bundle.model {
            body.insert("model".to_string(), model);
        }
        body.insert(self.template.prompt_key.clone(), bundle.prompt.into_value());
        body.insert("raw".to_string(), Value::Bool(true));
        body.insert("stream".to_string(), Value::Bool(true));
        Value::Object(body)
    }

    /// Cohere's chat shape: the first turn becomes the preamble, the last
    /// is re-emitted directly under the prompt key, everything in between
    /// is chat history.
    fn cohere(&self, bundle: Bundle) -> Result<Value> {
        if self.template.completion_type == CompletionType::TextCompletions {
            return Err(Error::UnsupportedCompletionType);
        }
        let Prompt::Messages(mut messages) = bundle.prompt else {
            return Err(Error::PromptShapeMismatch);
        };
        if messages.is_empty() {
            return Err(Error::PromptShapeMismatch);
        }

        let preamble = messages.remove(0);
        let last = messages.pop().map(|entry| entry.message).unwrap_or_default();

        let mut body = bundle.payload_fields;
        if let Some(stop) = bundle.stop {
            body.insert(self.template.stop_key.clone(), stop);
        }
        if let Some(model) = bundle.model {
            body.insert("model".to_string(), model);
        }
        body.insert("preamble".to_string(), Value::String(preamble.message));
        body.insert(
            "chat_history".to_string(),
            serde_json::to_value(messages)?,
        );
        body.insert(self.template.prompt_key.clone(), Value::String(last));
        Ok(Value::Object(body))
    }

    fn horde(&self, bundle: Bundle) -> Value {
        let mut params = bundle.payload_fields;
        params.insert("n".to_string(), json!(1));
        params.insert("frmtadsnsp".to_string(), json!(false));
        params.insert("frmtrmblln".to_string(), json!(false));
        params.insert("frmtrmspch".to_string(), json!(false));
        params.insert("frmttriminc".to_string(), json!(true));
        if let Some(stop) = bundle.stop {
            params.insert(self.template.stop_key.clone(), stop);
        }

        let mut body = Map::new();
        body.insert("params".to_string(), Value::Object(params));
        body.insert(self.template.prompt_key.clone(), bundle.prompt.into_value());
        body.insert("trusted_workers".to_string(), json!(false));
        body.insert("slow_workers".to_string(), json!(true));
        body.insert("workers".to_string(), json!([]));
        body.insert("worker_blacklist".to_string(), json!(false));
        body.insert(
            "models".to_string(),
            bundle.model.unwrap_or(Value::Array(Vec::new())),
        );
        body.insert("dry_run".to_string(), json!(false));
        Value::Object(body)
    }

    /// Literal find/replace over the custom payload template: every
    /// sampler macro token first (empty string when the preset has no
    /// value), then the reserved `{{stop}}`, `{{prompt}}` and `{{model}}`
    /// tokens. Tokens inside string literals are substituted like any
    /// other occurrence; escaping is the template author's concern.
    fn custom(&self, bundle: Bundle) -> Result<String> {
        let Some(payload) = &self.template.custom_payload_template else {
            // Unreachable for validated catalogs, still a recoverable
            // configuration error at build time.
            return Err(Error::MissingCustomPayload);
        };

        let mut body = payload.clone();
        for descriptor in SAMPLERS {
            let value = self
                .preset
                .get(descriptor.id)
                .map(stringify)
                .unwrap_or_default();
            body = body.replace(descriptor.macro_token, &value);
        }

        let prompt = match bundle.prompt {
            Prompt::Text(text) => text,
            Prompt::Messages(messages) => serde_json::to_string(&messages)?,
        };
        body = body.replace("{{stop}}", &self.stop_sequence.join(","));
        body = body.replace("{{prompt}}", &prompt);
        body = body.replace("{{model}}", &stringify(&self.model_name()));
        Ok(body)
    }
}

/// Coerces one raw preset value for emission: integer kinds are floored,
/// the context length is clamped to the model's advertised limit, and the
/// DRY sequence break splits its comma-delimited string into a list.
fn coerce(id: SamplerId, raw: &Value, model_context: Option<u64>) -> Value {
    if id == SamplerId::DrySequenceBreak {
        if let Some(text) = raw.as_str() {
            return Value::Array(text.split(',').map(Value::from).collect());
        }
        return raw.clone();
    }

    let Some(number) = raw.as_f64() else {
        return raw.clone();
    };

    if id == SamplerId::MaxLength {
        let floored = number.floor() as u64;
        return match model_context {
            Some(limit) => Value::from(floored.min(limit)),
            None => Value::from(floored),
        };
    }

    match id.descriptor().kind {
        ValueKind::Integer => Value::from(number.floor() as i64),
        _ => raw.clone(),
    }
}

/// Value-to-text conversion for macro substitution: strings drop their
/// quotes, arrays join their stringified elements with commas, everything
/// else uses its JSON rendering.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}
