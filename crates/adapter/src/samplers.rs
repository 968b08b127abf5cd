use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical identifier of one generation-control parameter.
///
/// The serde rename of each variant is the wire key used by persisted
/// presets and by the `{{key}}` macro token of the custom-template engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplerId {
    #[serde(rename = "max_length")]
    MaxLength,
    #[serde(rename = "genamt")]
    GeneratedLength,
    #[serde(rename = "temp")]
    Temperature,
    #[serde(rename = "top_p")]
    TopP,
    #[serde(rename = "top_k")]
    TopK,
    #[serde(rename = "top_a")]
    TopA,
    #[serde(rename = "min_p")]
    MinP,
    #[serde(rename = "typical")]
    TypicalP,
    #[serde(rename = "tfs")]
    TailFreeSampling,
    #[serde(rename = "rep_pen")]
    RepetitionPenalty,
    #[serde(rename = "rep_pen_range")]
    RepetitionPenaltyRange,
    #[serde(rename = "freq_pen")]
    FrequencyPenalty,
    #[serde(rename = "presence_pen")]
    PresencePenalty,
    #[serde(rename = "mirostat_mode")]
    MirostatMode,
    #[serde(rename = "mirostat_tau")]
    MirostatTau,
    #[serde(rename = "mirostat_eta")]
    MirostatEta,
    #[serde(rename = "dynatemp_range")]
    DynatempRange,
    #[serde(rename = "smoothing_factor")]
    SmoothingFactor,
    #[serde(rename = "seed")]
    Seed,
    #[serde(rename = "ban_eos_token")]
    BanEosToken,
    #[serde(rename = "dry_multiplier")]
    DryMultiplier,
    #[serde(rename = "dry_base")]
    DryBase,
    #[serde(rename = "dry_allowed_length")]
    DryAllowedLength,
    #[serde(rename = "dry_sequence_break")]
    DrySequenceBreak,
    #[serde(rename = "xtc_threshold")]
    XtcThreshold,
    #[serde(rename = "xtc_probability")]
    XtcProbability,
}

/// The value shape a sampler carries in a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    String,
    List,
    Boolean,
}

/// Registry entry for one sampler.
#[derive(Debug)]
pub struct SamplerDescriptor {
    pub id: SamplerId,
    /// Wire key used by persisted presets.
    pub key: &'static str,
    /// Placeholder replaced by the custom-template engine.
    pub macro_token: &'static str,
    pub kind: ValueKind,
}

/// The fixed, process-wide sampler catalog. Order matches [`SamplerId`].
pub const SAMPLERS: &[SamplerDescriptor] = &[
    SamplerDescriptor {
        id: SamplerId::MaxLength,
        key: "max_length",
        macro_token: "{{max_length}}",
        kind: ValueKind::Integer,
    },
    SamplerDescriptor {
        id: SamplerId::GeneratedLength,
        key: "genamt",
        macro_token: "{{genamt}}",
        kind: ValueKind::Integer,
    },
    SamplerDescriptor {
        id: SamplerId::Temperature,
        key: "temp",
        macro_token: "{{temp}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::TopP,
        key: "top_p",
        macro_token: "{{top_p}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::TopK,
        key: "top_k",
        macro_token: "{{top_k}}",
        kind: ValueKind::Integer,
    },
    SamplerDescriptor {
        id: SamplerId::TopA,
        key: "top_a",
        macro_token: "{{top_a}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::MinP,
        key: "min_p",
        macro_token: "{{min_p}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::TypicalP,
        key: "typical",
        macro_token: "{{typical}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::TailFreeSampling,
        key: "tfs",
        macro_token: "{{tfs}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::RepetitionPenalty,
        key: "rep_pen",
        macro_token: "{{rep_pen}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::RepetitionPenaltyRange,
        key: "rep_pen_range",
        macro_token: "{{rep_pen_range}}",
        kind: ValueKind::Integer,
    },
    SamplerDescriptor {
        id: SamplerId::FrequencyPenalty,
        key: "freq_pen",
        macro_token: "{{freq_pen}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::PresencePenalty,
        key: "presence_pen",
        macro_token: "{{presence_pen}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::MirostatMode,
        key: "mirostat_mode",
        macro_token: "{{mirostat_mode}}",
        kind: ValueKind::Integer,
    },
    SamplerDescriptor {
        id: SamplerId::MirostatTau,
        key: "mirostat_tau",
        macro_token: "{{mirostat_tau}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::MirostatEta,
        key: "mirostat_eta",
        macro_token: "{{mirostat_eta}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::DynatempRange,
        key: "dynatemp_range",
        macro_token: "{{dynatemp_range}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::SmoothingFactor,
        key: "smoothing_factor",
        macro_token: "{{smoothing_factor}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::Seed,
        key: "seed",
        macro_token: "{{seed}}",
        kind: ValueKind::Integer,
    },
    SamplerDescriptor {
        id: SamplerId::BanEosToken,
        key: "ban_eos_token",
        macro_token: "{{ban_eos_token}}",
        kind: ValueKind::Boolean,
    },
    SamplerDescriptor {
        id: SamplerId::DryMultiplier,
        key: "dry_multiplier",
        macro_token: "{{dry_multiplier}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::DryBase,
        key: "dry_base",
        macro_token: "{{dry_base}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::DryAllowedLength,
        key: "dry_allowed_length",
        macro_token: "{{dry_allowed_length}}",
        kind: ValueKind::Integer,
    },
    SamplerDescriptor {
        id: SamplerId::DrySequenceBreak,
        key: "dry_sequence_break",
        macro_token: "{{dry_sequence_break}}",
        kind: ValueKind::List,
    },
    SamplerDescriptor {
        id: SamplerId::XtcThreshold,
        key: "xtc_threshold",
        macro_token: "{{xtc_threshold}}",
        kind: ValueKind::Float,
    },
    SamplerDescriptor {
        id: SamplerId::XtcProbability,
        key: "xtc_probability",
        macro_token: "{{xtc_probability}}",
        kind: ValueKind::Float,
    },
];

impl SamplerId {
    /// Registry entry for this sampler.
    pub fn descriptor(self) -> &'static SamplerDescriptor {
        // SAMPLERS is ordered by enum discriminant.
        &SAMPLERS[self as usize]
    }

    /// Wire key used by persisted presets.
    pub fn key(self) -> &'static str {
        self.descriptor().key
    }
}

/// A saved set of concrete sampler values.
///
/// Presets are persisted externally as a flat JSON object keyed by sampler
/// wire key. Keys the registry does not know are preserved but never read;
/// presets written by older application versions carry extra fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamplerPreset(serde_json::Map<String, Value>);

impl SamplerPreset {
    /// Raw preset value for `id`, if present.
    pub fn get(&self, id: SamplerId) -> Option<&Value> {
        self.0.get(id.key())
    }

    pub fn insert(&mut self, id: SamplerId, value: Value) {
        self.0.insert(id.key().to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_order_matches_enum() {
        for (index, descriptor) in SAMPLERS.iter().enumerate() {
            assert_eq!(descriptor.id as usize, index, "{}", descriptor.key);
            assert_eq!(descriptor.id.descriptor().key, descriptor.key);
        }
    }

    #[test]
    fn macro_tokens_wrap_the_wire_key() {
        for descriptor in SAMPLERS {
            assert_eq!(descriptor.macro_token, format!("{{{{{}}}}}", descriptor.key));
        }
    }

    #[test]
    fn preset_reads_by_wire_key_and_ignores_unknown_keys() {
        let preset: SamplerPreset = serde_json::from_value(json!({
            "temp": 0.7,
            "seed": -1,
            "some_future_sampler": true,
        }))
        .unwrap();

        assert_eq!(preset.get(SamplerId::Temperature), Some(&json!(0.7)));
        assert_eq!(preset.get(SamplerId::Seed), Some(&json!(-1)));
        assert_eq!(preset.get(SamplerId::TopP), None);
    }
}
