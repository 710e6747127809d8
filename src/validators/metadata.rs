use std::path::Path;
use std::sync::{Arc, RwLock};

use super::{Candidate, ConfidenceBase, Validator};
use crate::model::{Coordinate, Domain, DocumentStructure, Match, MatchContext, MetadataContent, MetadataKind};

/// One sensitive-field rule: the field names (matched case-insensitively
/// against `MetadataContent::get`), the semantic finding type to emit, and
/// the additive confidence boost for this preprocessor kind (spec §4.6's
/// per-kind table).
#[derive(Clone)]
struct FieldRule {
    fields: &'static [&'static str],
    finding_type: &'static str,
    boost: f64,
}

fn image_rules() -> Vec<FieldRule> {
    vec![
        FieldRule { fields: &["gpslatitude", "gpslongitude", "gpsaltitude"], finding_type: "GPS_COORDINATE", boost: 60.0 },
        FieldRule { fields: &["camera_make", "camera_model", "camera_serial"], finding_type: "DEVICE_IDENTIFIER", boost: 40.0 },
        FieldRule { fields: &["artist", "creator", "copyright"], finding_type: "AUTHOR_INFORMATION", boost: 30.0 },
        FieldRule { fields: &["software"], finding_type: "SOFTWARE_IDENTIFIER", boost: 20.0 },
        FieldRule { fields: &["usercomment"], finding_type: "COMMENT_FIELD", boost: 10.0 },
    ]
}

fn document_rules() -> Vec<FieldRule> {
    vec![
        FieldRule { fields: &["manager"], finding_type: "ORGANIZATIONAL_INFORMATION", boost: 40.0 },
        FieldRule { fields: &["comments", "description", "keywords"], finding_type: "COMMENT_FIELD", boost: 50.0 },
        FieldRule { fields: &["author", "lastmodifiedby"], finding_type: "AUTHOR_INFORMATION", boost: 30.0 },
        FieldRule { fields: &["copyright"], finding_type: "AUTHOR_INFORMATION", boost: 30.0 },
        FieldRule { fields: &["company"], finding_type: "ORGANIZATIONAL_INFORMATION", boost: 20.0 },
    ]
}

fn audio_rules() -> Vec<FieldRule> {
    vec![
        FieldRule { fields: &["contact"], finding_type: "CONTACT_INFORMATION", boost: 50.0 },
        FieldRule { fields: &["management", "booking"], finding_type: "ORGANIZATIONAL_INFORMATION", boost: 40.0 },
        FieldRule { fields: &["artist", "performer", "composer", "albumartist", "tpe1", "tpe2", "tpe3", "tpe4"], finding_type: "AUTHOR_INFORMATION", boost: 30.0 },
        FieldRule { fields: &["social_media"], finding_type: "SOCIAL_MEDIA_REFERENCE", boost: 40.0 },
        FieldRule { fields: &["publisher", "label", "venue", "studio"], finding_type: "ORGANIZATIONAL_INFORMATION", boost: 15.0 },
    ]
}

fn video_rules() -> Vec<FieldRule> {
    vec![
        FieldRule { fields: &["gpslatitude", "gpslongitude", "xyz"], finding_type: "GPS_COORDINATE", boost: 60.0 },
        FieldRule { fields: &["recording_device", "recorded_by"], finding_type: "LOCATION_REFERENCE", boost: 50.0 },
        FieldRule { fields: &["camera_make", "camera_model"], finding_type: "DEVICE_IDENTIFIER", boost: 40.0 },
        FieldRule { fields: &["director", "producer", "studio"], finding_type: "AUTHOR_INFORMATION", boost: 30.0 },
    ]
}

fn rules_for(kind: MetadataKind) -> Vec<FieldRule> {
    match kind {
        MetadataKind::Image => image_rules(),
        MetadataKind::Document => document_rules(),
        MetadataKind::Audio => audio_rules(),
        MetadataKind::Video => video_rules(),
    }
}

fn kind_label(kind: MetadataKind) -> &'static str {
    match kind {
        MetadataKind::Image => "image_metadata",
        MetadataKind::Document => "document_metadata",
        MetadataKind::Audio => "audio_metadata",
        MetadataKind::Video => "video_metadata",
    }
}

/// Preprocessor-kind-aware validator: receives only `MetadataContent` (spec
/// §4.6), never document-body text. Rules are swappable at runtime behind
/// an `RwLock` so a future `--reload-rules` admin path can replace the
/// table atomically without restarting a scan.
pub struct MetadataValidator {
    rules: RwLock<Vec<(MetadataKind, Vec<FieldRule>)>>,
}

impl MetadataValidator {
    pub fn new() -> Self {
        let rules = vec![
            (MetadataKind::Image, image_rules()),
            (MetadataKind::Document, document_rules()),
            (MetadataKind::Audio, audio_rules()),
            (MetadataKind::Video, video_rules()),
        ];
        Self { rules: RwLock::new(rules) }
    }

    /// Atomically replace the entire rule table.
    pub fn replace_rules(&self, kind: MetadataKind, new_rules: Vec<FieldRule>) {
        let mut guard = self.rules.write().unwrap();
        if let Some(entry) = guard.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = new_rules;
        }
    }

    fn domain_multiplier(domain: Domain) -> f64 {
        match domain {
            Domain::Personal => 1.4,
            Domain::Financial | Domain::Healthcare => 1.2,
            _ => 1.0,
        }
    }
}

impl Validator for MetadataValidator {
    fn id(&self) -> &'static str {
        "METADATA"
    }

    fn validate_content(&self, _content: &str, _path: &Path) -> Vec<Match> {
        Vec::new()
    }

    fn calculate_confidence(&self, _candidate: &Candidate) -> ConfidenceBase {
        ConfidenceBase::default()
    }

    fn consumes_metadata(&self) -> bool {
        true
    }

    fn validate_metadata(&self, metadata: &[MetadataContent], path: &Path) -> Vec<Match> {
        let guard = self.rules.read().unwrap();

        let mut matches = Vec::new();
        for content in metadata {
            let Some(kind) = content.kind else { continue };
            let Some((_, rules)) = guard.iter().find(|(k, _)| *k == kind) else { continue };

            for (idx, (field, value)) in content.fields.iter().enumerate() {
                let Some(rule) = rules
                    .iter()
                    .find(|r| r.fields.iter().any(|f| f.eq_ignore_ascii_case(field)))
                else {
                    continue;
                };

                let base = 30.0;
                let confidence = (base + rule.boost).clamp(0.0, 100.0);

                let context = MatchContext {
                    before: String::new(),
                    full_line: format!("{field}: {value}"),
                    after: String::new(),
                    positive_keywords: Vec::new(),
                    negative_keywords: Vec::new(),
                    confidence_impact: 0.0,
                };

                let m = Match {
                    finding_type: rule.finding_type.to_string(),
                    validator_id: "METADATA",
                    matched_text: value.clone(),
                    coordinate: Coordinate {
                        byte_start: 0,
                        byte_end: value.len() as u64,
                        line: 0,
                        column: idx as u32,
                    },
                    confidence,
                    file_path: Arc::new(path.to_path_buf()),
                    context,
                    metadata: vec![
                        ("source".to_string(), kind_label(kind).to_string()),
                        ("field".to_string(), field.clone()),
                    ],
                    cluster_members: Vec::new(),
                };
                matches.push(m);
            }
        }
        matches
    }
}

/// Applies a domain multiplier from whole-file `ContextAnalysis` on top of
/// the per-kind boost table; called by `EnhancedValidatorManager` after
/// `validate_metadata` when it has a `ContextAnalysis` in hand.
pub fn apply_context_adjustment(matches: &mut [Match], domain: Domain, document_type: DocumentStructure) {
    let multiplier = MetadataValidator::domain_multiplier(domain);
    let structural_bonus = if document_type == DocumentStructure::Prose { 0.0 } else { 1.0 };
    for m in matches.iter_mut() {
        m.confidence = (m.confidence * multiplier + structural_bonus).clamp(0.0, 100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn content(kind: MetadataKind, fields: &[(&str, &str)]) -> MetadataContent {
        MetadataContent {
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            kind: Some(kind),
        }
    }

    #[test]
    fn gps_field_gets_large_boost() {
        let validator = MetadataValidator::new();
        let metadata = vec![content(MetadataKind::Image, &[("GPSLatitude", "37.4219")])];
        let matches = validator.validate_metadata(&metadata, &PathBuf::from("photo.jpg"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].finding_type, "GPS_COORDINATE");
        assert!(matches[0].confidence >= 80.0);
    }

    #[test]
    fn document_comments_field_detected() {
        let validator = MetadataValidator::new();
        let metadata = vec![content(
            MetadataKind::Document,
            &[("comments", "internal draft, do not distribute")],
        )];
        let matches = validator.validate_metadata(&metadata, &PathBuf::from("report.docx"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].finding_type, "COMMENT_FIELD");
    }

    #[test]
    fn unmapped_field_is_ignored() {
        let validator = MetadataValidator::new();
        let metadata = vec![content(MetadataKind::Image, &[("orientation", "1")])];
        let matches = validator.validate_metadata(&metadata, &PathBuf::from("photo.jpg"));
        assert!(matches.is_empty());
    }
}
