//! Declarative per-step field sets.
//!
//! The rendering surface asks "which fields apply to this step given this
//! record" and the engine validates exactly that computed set, so conditional
//! fields (per-modality volume groups, the mammography registry, the
//! provider-side address, per-exam history) live here instead of inline in
//! any widget code.

use serde::Serialize;

use super::record::{AnswerRecord, Modality};
use super::step::Step;

/// What kind of input a field takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    MultiSelect { options: Vec<String> },
    Select { options: Vec<String> },
    Integer,
    Percent,
    Text,
    Toggle,
    PostalCode,
    Duration,
}

/// One field the surface should render for the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Stable identifier, unique within a step.
    pub name: String,
    /// Human label.
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Whether the field must be filled for `advance` to succeed. Fields
    /// whose requiredness depends on a same-step answer (the address group
    /// when the submission link is provider-side, the history group under
    /// per-exam billing) are listed as not required here; the engine
    /// enforces them at validation.
    pub required: bool,
}

impl FieldSpec {
    fn required(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), label: label.into(), kind, required: true }
    }

    fn optional(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), label: label.into(), kind, required: false }
    }
}

fn party_options() -> Vec<String> {
    vec!["Provider".to_string(), "Client".to_string()]
}

/// The fields that apply to `step` given the answers collected so far.
pub fn fields_for(step: Step, record: &AnswerRecord) -> Vec<FieldSpec> {
    match step {
        Step::Modalities => vec![FieldSpec::required(
            "modalities",
            "Which modalities are in scope?",
            FieldKind::MultiSelect {
                options: Modality::ALL.iter().map(ToString::to_string).collect(),
            },
        )],
        Step::Volumetry => volumetry_fields(record),
        Step::UnitCount => vec![FieldSpec::required(
            "unit_count",
            "Number of served units",
            FieldKind::Integer,
        )],
        Step::Infrastructure => infrastructure_fields(record),
        Step::Commercial => commercial_fields(record),
        Step::Sla => vec![
            FieldSpec::required("sla.urgent", "Report SLA – urgent", FieldKind::Duration),
            FieldSpec::required("sla.inpatient", "Report SLA – inpatient", FieldKind::Duration),
            FieldSpec::required("sla.elective", "Report SLA – elective", FieldKind::Duration),
        ],
        Step::Final => Vec::new(),
    }
}

fn volumetry_fields(record: &AnswerRecord) -> Vec<FieldSpec> {
    let mut fields = Vec::new();
    for modality in &record.modalities {
        let key = modality.key();
        fields.push(FieldSpec::required(
            format!("{key}.monthly_volume"),
            format!("Monthly volume – {modality}"),
            FieldKind::Integer,
        ));
        if modality.uses_ultrasound_profile() {
            fields.push(FieldSpec::required(
                format!("{key}.doppler_pct"),
                format!("% doppler – {modality}"),
                FieldKind::Percent,
            ));
            fields.push(FieldSpec::required(
                format!("{key}.fetal_pct"),
                format!("% fetal – {modality}"),
                FieldKind::Percent,
            ));
            fields.push(FieldSpec::required(
                format!("{key}.operating_hours"),
                format!("Operating hours – {modality}"),
                FieldKind::Text,
            ));
        } else {
            fields.push(FieldSpec::required(
                format!("{key}.urgent_pct"),
                format!("% urgent – {modality}"),
                FieldKind::Percent,
            ));
            fields.push(FieldSpec::required(
                format!("{key}.inpatient_pct"),
                format!("% inpatient – {modality}"),
                FieldKind::Percent,
            ));
        }
    }
    fields
}

fn infrastructure_fields(record: &AnswerRecord) -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::required(
            "image_submission_link",
            "Image submission link",
            FieldKind::Select { options: party_options() },
        ),
        FieldSpec::required(
            "image_storage",
            "Image storage",
            FieldKind::Select { options: party_options() },
        ),
        FieldSpec::required("systems_integration", "Systems integration needed?", FieldKind::Toggle),
        FieldSpec::required("pacs_system", "Client PACS", FieldKind::Text),
        FieldSpec::required("his_system", "Client HIS", FieldKind::Text),
        FieldSpec::required(
            "pacs_server",
            "PACS server / router",
            FieldKind::Select { options: party_options() },
        ),
        FieldSpec::required("patient_portal", "Patient portal?", FieldKind::Toggle),
    ];

    if record.modalities.contains(&Modality::Mammography) {
        fields.push(FieldSpec::required(
            "mammography_registry",
            "Mammography registry",
            FieldKind::Select {
                options: vec!["SISCAN".to_string(), "SISMAMA".to_string()],
            },
        ));
    }

    // Required by validation only when the submission link is provider-side.
    fields.push(FieldSpec::optional("postal_code", "Unit postal code", FieldKind::PostalCode));
    fields.push(FieldSpec::optional("address.street", "Street", FieldKind::Text));
    fields.push(FieldSpec::optional("address.district", "District", FieldKind::Text));
    fields.push(FieldSpec::optional("address.city_state", "City / state", FieldKind::Text));

    fields
}

fn commercial_fields(record: &AnswerRecord) -> Vec<FieldSpec> {
    let mut fields = vec![
        FieldSpec::required(
            "payment_model",
            "Payment model",
            FieldKind::Select {
                options: vec!["Fixed + variable".to_string(), "Per exam".to_string()],
            },
        ),
        FieldSpec::optional("minimum_volume", "Minimum monthly volume?", FieldKind::Toggle),
    ];

    // Required by validation only under per-exam billing.
    for modality in &record.modalities {
        fields.push(FieldSpec::optional(
            format!("history_6m.{}", modality.key()),
            format!("6-month average volume – {modality}"),
            FieldKind::Integer,
        ));
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::record::AnswerRecord;

    fn record_with(modalities: &[Modality]) -> AnswerRecord {
        AnswerRecord { modalities: modalities.to_vec(), ..Default::default() }
    }

    #[test]
    fn final_step_has_no_fields() {
        assert!(fields_for(Step::Final, &AnswerRecord::default()).is_empty());
    }

    #[test]
    fn volumetry_shape_follows_modality() {
        let record = record_with(&[Modality::XRay, Modality::Ultrasound]);
        let fields = fields_for(Step::Volumetry, &record);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();

        assert!(names.contains(&"x_ray.urgent_pct"));
        assert!(names.contains(&"x_ray.inpatient_pct"));
        assert!(!names.contains(&"x_ray.doppler_pct"));

        assert!(names.contains(&"ultrasound.doppler_pct"));
        assert!(names.contains(&"ultrasound.fetal_pct"));
        assert!(names.contains(&"ultrasound.operating_hours"));
        assert!(!names.contains(&"ultrasound.urgent_pct"));
    }

    #[test]
    fn mammography_registry_is_conditional() {
        let without = fields_for(Step::Infrastructure, &record_with(&[Modality::XRay]));
        assert!(!without.iter().any(|f| f.name == "mammography_registry"));

        let with = fields_for(Step::Infrastructure, &record_with(&[Modality::Mammography]));
        let registry = with
            .iter()
            .find(|f| f.name == "mammography_registry")
            .expect("registry field present");
        assert!(registry.required);
    }

    #[test]
    fn address_fields_are_not_statically_required() {
        let fields = fields_for(Step::Infrastructure, &record_with(&[Modality::XRay]));
        let postal = fields.iter().find(|f| f.name == "postal_code").unwrap();
        assert!(!postal.required);
    }

    #[test]
    fn commercial_lists_history_per_modality() {
        let record = record_with(&[Modality::XRay, Modality::Densitometry]);
        let fields = fields_for(Step::Commercial, &record);
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"history_6m.x_ray"));
        assert!(names.contains(&"history_6m.densitometry"));
    }

    #[test]
    fn field_names_are_unique_per_step() {
        let record = record_with(&[Modality::XRay, Modality::Mammography, Modality::Ultrasound]);
        for step in [
            Step::Modalities,
            Step::Volumetry,
            Step::UnitCount,
            Step::Infrastructure,
            Step::Commercial,
            Step::Sla,
        ] {
            let fields = fields_for(step, &record);
            let mut names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
            names.sort_unstable();
            let len = names.len();
            names.dedup();
            assert_eq!(len, names.len(), "duplicate field name in {step}");
        }
    }
}
