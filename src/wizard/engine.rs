//! Wizard engine — step transitions, per-step validation gating, and the
//! commit of each step's answers into the record.
//!
//! Every `advance` validates the whole submitted form first and only then
//! mutates state, so a failed call leaves `WizardState` byte-identical and
//! reports every violated rule at once.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, WizardError};
use crate::lookup::{PostalCodeResolver, normalize_postal_code};

use super::record::{
    Address, AnswerRecord, Commercial, Infrastructure, MammographyRegistry, Modality, Party,
    PaymentModel, Sla, SlaTarget, VolumeProfile,
};
use super::step::Step;

/// The whole session state: where the user is, plus what they answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub current_step: Step,
    pub record: AnswerRecord,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-modality volume input as entered by the user. The remainder
/// percentage is not part of the draft; the engine computes it on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VolumeDraft {
    Standard {
        monthly_volume: u32,
        urgent_pct: u8,
        inpatient_pct: u8,
    },
    Ultrasound {
        monthly_volume: u32,
        doppler_pct: u8,
        fetal_pct: u8,
        operating_hours: String,
    },
}

/// User edits applied on top of a resolved address before it is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_state: Option<String>,
}

/// Infrastructure step input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureForm {
    pub image_submission_link: Party,
    pub image_storage: Party,
    pub systems_integration: bool,
    pub pacs_system: String,
    pub his_system: String,
    pub pacs_server: Party,
    pub patient_portal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mammography_registry: Option<MammographyRegistry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub address_overrides: AddressOverrides,
}

/// The typed input payload for one step's `advance` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepForm {
    Modalities {
        selected: Vec<Modality>,
    },
    Volumetry {
        profiles: HashMap<Modality, VolumeDraft>,
    },
    UnitCount {
        unit_count: u32,
    },
    Infrastructure(InfrastructureForm),
    Commercial {
        payment_model: PaymentModel,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum_volume: Option<bool>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        history_6m: HashMap<Modality, u32>,
    },
    Sla {
        urgent: String,
        inpatient: String,
        elective: String,
    },
}

/// Drives the step sequence over an externally owned [`WizardState`].
pub struct WizardEngine {
    resolver: Arc<dyn PostalCodeResolver>,
}

impl WizardEngine {
    pub fn new(resolver: Arc<dyn PostalCodeResolver>) -> Self {
        Self { resolver }
    }

    /// Validate `form` against the current step and, on success, commit its
    /// answers and move to the successor step.
    ///
    /// On failure the state is untouched and every violated rule is
    /// reported, so repeating the same invalid call reproduces the same
    /// error set.
    pub async fn advance(
        &self,
        state: &mut WizardState,
        form: StepForm,
    ) -> Result<Step, WizardError> {
        let step = state.current_step;
        if step.is_terminal() {
            return Err(WizardError::AtTerminal);
        }

        match (step, form) {
            (Step::Modalities, StepForm::Modalities { selected }) => {
                apply_modalities(&mut state.record, selected)?;
            }
            (Step::Volumetry, StepForm::Volumetry { profiles }) => {
                apply_volumetry(&mut state.record, profiles)?;
            }
            (Step::UnitCount, StepForm::UnitCount { unit_count }) => {
                apply_unit_count(&mut state.record, unit_count)?;
            }
            (Step::Infrastructure, StepForm::Infrastructure(form)) => {
                self.apply_infrastructure(&mut state.record, form).await?;
            }
            (Step::Commercial, StepForm::Commercial { payment_model, minimum_volume, history_6m }) => {
                apply_commercial(&mut state.record, payment_model, minimum_volume, history_6m)?;
            }
            (Step::Sla, StepForm::Sla { urgent, inpatient, elective }) => {
                apply_sla(&mut state.record, &urgent, &inpatient, &elective)?;
            }
            (step, _) => return Err(WizardError::FormMismatch { step }),
        }

        let next = step.next().expect("non-terminal step has a successor");
        state.current_step = next;
        if next.is_terminal() && state.record.completed_at.is_none() {
            state.record.completed_at = Some(Utc::now());
        }
        Ok(next)
    }

    /// Move back to the predecessor step, if any, leaving the record as is
    /// so the user can review and edit. Returns the new step, or `None`
    /// when already at the first step.
    pub fn retreat(&self, state: &mut WizardState) -> Option<Step> {
        let prev = state.current_step.prev()?;
        state.current_step = prev;
        Some(prev)
    }

    async fn apply_infrastructure(
        &self,
        record: &mut AnswerRecord,
        form: InfrastructureForm,
    ) -> Result<(), WizardError> {
        let mut errors = Vec::new();

        if form.pacs_system.trim().is_empty() {
            errors.push(ValidationError::EmptyField { field: "pacs_system" });
        }
        if form.his_system.trim().is_empty() {
            errors.push(ValidationError::EmptyField { field: "his_system" });
        }

        let mammography_selected = record.modalities.contains(&Modality::Mammography);
        if mammography_selected && form.mammography_registry.is_none() {
            errors.push(ValidationError::MissingMammographyRegistry);
        }

        let mut unit_address = None;
        if form.image_submission_link == Party::Provider {
            match &form.postal_code {
                None => errors.push(ValidationError::MissingPostalCode),
                Some(raw) => match normalize_postal_code(raw) {
                    None => errors.push(ValidationError::MalformedPostalCode { code: raw.clone() }),
                    Some(code) => match self.resolver.resolve(&code).await {
                        Ok(Some(resolved)) => {
                            let overrides = &form.address_overrides;
                            unit_address = Some(Address {
                                postal_code: format!("{}-{}", &code[..5], &code[5..]),
                                street: overrides.street.clone().unwrap_or(resolved.street),
                                district: overrides.district.clone().unwrap_or(resolved.district),
                                city_state: overrides.city_state.clone().unwrap_or_else(|| {
                                    format!("{}/{}", resolved.city, resolved.state)
                                }),
                            });
                        }
                        Ok(None) => {
                            errors.push(ValidationError::UnresolvedPostalCode { code });
                        }
                        Err(e) => {
                            // Timeouts and transport failures read as not-found.
                            tracing::warn!(code = %code, error = %e, "postal code lookup failed");
                            errors.push(ValidationError::UnresolvedPostalCode { code });
                        }
                    },
                },
            }
        }

        if !errors.is_empty() {
            return Err(WizardError::Invalid(errors));
        }

        record.infrastructure = Some(Infrastructure {
            image_submission_link: form.image_submission_link,
            image_storage: form.image_storage,
            systems_integration: form.systems_integration,
            pacs_system: form.pacs_system,
            his_system: form.his_system,
            pacs_server: form.pacs_server,
            patient_portal: form.patient_portal,
            mammography_registry: if mammography_selected {
                form.mammography_registry
            } else {
                None
            },
            unit_address,
        });
        Ok(())
    }
}

fn apply_modalities(
    record: &mut AnswerRecord,
    selected: Vec<Modality>,
) -> Result<(), WizardError> {
    let mut errors = Vec::new();
    if selected.is_empty() {
        errors.push(ValidationError::EmptyModalities);
    }

    let mut seen = Vec::new();
    let mut reported = Vec::new();
    for modality in &selected {
        if seen.contains(modality) {
            if !reported.contains(modality) {
                errors.push(ValidationError::DuplicateModality { modality: *modality });
                reported.push(*modality);
            }
        } else {
            seen.push(*modality);
        }
    }

    if !errors.is_empty() {
        return Err(WizardError::Invalid(errors));
    }

    record.modalities = selected;
    Ok(())
}

fn apply_volumetry(
    record: &mut AnswerRecord,
    profiles: HashMap<Modality, VolumeDraft>,
) -> Result<(), WizardError> {
    let mut errors = Vec::new();

    for modality in &record.modalities {
        match profiles.get(modality) {
            None => errors.push(ValidationError::MissingVolume { modality: *modality }),
            Some(draft) => validate_draft(*modality, draft, &mut errors),
        }
    }
    // Stable iteration order keeps repeated failures byte-identical.
    for modality in Modality::ALL {
        if profiles.contains_key(&modality) && !record.modalities.contains(&modality) {
            errors.push(ValidationError::UnselectedModality { modality });
        }
    }

    if !errors.is_empty() {
        return Err(WizardError::Invalid(errors));
    }

    let mut volumetry = HashMap::new();
    for modality in &record.modalities {
        let draft = profiles
            .get(modality)
            .expect("validated: every selected modality has a draft");
        volumetry.insert(*modality, commit_draft(draft));
    }
    record.volumetry = volumetry;
    Ok(())
}

fn validate_draft(modality: Modality, draft: &VolumeDraft, errors: &mut Vec<ValidationError>) {
    match (modality.uses_ultrasound_profile(), draft) {
        (false, VolumeDraft::Standard { urgent_pct, inpatient_pct, .. }) => {
            let sum = u32::from(*urgent_pct) + u32::from(*inpatient_pct);
            if sum > 100 {
                errors.push(ValidationError::PercentSumExceeded { modality, sum });
            }
        }
        (true, VolumeDraft::Ultrasound { doppler_pct, fetal_pct, operating_hours, .. }) => {
            let sum = u32::from(*doppler_pct) + u32::from(*fetal_pct);
            if sum > 100 {
                errors.push(ValidationError::PercentSumExceeded { modality, sum });
            }
            if operating_hours.trim().is_empty() {
                errors.push(ValidationError::EmptyOperatingHours { modality });
            }
        }
        _ => errors.push(ValidationError::ProfileMismatch { modality }),
    }
}

/// Turn a validated draft into a stored profile, computing the remainder
/// percentage exactly once.
fn commit_draft(draft: &VolumeDraft) -> VolumeProfile {
    match draft {
        VolumeDraft::Standard { monthly_volume, urgent_pct, inpatient_pct } => {
            let remainder = 100 - u32::from(*urgent_pct) - u32::from(*inpatient_pct);
            VolumeProfile::Standard {
                monthly_volume: *monthly_volume,
                urgent_pct: *urgent_pct,
                inpatient_pct: *inpatient_pct,
                elective_pct: remainder as u8,
            }
        }
        VolumeDraft::Ultrasound { monthly_volume, doppler_pct, fetal_pct, operating_hours } => {
            let remainder = 100 - u32::from(*doppler_pct) - u32::from(*fetal_pct);
            VolumeProfile::Ultrasound {
                monthly_volume: *monthly_volume,
                doppler_pct: *doppler_pct,
                fetal_pct: *fetal_pct,
                simple_pct: remainder as u8,
                operating_hours: operating_hours.clone(),
            }
        }
    }
}

fn apply_unit_count(record: &mut AnswerRecord, unit_count: u32) -> Result<(), WizardError> {
    if unit_count < 1 {
        return Err(WizardError::Invalid(vec![ValidationError::UnitCountTooLow]));
    }
    record.unit_count = Some(unit_count);
    Ok(())
}

fn apply_commercial(
    record: &mut AnswerRecord,
    payment_model: PaymentModel,
    minimum_volume: Option<bool>,
    history_6m: HashMap<Modality, u32>,
) -> Result<(), WizardError> {
    let mut errors = Vec::new();

    if payment_model.requires_history() {
        for modality in &record.modalities {
            if !history_6m.contains_key(modality) {
                errors.push(ValidationError::MissingHistory { modality: *modality });
            }
        }
        for modality in Modality::ALL {
            if history_6m.contains_key(&modality) && !record.modalities.contains(&modality) {
                errors.push(ValidationError::UnselectedModality { modality });
            }
        }
    }

    if !errors.is_empty() {
        return Err(WizardError::Invalid(errors));
    }

    record.history_6m = if payment_model.requires_history() {
        history_6m
    } else {
        HashMap::new()
    };
    record.commercial = Some(Commercial { payment_model, minimum_volume });
    Ok(())
}

fn apply_sla(
    record: &mut AnswerRecord,
    urgent: &str,
    inpatient: &str,
    elective: &str,
) -> Result<(), WizardError> {
    let mut errors = Vec::new();
    let mut parse = |field: &'static str, input: &str| match SlaTarget::parse(input) {
        Ok(target) => Some(target),
        Err(reason) => {
            errors.push(ValidationError::InvalidSla { field, reason });
            None
        }
    };

    let urgent = parse("urgent", urgent);
    let inpatient = parse("inpatient", inpatient);
    let elective = parse("elective", elective);

    if !errors.is_empty() {
        return Err(WizardError::Invalid(errors));
    }

    record.sla = Some(Sla {
        urgent: urgent.expect("validated"),
        inpatient: inpatient.expect("validated"),
        elective: elective.expect("validated"),
    });
    Ok(())
}
