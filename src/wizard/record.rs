//! Answer record and the domain types collected across a wizard session.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// An imaging exam category offered in the service scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    XRay,
    ComputedTomography,
    MagneticResonance,
    Mammography,
    Densitometry,
    NuclearMedicine,
    Ultrasound,
}

impl Modality {
    /// Every modality, in the order the selection UI offers them.
    pub const ALL: [Modality; 7] = [
        Modality::XRay,
        Modality::ComputedTomography,
        Modality::MagneticResonance,
        Modality::Mammography,
        Modality::Densitometry,
        Modality::NuclearMedicine,
        Modality::Ultrasound,
    ];

    /// Stable snake_case identifier, identical to the serde encoding.
    pub fn key(&self) -> &'static str {
        match self {
            Self::XRay => "x_ray",
            Self::ComputedTomography => "computed_tomography",
            Self::MagneticResonance => "magnetic_resonance",
            Self::Mammography => "mammography",
            Self::Densitometry => "densitometry",
            Self::NuclearMedicine => "nuclear_medicine",
            Self::Ultrasound => "ultrasound",
        }
    }

    /// Ultrasound volumes break down by exam type (doppler/fetal/simple)
    /// instead of clinical urgency, and carry operating hours.
    pub fn uses_ultrasound_profile(&self) -> bool {
        matches!(self, Self::Ultrasound)
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Commercial labels as they appear in the pricing request.
        let s = match self {
            Self::XRay => "Raios-X",
            Self::ComputedTomography => "Tomografia Computadorizada",
            Self::MagneticResonance => "Ressonância Magnética",
            Self::Mammography => "Mamografia",
            Self::Densitometry => "Densitometria",
            Self::NuclearMedicine => "Medicina Nuclear",
            Self::Ultrasound => "Ultrassonografia",
        };
        write!(f, "{s}")
    }
}

/// Who owns a piece of infrastructure: the service provider or the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Provider,
    Client,
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider => write!(f, "Provider"),
            Self::Client => write!(f, "Client"),
        }
    }
}

/// National mammography registry the client reports into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MammographyRegistry {
    Siscan,
    Sismama,
}

impl std::fmt::Display for MammographyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Siscan => write!(f, "SISCAN"),
            Self::Sismama => write!(f, "SISMAMA"),
        }
    }
}

/// How the contract is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentModel {
    FixedPlusVariable,
    PerExam,
}

impl PaymentModel {
    /// Per-exam billing needs a 6-month volume history per modality.
    pub fn requires_history(&self) -> bool {
        matches!(self, Self::PerExam)
    }
}

impl std::fmt::Display for PaymentModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedPlusVariable => write!(f, "Fixed + variable"),
            Self::PerExam => write!(f, "Per exam"),
        }
    }
}

/// Monthly volume plus its breakdown for one modality.
///
/// The remainder percentage (`elective_pct` / `simple_pct`) is computed once
/// by the engine when the step is committed; it is stored, never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VolumeProfile {
    Standard {
        monthly_volume: u32,
        urgent_pct: u8,
        inpatient_pct: u8,
        elective_pct: u8,
    },
    Ultrasound {
        monthly_volume: u32,
        doppler_pct: u8,
        fetal_pct: u8,
        simple_pct: u8,
        operating_hours: String,
    },
}

/// Unit of a report-turnaround target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaUnit {
    Minutes,
    Hours,
    Days,
}

impl std::fmt::Display for SlaUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minutes => write!(f, "min"),
            Self::Hours => write!(f, "h"),
            Self::Days => write!(f, "d"),
        }
    }
}

/// A report-turnaround commitment, e.g. `1h`, `90min`, `2d`.
///
/// Parsed and validated at capture time. A bare number means hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaTarget {
    pub value: u32,
    pub unit: SlaUnit,
}

impl SlaTarget {
    /// Parse a user-entered target such as `"1h"`, `"90 min"`, `"2d"` or `"4"`.
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim().to_lowercase();
        if trimmed.is_empty() {
            return Err("must not be empty".to_string());
        }

        let pattern = Regex::new(r"^([0-9]+)\s*([a-z]*)$").unwrap();
        let captures = pattern
            .captures(&trimmed)
            .ok_or_else(|| "expected a number with an optional unit (h, min, d)".to_string())?;

        let value: u32 = captures[1]
            .parse()
            .map_err(|_| "number is too large".to_string())?;
        if value == 0 {
            return Err("must be at least 1".to_string());
        }

        let unit = match &captures[2] {
            // Bare numbers are read as hours.
            "" | "h" | "hr" | "hrs" | "hora" | "horas" => SlaUnit::Hours,
            "m" | "min" | "mins" | "minuto" | "minutos" => SlaUnit::Minutes,
            "d" | "dia" | "dias" => SlaUnit::Days,
            other => return Err(format!("unrecognized unit '{other}'")),
        };

        Ok(Self { value, unit })
    }
}

impl std::str::FromStr for SlaTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for SlaTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

/// Turnaround commitments split by urgency tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sla {
    pub urgent: SlaTarget,
    pub inpatient: SlaTarget,
    pub elective: SlaTarget,
}

/// Address of the served unit, resolved from its postal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub postal_code: String,
    pub street: String,
    pub district: String,
    pub city_state: String,
}

/// Infrastructure and integration answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infrastructure {
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
    pub unit_address: Option<Address>,
}

/// Commercial terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commercial {
    pub payment_model: PaymentModel,
    /// Whether a minimum monthly volume applies. Only some intake flows ask
    /// this, so it stays optional and is rendered only when answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_volume: Option<bool>,
}

/// The single mutable aggregate built across the session.
///
/// Field groups are filled by their step's `advance`; revisiting a step
/// overwrites that group wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Selected modalities in user order, duplicate-free.
    pub modalities: Vec<Modality>,
    /// Volume profile per selected modality.
    pub volumetry: HashMap<Modality, VolumeProfile>,
    /// Trailing 6-month average monthly volume per modality.
    /// Populated only under per-exam billing.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub history_6m: HashMap<Modality, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<Infrastructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial: Option<Commercial>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla: Option<Sla>,
    /// Stamped the first time the wizard reaches the final step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modality_display_labels() {
        assert_eq!(Modality::XRay.to_string(), "Raios-X");
        assert_eq!(Modality::Ultrasound.to_string(), "Ultrassonografia");
        assert_eq!(
            Modality::ComputedTomography.to_string(),
            "Tomografia Computadorizada"
        );
    }

    #[test]
    fn modality_key_matches_serde() {
        for modality in Modality::ALL {
            let json = serde_json::to_string(&modality).unwrap();
            assert_eq!(format!("\"{}\"", modality.key()), json);
        }
    }

    #[test]
    fn only_ultrasound_uses_ultrasound_profile() {
        for modality in Modality::ALL {
            assert_eq!(
                modality.uses_ultrasound_profile(),
                modality == Modality::Ultrasound
            );
        }
    }

    #[test]
    fn payment_model_history_requirement() {
        assert!(PaymentModel::PerExam.requires_history());
        assert!(!PaymentModel::FixedPlusVariable.requires_history());
    }

    #[test]
    fn sla_parse_accepts_common_forms() {
        assert_eq!(
            SlaTarget::parse("1h").unwrap(),
            SlaTarget { value: 1, unit: SlaUnit::Hours }
        );
        assert_eq!(
            SlaTarget::parse("24 h").unwrap(),
            SlaTarget { value: 24, unit: SlaUnit::Hours }
        );
        assert_eq!(
            SlaTarget::parse("90min").unwrap(),
            SlaTarget { value: 90, unit: SlaUnit::Minutes }
        );
        assert_eq!(
            SlaTarget::parse("2d").unwrap(),
            SlaTarget { value: 2, unit: SlaUnit::Days }
        );
        // Bare number reads as hours.
        assert_eq!(
            SlaTarget::parse("2").unwrap(),
            SlaTarget { value: 2, unit: SlaUnit::Hours }
        );
        assert_eq!(
            SlaTarget::parse("  48 horas ").unwrap(),
            SlaTarget { value: 48, unit: SlaUnit::Hours }
        );
    }

    #[test]
    fn sla_parse_rejects_junk() {
        assert!(SlaTarget::parse("").is_err());
        assert!(SlaTarget::parse("   ").is_err());
        assert!(SlaTarget::parse("0h").is_err());
        assert!(SlaTarget::parse("soon").is_err());
        assert!(SlaTarget::parse("1 fortnight").is_err());
        assert!(SlaTarget::parse("-2h").is_err());
    }

    #[test]
    fn sla_display_round_trips() {
        for input in ["1h", "90min", "2d"] {
            let parsed = SlaTarget::parse(input).unwrap();
            assert_eq!(parsed.to_string(), input);
            assert_eq!(SlaTarget::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn record_serde_round_trip() {
        let mut record = AnswerRecord::default();
        record.modalities = vec![Modality::XRay, Modality::Ultrasound];
        record.volumetry.insert(
            Modality::XRay,
            VolumeProfile::Standard {
                monthly_volume: 100,
                urgent_pct: 30,
                inpatient_pct: 20,
                elective_pct: 50,
            },
        );
        record.volumetry.insert(
            Modality::Ultrasound,
            VolumeProfile::Ultrasound {
                monthly_volume: 250,
                doppler_pct: 40,
                fetal_pct: 10,
                simple_pct: 50,
                operating_hours: "08h-18h".to_string(),
            },
        );
        record.unit_count = Some(3);
        record.sla = Some(Sla {
            urgent: SlaTarget { value: 1, unit: SlaUnit::Hours },
            inpatient: SlaTarget { value: 12, unit: SlaUnit::Hours },
            elective: SlaTarget { value: 48, unit: SlaUnit::Hours },
        });

        let json = serde_json::to_string(&record).unwrap();
        let parsed: AnswerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn default_record_is_empty() {
        let record = AnswerRecord::default();
        assert!(record.modalities.is_empty());
        assert!(record.volumetry.is_empty());
        assert!(record.history_6m.is_empty());
        assert!(record.unit_count.is_none());
        assert!(record.infrastructure.is_none());
        assert!(record.commercial.is_none());
        assert!(record.sla.is_none());
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn optional_groups_are_omitted_from_json() {
        let json = serde_json::to_value(AnswerRecord::default()).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("unit_count"));
        assert!(!object.contains_key("history_6m"));
        assert!(!object.contains_key("completed_at"));
    }
}
