//! Pricing-request formatter.
//!
//! Pure function from a completed [`AnswerRecord`] to the free-text document
//! the commercial team pastes into the downstream quoting workflow. Section
//! content and order are fixed; stored values are echoed verbatim (the
//! remainder percentages in particular are never recomputed here).

use crate::wizard::record::{AnswerRecord, VolumeProfile};

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Render the pricing-request text for a record that has passed every step.
///
/// Optional data (mammography registry, unit address, minimum volume,
/// 6-month history) is simply omitted when absent. Required groups are
/// guaranteed by the engine before `Final` is reachable; their absence is an
/// invariant violation and panics rather than silently substituting values.
pub fn format_request(record: &AnswerRecord) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("Pricing Request – Teleradiology".to_string());
    lines.push(String::new());
    lines.push(
        "Please prepare a pricing proposal for teleradiology services, per the scope below:"
            .to_string(),
    );
    lines.push(String::new());

    // Modalities
    lines.push("Modalities in scope:".to_string());
    let modality_list: Vec<String> =
        record.modalities.iter().map(ToString::to_string).collect();
    lines.push(modality_list.join(", "));
    lines.push(String::new());

    // Volumetry, in selection order
    lines.push("Estimated volumetry:".to_string());
    for modality in &record.modalities {
        let profile = record
            .volumetry
            .get(modality)
            .expect("volumetry committed for every selected modality");
        lines.push(volumetry_line(&modality.to_string(), profile));
    }
    lines.push(String::new());

    // 6-month history, only under per-exam billing
    let commercial =
        record.commercial.as_ref().expect("commercial step committed before formatting");
    if commercial.payment_model.requires_history() {
        lines.push("6-month volume history:".to_string());
        for modality in &record.modalities {
            let average = record
                .history_6m
                .get(modality)
                .expect("history committed for every selected modality");
            lines.push(format!("- {modality}: {average} exams/month on average"));
        }
        lines.push(String::new());
    }

    // Coverage
    let unit_count = record.unit_count.expect("unit count committed before formatting");
    lines.push("Contract coverage:".to_string());
    lines.push(format!("Service provided at {unit_count} unit(s)."));
    lines.push(String::new());

    // Infrastructure
    let infrastructure =
        record.infrastructure.as_ref().expect("infrastructure step committed before formatting");
    lines.push("Infrastructure:".to_string());
    lines.push(format!("- Image submission link: {}", infrastructure.image_submission_link));
    lines.push(format!("- Image storage: {}", infrastructure.image_storage));
    lines.push(format!("- Systems integration: {}", yes_no(infrastructure.systems_integration)));
    lines.push(format!("- Client PACS: {}", infrastructure.pacs_system));
    lines.push(format!("- Client HIS: {}", infrastructure.his_system));
    lines.push(format!("- PACS server / router: {}", infrastructure.pacs_server));
    lines.push(format!("- Patient portal: {}", yes_no(infrastructure.patient_portal)));
    if let Some(registry) = infrastructure.mammography_registry {
        lines.push(format!("- Mammography registry: {registry}"));
    }
    if let Some(address) = &infrastructure.unit_address {
        lines.push(format!(
            "- Unit address: {} – {} – {} (CEP {})",
            address.street, address.district, address.city_state, address.postal_code
        ));
    }
    lines.push(String::new());

    // Commercial model
    lines.push("Commercial model:".to_string());
    lines.push(format!("- Payment model: {}", commercial.payment_model));
    if let Some(minimum) = commercial.minimum_volume {
        lines.push(format!("- Minimum monthly volume: {}", yes_no(minimum)));
    }
    lines.push(String::new());

    // SLA
    let sla = record.sla.as_ref().expect("SLA step committed before formatting");
    lines.push("Report SLA (in hours):".to_string());
    lines.push(format!("- Urgent: {}", sla.urgent));
    lines.push(format!("- Inpatient: {}", sla.inpatient));
    lines.push(format!("- Elective: {}", sla.elective));
    lines.push(String::new());

    lines.push("Please consider the premises above when preparing the pricing.".to_string());

    lines.join("\n")
}

fn volumetry_line(label: &str, profile: &VolumeProfile) -> String {
    match profile {
        VolumeProfile::Standard { monthly_volume, urgent_pct, inpatient_pct, elective_pct } => {
            format!(
                "- {label}: {monthly_volume} exams/month \
                 ({urgent_pct}% urgent, {inpatient_pct}% inpatient, {elective_pct}% elective)"
            )
        }
        VolumeProfile::Ultrasound {
            monthly_volume,
            doppler_pct,
            fetal_pct,
            simple_pct,
            operating_hours,
        } => {
            format!(
                "- {label}: {monthly_volume} exams/month \
                 ({doppler_pct}% doppler, {fetal_pct}% fetal, {simple_pct}% simple), \
                 operating hours: {operating_hours}"
            )
        }
    }
}
