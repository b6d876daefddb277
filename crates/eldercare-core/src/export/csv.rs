//! CSV rendering for elder and donation exports.

use crate::models::{Donation, Elder, Lifecycle};

const ELDER_HEADER: &str =
    "id,full_name,dob,gender,status,guardian_id,caretaker_id,payment_id,created_at";

const DONATION_HEADER: &str =
    "id,donor_name,donor_email,type,amount,item_name,quantity,status,received_at,created_at";

/// Render elders as CSV, one row per elder.
pub fn elders_to_csv(elders: &[Elder]) -> String {
    let mut csv = String::new();
    csv.push_str(ELDER_HEADER);
    csv.push('\n');

    for elder in elders {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            escape_csv(&elder.id),
            escape_csv(&elder.full_name),
            escape_csv(&elder.dob),
            escape_csv(elder.gender.as_deref().unwrap_or("")),
            elder.status.as_str(),
            escape_csv(&elder.guardian_id),
            escape_csv(elder.caretaker_id.as_deref().unwrap_or("")),
            escape_csv(elder.payment_id.as_deref().unwrap_or("")),
            escape_csv(&elder.created_at),
        ));
    }

    csv
}

/// Render donations as CSV, one row per donation.
pub fn donations_to_csv(donations: &[Donation]) -> String {
    let mut csv = String::new();
    csv.push_str(DONATION_HEADER);
    csv.push('\n');

    for donation in donations {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            escape_csv(&donation.id),
            escape_csv(&donation.donor_name),
            escape_csv(&donation.donor_email),
            donation.donation_type.as_str(),
            donation.amount.map(|a| format!("{a:.2}")).unwrap_or_default(),
            escape_csv(donation.item_name.as_deref().unwrap_or("")),
            donation.quantity.map(|q| q.to_string()).unwrap_or_default(),
            donation.status.as_str(),
            escape_csv(donation.received_at.as_deref().unwrap_or("")),
            escape_csv(&donation.created_at),
        ));
    }

    csv
}

/// Quote a field when it holds a comma, quote or line break.
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
