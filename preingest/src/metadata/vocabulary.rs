//! Controlled-vocabulary membership of declared usage restrictions.

use super::record::names;
use crate::core::Confirmation;
use crate::gateways::Beperking;
use crate::xml::XmlElement;

/// Verdict for one declared restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionCheck {
    /// True if the restriction is a known term.
    pub success: bool,
    /// Explanation, in evaluation order.
    pub messages: Vec<String>,
}

impl RestrictionCheck {
    fn new(success: bool, message: String) -> Self {
        Self {
            success,
            messages: vec![message],
        }
    }
}

/// The `(begripCode, begripLabel)` pairs declared under
/// `beperkingGebruik/beperkingGebruikType`; missing values are empty.
#[must_use]
pub fn declared_restrictions(object: &XmlElement) -> Vec<Beperking> {
    object
        .children_named(names::BEPERKING_GEBRUIK)
        .map(|restriction| {
            let value = |name: &str| {
                restriction
                    .text_at(&[names::BEPERKING_GEBRUIK_TYPE, name])
                    .unwrap_or_default()
                    .to_string()
            };
            Beperking::new(value(names::BEGRIP_CODE), value(names::BEGRIP_LABEL))
        })
        .collect()
}

/// Checks one declared restriction against a term list.
#[must_use]
pub fn check_against(declared: &Beperking, terms: &[Beperking]) -> RestrictionCheck {
    if declared.label.is_empty() {
        return RestrictionCheck::new(
            false,
            "Element 'begripLabel' is niet voorzien van een waarde.".to_string(),
        );
    }

    if declared.code.is_empty() {
        // A label alone is never enough, found or not.
        let found = terms.iter().any(|term| term.label == declared.label);
        let lookup = if found {
            format!(
                "Element begripLabel met waarde '{}' gevonden in de begrippenlijst",
                declared.label
            )
        } else {
            format!(
                "Element begripLabel met waarde '{}' niet gevonden in de begrippenlijst",
                declared.label
            )
        };
        return RestrictionCheck {
            success: false,
            messages: vec![
                lookup,
                "Element 'begripCode' is niet voorzien van een waarde.".to_string(),
            ],
        };
    }

    if terms.contains(declared) {
        RestrictionCheck::new(true, format!("Gevonden in de begrippenlijst: {declared}"))
    } else {
        RestrictionCheck::new(
            false,
            format!(
                "Element begripLabel: '{}' in combinatie met element begripCode '{}' niet gevonden in de begrippenlijst",
                declared.label, declared.code
            ),
        )
    }
}

/// Combined verdict over every declared restriction of a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VocabularyVerdict {
    /// `Unknown` when nothing was declared.
    pub confirmation: Confirmation,
    /// Messages of every check, in declaration order.
    pub messages: Vec<String>,
}

/// Checks every declared restriction; confirmed only when all pass.
#[must_use]
pub fn check_all(declared: &[Beperking], terms: &[Beperking]) -> VocabularyVerdict {
    if declared.is_empty() {
        return VocabularyVerdict::default();
    }
    let checks: Vec<_> = declared.iter().map(|d| check_against(d, terms)).collect();
    VocabularyVerdict {
        confirmation: Confirmation::from_success(checks.iter().all(|c| c.success)),
        messages: checks.into_iter().flat_map(|c| c.messages).collect(),
    }
}
