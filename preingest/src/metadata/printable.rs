//! Printable-character constraint on element text.

use crate::xml::XmlElement;

fn is_printable(c: char) -> bool {
    (' '..='~').contains(&c)
}

/// One finding per text-bearing leaf holding a character outside 0x20-0x7E.
#[must_use]
pub fn non_printable_findings(root: &XmlElement) -> Vec<String> {
    root.text_leaves()
        .into_iter()
        .filter(|leaf| !leaf.text.chars().all(is_printable))
        .map(|leaf| {
            format!(
                "Element '{}' bevat niet-afdrukbare tekens: '{}'",
                leaf.name, leaf.text
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_text_passes() {
        let root = XmlElement::parse("<a><b>Plain text ~ 123</b><c/></a>").unwrap();
        assert!(non_printable_findings(&root).is_empty());
    }

    #[test]
    fn test_findings_name_element_and_text() {
        let root = XmlElement::parse(
            "<a><naam>Café</naam><x><omschrijving>tab&#9;here</omschrijving></x></a>",
        )
        .unwrap();
        assert_eq!(
            non_printable_findings(&root),
            vec![
                "Element 'naam' bevat niet-afdrukbare tekens: 'Café'".to_string(),
                "Element 'omschrijving' bevat niet-afdrukbare tekens: 'tab\there'".to_string(),
            ]
        );
    }

    #[test]
    fn test_surrounding_control_and_nbsp_are_reported() {
        let root = XmlElement::parse(
            "<a><b>&#9;value</b><c>value\u{a0}</c><d>line&#10;</d></a>",
        )
        .unwrap();

        let findings = non_printable_findings(&root);

        assert_eq!(findings.len(), 3);
        assert_eq!(
            findings[0],
            "Element 'b' bevat niet-afdrukbare tekens: '\tvalue'"
        );
        assert!(findings[1].starts_with("Element 'c'"));
        assert!(findings[2].starts_with("Element 'd'"));
    }

    #[test]
    fn test_indentation_between_elements_is_not_reported() {
        let root = XmlElement::parse("<a>\n\t<b>value</b>\r\n</a>").unwrap();
        assert!(non_printable_findings(&root).is_empty());
    }
}
