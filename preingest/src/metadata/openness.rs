//! Openness of file records inside a dossier (ToPX).
//!
//! A file record's folder carries a companion `<folderName>.metadata`
//! describing the folder. When that companion is a `Dossier`, the file
//! record must declare its openness.

use anyhow::Context;
use std::path::{Path, PathBuf};

use super::record::{names, MetadataRecord};
use crate::context::MetadataDialect;

/// Accepted values of `openbaarheid/omschrijvingBeperkingen`.
pub const OPENNESS_VALUES: [&str; 3] = ["Openbaar", "Niet openbaar", "Beperkt openbaar"];

/// Path of the companion folder record of a metadata file.
#[must_use]
pub fn companion_path(file: &Path) -> Option<(PathBuf, String)> {
    let folder = file.parent()?;
    let folder_name = folder.file_name()?.to_string_lossy().into_owned();
    Some((folder.join(format!("{folder_name}.metadata")), folder_name))
}

/// Runs the openness rule for a ToPX file record.
///
/// Returns the findings; errors are failures to read or parse the
/// companion record.
pub fn check_openness(file: &Path, record: &MetadataRecord) -> anyhow::Result<Vec<String>> {
    let Some((companion, folder_name)) = companion_path(file) else {
        return Ok(missing_companion(file, ""));
    };
    if !companion.is_file() {
        return Ok(missing_companion(file, &folder_name));
    }

    let parent = MetadataRecord::load(&companion, MetadataDialect::ToPX)
        .with_context(|| format!("Failed to read parent record for '{}'", file.display()))?;
    let is_dossier = parent
        .aggregation_level()
        .is_some_and(|level| level.eq_ignore_ascii_case("Dossier"));
    if !is_dossier {
        return Ok(Vec::new());
    }

    let openness = record
        .root()
        .descend(&[names::BESTAND, names::OPENBAARHEID]);
    let Some(openness) = openness else {
        return Ok(vec![
            "Bovenliggende metadata bestand heeft een aggregatieniveau 'Dossier'. Op bestandsniveau wordt dan 'openbaarheid' element verwacht. Element is niet gevonden".to_string(),
        ]);
    };
    let Some(description) = openness.child(names::OMSCHRIJVING_BEPERKINGEN) else {
        return Ok(vec![
            "Bovenliggende metadata bestand heeft een aggregatieniveau 'Dossier'. Op bestandsniveau wordt dan 'openbaarheid' element verwacht. Element 'openbaarheid' gevonden maar niet element 'omschrijvingBeperkingen'".to_string(),
        ]);
    };
    if OPENNESS_VALUES.contains(&description.text.as_str()) {
        return Ok(Vec::new());
    }
    Ok(vec![format!(
        "Onjuiste waarde voor element 'omschrijvingBeperkingen' gevonden. Gevonden waarde = '{}', verwachte waarde = 'Openbaar' of 'Niet openbaar' of 'Beperkt openbaar' in {}",
        description.text,
        file.display()
    )])
}

fn missing_companion(file: &Path, folder_name: &str) -> Vec<String> {
    vec![
        format!(
            "Kan het bovenliggende Dossier of Record metadata bestand met de naam '{folder_name}.metadata' niet vinden in de map '{folder_name}'"
        ),
        format!(
            "Controleren op openbaarheid is niet gelukt voor {}.",
            file.display()
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const DOSSIER: &str =
        "<ToPX><aggregatie><aggregatieniveau>dossier</aggregatieniveau></aggregatie></ToPX>";
    const RECORD: &str =
        "<ToPX><aggregatie><aggregatieniveau>Record</aggregatieniveau></aggregatie></ToPX>";

    fn file_record(openness: &str) -> MetadataRecord {
        MetadataRecord::parse(
            &format!("<ToPX><bestand><naam>a.pdf</naam>{openness}</bestand></ToPX>"),
            MetadataDialect::ToPX,
        )
        .unwrap()
    }

    fn folder_with(companion: Option<&str>) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Dossier 1");
        fs::create_dir_all(&folder).unwrap();
        if let Some(xml) = companion {
            fs::write(folder.join("Dossier 1.metadata"), xml).unwrap();
        }
        let file = folder.join("a.pdf.metadata");
        (dir, file)
    }

    #[test]
    fn test_missing_companion_gives_two_messages() {
        let (_dir, file) = folder_with(None);
        let messages = check_openness(&file, &file_record("")).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            "Kan het bovenliggende Dossier of Record metadata bestand met de naam 'Dossier 1.metadata' niet vinden in de map 'Dossier 1'"
        );
        assert!(messages[1].starts_with("Controleren op openbaarheid is niet gelukt voor"));
    }

    #[test]
    fn test_record_parent_skips_check() {
        let (_dir, file) = folder_with(Some(RECORD));
        assert!(check_openness(&file, &file_record("")).unwrap().is_empty());
    }

    #[test]
    fn test_dossier_requires_openness() {
        let (_dir, file) = folder_with(Some(DOSSIER));

        let absent = check_openness(&file, &file_record("")).unwrap();
        assert_eq!(absent.len(), 1);
        assert!(absent[0].ends_with("Element is niet gevonden"));

        let no_child = check_openness(&file, &file_record("<openbaarheid/>")).unwrap();
        assert!(no_child[0].contains("niet element 'omschrijvingBeperkingen'"));

        let wrong = check_openness(
            &file,
            &file_record("<openbaarheid><omschrijvingBeperkingen>openbaar</omschrijvingBeperkingen></openbaarheid>"),
        )
        .unwrap();
        assert!(wrong[0].contains("Gevonden waarde = 'openbaar'"));

        for value in OPENNESS_VALUES {
            let ok = check_openness(
                &file,
                &file_record(&format!(
                    "<openbaarheid><omschrijvingBeperkingen>{value}</omschrijvingBeperkingen></openbaarheid>"
                )),
            )
            .unwrap();
            assert!(ok.is_empty(), "{value} should be accepted");
        }
    }

    #[test]
    fn test_companion_without_level_is_not_a_dossier() {
        let (_dir, file) = folder_with(Some("<ToPX><aggregatie/></ToPX>"));
        assert!(check_openness(&file, &file_record("")).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_companion_is_an_error() {
        let (_dir, file) = folder_with(Some("<ToPX><aggregatie>"));
        let err = check_openness(&file, &file_record("")).unwrap_err();
        assert!(err.to_string().contains("Failed to read parent record"));
    }

    #[test]
    fn test_padded_openness_value_is_rejected() {
        let (_dir, file) = folder_with(Some(DOSSIER));

        let messages = check_openness(
            &file,
            &file_record("<openbaarheid><omschrijvingBeperkingen>  Openbaar\n</omschrijvingBeperkingen></openbaarheid>"),
        )
        .unwrap();

        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Gevonden waarde = '  Openbaar\n'"));
    }

    #[test]
    fn test_padded_aggregation_level_is_not_a_dossier() {
        let (_dir, file) = folder_with(Some(
            "<ToPX><aggregatie><aggregatieniveau> Dossier </aggregatieniveau></aggregatie></ToPX>",
        ));
        assert!(check_openness(&file, &file_record("")).unwrap().is_empty());
    }
}
