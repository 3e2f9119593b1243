//! Streaming RF2 row parser.
//!
//! RF2 files are UTF-8 tab-separated values with a header row and no
//! quoting. The reader validates the header against the category's fixed
//! column schema on open and then yields one typed [`Component`] per row.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord};
use sct_types::refset::{
    AssociationRefset, AttributeValueRefset, ComplexMapRefset, LanguageRefset, RefsetBody,
    RefsetDescriptorRefset, RefsetItem, SimpleMapRefset, SimpleRefset,
};
use sct_types::{
    Acceptability, CaseSignificance, CharacteristicType, Component, Concept, DefinitionStatus,
    Description, DescriptionType, ModifierType, Relationship,
};

use crate::files::FileKind;
use crate::types::{Rf2Error, Rf2Result};

/// A streaming reader over one RF2 file.
///
/// Reads record-by-record so that multi-gigabyte description files are never
/// held in memory.
pub struct Rf2FileReader {
    reader: Reader<BufReader<File>>,
    kind: FileKind,
    path: String,
    record: StringRecord,
    rows_read: u64,
}

impl Rf2FileReader {
    /// Opens `path` as a file of the given category and validates its
    /// header row.
    pub fn open<P: AsRef<Path>>(path: P, kind: FileKind) -> Rf2Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(false)
            .quoting(false)
            .from_reader(BufReader::new(file));

        Self::validate_header(&mut reader, kind, path)?;

        Ok(Self {
            reader,
            kind,
            path: path.display().to_string(),
            record: StringRecord::new(),
            rows_read: 0,
        })
    }

    fn validate_header(
        reader: &mut Reader<BufReader<File>>,
        kind: FileKind,
        path: &Path,
    ) -> Rf2Result<()> {
        let headers = reader.headers()?;
        let found: Vec<String> = headers
            .iter()
            .enumerate()
            // A UTF-8 BOM may precede the first column name.
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();
        let expected = kind.columns();

        if found != expected {
            return Err(Rf2Error::UnexpectedHeader {
                file: path.display().to_string(),
                expected: expected.iter().map(|c| c.to_string()).collect(),
                found,
            });
        }
        Ok(())
    }

    /// The file category being read.
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Number of data rows read so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Byte offset of the reader within the file, for progress reporting.
    pub fn byte_position(&self) -> u64 {
        self.reader.position().byte()
    }

    /// Reads the next row, or `None` at end of file.
    pub fn next_component(&mut self) -> Option<Rf2Result<Component>> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.rows_read += 1;
                Some(parse_row(self.kind, &self.record))
            }
            Ok(false) => None,
            Err(e) => {
                if let csv::ErrorKind::UnequalLengths {
                    expected_len, len, ..
                } = e.kind()
                {
                    return Some(Err(Rf2Error::ColumnCount {
                        file: self.path.clone(),
                        row: self.rows_read + 1,
                        expected: *expected_len as usize,
                        found: *len as usize,
                    }));
                }
                Some(Err(e.into()))
            }
        }
    }
}

impl Iterator for Rf2FileReader {
    type Item = Rf2Result<Component>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_component()
    }
}

/// Parses one validated RF2 row into a typed component.
pub(crate) fn parse_row(kind: FileKind, record: &StringRecord) -> Rf2Result<Component> {
    let field = |i: usize| record.get(i).unwrap_or_default();

    match kind {
        FileKind::Concepts => Ok(Component::Concept(Concept {
            id: parse::sctid(field(0))?,
            effective_time: parse::effective_time(field(1))?,
            active: parse::boolean(field(2))?,
            module_id: parse::sctid(field(3))?,
            definition_status_id: parse::coded(
                "definitionStatusId",
                field(4),
                DefinitionStatus::from_id,
            )?,
        })),
        FileKind::Descriptions => Ok(Component::Description(Description {
            id: parse::sctid(field(0))?,
            effective_time: parse::effective_time(field(1))?,
            active: parse::boolean(field(2))?,
            module_id: parse::sctid(field(3))?,
            concept_id: parse::sctid(field(4))?,
            language_code: field(5).to_string(),
            type_id: parse::coded("typeId", field(6), DescriptionType::from_id)?,
            term: field(7).to_string(),
            case_significance_id: parse::coded(
                "caseSignificanceId",
                field(8),
                CaseSignificance::from_id,
            )?,
        })),
        FileKind::Relationships => Ok(Component::Relationship(Relationship {
            id: parse::sctid(field(0))?,
            effective_time: parse::effective_time(field(1))?,
            active: parse::boolean(field(2))?,
            module_id: parse::sctid(field(3))?,
            source_id: parse::sctid(field(4))?,
            destination_id: parse::sctid(field(5))?,
            relationship_group: parse::sctid(field(6))?,
            type_id: parse::sctid(field(7))?,
            characteristic_type_id: parse::coded(
                "characteristicTypeId",
                field(8),
                CharacteristicType::from_id,
            )?,
            modifier_id: parse::coded("modifierId", field(9), ModifierType::from_id)?,
        })),
        FileKind::RefsetDescriptorRefset => refset_item(
            record,
            RefsetBody::RefsetDescriptor(RefsetDescriptorRefset {
                attribute_description_id: parse::sctid(field(6))?,
                attribute_type_id: parse::sctid(field(7))?,
                attribute_order: parse::sctid(field(8))? as u32,
            }),
        ),
        FileKind::LanguageRefset => refset_item(
            record,
            RefsetBody::Language(LanguageRefset {
                acceptability_id: parse::coded(
                    "acceptabilityId",
                    field(6),
                    Acceptability::from_id,
                )?,
            }),
        ),
        FileKind::SimpleRefset => refset_item(record, RefsetBody::Simple(SimpleRefset {})),
        FileKind::SimpleMapRefset => refset_item(
            record,
            RefsetBody::SimpleMap(SimpleMapRefset {
                map_target: field(6).to_string(),
            }),
        ),
        FileKind::ExtendedMapRefset => refset_item(
            record,
            RefsetBody::ComplexMap(ComplexMapRefset {
                map_group: parse::sctid(field(6))?,
                map_priority: parse::sctid(field(7))?,
                map_rule: field(8).to_string(),
                map_advice: field(9).to_string(),
                map_target: field(10).trim().to_string(),
                correlation: parse::sctid(field(11))?,
                map_category: parse::sctid(field(12))?,
                map_block: 0,
            }),
        ),
        FileKind::ComplexMapRefset => refset_item(
            record,
            RefsetBody::ComplexMap(ComplexMapRefset {
                map_group: parse::sctid(field(6))?,
                map_priority: parse::sctid(field(7))?,
                map_rule: field(8).to_string(),
                map_advice: field(9).to_string(),
                map_target: field(10).trim().to_string(),
                correlation: parse::sctid(field(11))?,
                map_category: 0,
                map_block: parse::sctid(field(12))?,
            }),
        ),
        FileKind::AttributeValueRefset => refset_item(
            record,
            RefsetBody::AttributeValue(AttributeValueRefset {
                value_id: parse::sctid(field(6))?,
            }),
        ),
        FileKind::AssociationRefset => refset_item(
            record,
            RefsetBody::Association(AssociationRefset {
                target_component_id: parse::sctid(field(6))?,
            }),
        ),
    }
}

/// Builds a refset item from the six columns common to every refset file
/// plus the subtype body. Column 0 is a GUID string, not an SCTID.
fn refset_item(record: &StringRecord, body: RefsetBody) -> Rf2Result<Component> {
    let field = |i: usize| record.get(i).unwrap_or_default();
    Ok(Component::RefsetItem(RefsetItem {
        id: field(0).to_string(),
        effective_time: parse::effective_time(field(1))?,
        active: parse::boolean(field(2))?,
        module_id: parse::sctid(field(3))?,
        refset_id: parse::sctid(field(4))?,
        referenced_component_id: parse::sctid(field(5))?,
        body: Some(body),
    }))
}

/// Field-level parse helpers for RF2 values.
pub(crate) mod parse {
    use sct_types::SctId;

    use crate::types::{Rf2Error, Rf2Result};

    /// Parses a decimal SCTID (also used for other integer columns).
    pub fn sctid(value: &str) -> Rf2Result<SctId> {
        value
            .parse::<SctId>()
            .map_err(|_| Rf2Error::InvalidIdentifier {
                value: value.to_string(),
            })
    }

    /// Parses a boolean from "0" or "1".
    pub fn boolean(value: &str) -> Rf2Result<bool> {
        match value {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(Rf2Error::InvalidBoolean {
                value: value.to_string(),
            }),
        }
    }

    /// Parses an effective time (YYYYMMDD) as u32.
    pub fn effective_time(value: &str) -> Rf2Result<u32> {
        if value.len() != 8 {
            return Err(Rf2Error::InvalidDate {
                value: value.to_string(),
            });
        }
        value.parse::<u32>().map_err(|_| Rf2Error::InvalidDate {
            value: value.to_string(),
        })
    }

    /// Parses a coded-value column and checks the identifier against its
    /// value set via `decode`.
    pub fn coded<T>(
        field: &'static str,
        value: &str,
        decode: impl FnOnce(SctId) -> Option<T>,
    ) -> Rf2Result<SctId> {
        let id = sctid(value)?;
        decode(id)
            .map(|_| id)
            .ok_or(Rf2Error::UnknownCodedValue { field, value: id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse::sctid("404684003").unwrap(), 404684003);
        assert!(parse::sctid("not_a_number").is_err());
        assert!(parse::sctid("").is_err());

        assert!(!parse::boolean("0").unwrap());
        assert!(parse::boolean("1").unwrap());
        assert!(parse::boolean("true").is_err());

        assert_eq!(parse::effective_time("20020131").unwrap(), 20020131);
        assert!(parse::effective_time("2002-01-31").is_err());
    }

    #[test]
    fn test_read_concept_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sct2_Concept_Snapshot_INT_20190731.txt",
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n\
             138875005\t20020131\t1\t900000000000207008\t900000000000074008\n\
             56265001\t20020131\t1\t900000000000207008\t900000000000074008\n",
        );

        let reader = Rf2FileReader::open(&path, FileKind::Concepts).unwrap();
        let components: Vec<Component> = reader.map(|c| c.unwrap()).collect();
        assert_eq!(components.len(), 2);
        match &components[0] {
            Component::Concept(concept) => {
                assert_eq!(concept.id, 138875005);
                assert!(concept.active);
            }
            other => panic!("expected concept, got {other:?}"),
        }
    }

    #[test]
    fn test_header_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sct2_Concept_Snapshot_INT_20190731.txt",
            "id\teffectiveTime\tactive\tmoduleId\n1\t20020131\t1\t2\n",
        );

        assert!(matches!(
            Rf2FileReader::open(&path, FileKind::Concepts),
            Err(Rf2Error::UnexpectedHeader { .. })
        ));
    }

    #[test]
    fn test_bom_in_header_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sct2_Concept_Snapshot_INT_20190731.txt",
            "\u{feff}id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n",
        );
        assert!(Rf2FileReader::open(&path, FileKind::Concepts).is_ok());
    }

    #[test]
    fn test_malformed_row_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sct2_Concept_Snapshot_INT_20190731.txt",
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n\
             not_a_number\t20020131\t1\t900000000000207008\t900000000000074008\n",
        );

        let mut reader = Rf2FileReader::open(&path, FileKind::Concepts).unwrap();
        assert!(reader.next_component().unwrap().is_err());
    }

    #[test]
    fn test_unknown_coded_value_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // definitionStatusId holds the IS-A concept, which is outside the
        // definition status value set.
        let path = write_file(
            &dir,
            "sct2_Concept_Snapshot_INT_20190731.txt",
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n\
             138875005\t20020131\t1\t900000000000207008\t116680003\n",
        );

        let mut reader = Rf2FileReader::open(&path, FileKind::Concepts).unwrap();
        assert!(matches!(
            reader.next_component().unwrap(),
            Err(Rf2Error::UnknownCodedValue {
                field: "definitionStatusId",
                value: 116680003,
            })
        ));
    }

    #[test]
    fn test_unknown_acceptability_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "der2_cRefset_LanguageSnapshot-en_INT_20190731.txt",
            "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tacceptabilityId\n\
             aaaa-1\t20020131\t1\t900000000000207008\t900000000000508004\t2638271011\t12345\n",
        );

        let mut reader = Rf2FileReader::open(&path, FileKind::LanguageRefset).unwrap();
        assert!(matches!(
            reader.next_component().unwrap(),
            Err(Rf2Error::UnknownCodedValue {
                field: "acceptabilityId",
                ..
            })
        ));
    }

    #[test]
    fn test_column_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sct2_Concept_Snapshot_INT_20190731.txt",
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n\
             138875005\t20020131\t1\t900000000000207008\n",
        );

        let mut reader = Rf2FileReader::open(&path, FileKind::Concepts).unwrap();
        assert!(matches!(
            reader.next_component().unwrap(),
            Err(Rf2Error::ColumnCount {
                expected: 5,
                found: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_language_refset_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "der2_cRefset_LanguageSnapshot-en_INT_20190731.txt",
            "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tacceptabilityId\n\
             80000517-8513-5ca0-a44c-dc66f3c3a1c6\t20020131\t1\t900000000000207008\t900000000000508004\t2638271011\t900000000000548007\n",
        );

        let mut reader = Rf2FileReader::open(&path, FileKind::LanguageRefset).unwrap();
        match reader.next_component().unwrap().unwrap() {
            Component::RefsetItem(item) => {
                assert_eq!(item.refset_id, 900000000000508004);
                assert_eq!(item.referenced_component_id, 2638271011);
                assert!(item.language().unwrap().is_preferred());
            }
            other => panic!("expected refset item, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_map_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "der2_sRefset_SimpleMapSnapshot_INT_20190731.txt",
            "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tmapTarget\n\
             aaaa-1\t20020131\t1\t900000000000207008\t447562003\t56265001\tI51.9\n",
        );

        let mut reader = Rf2FileReader::open(&path, FileKind::SimpleMapRefset).unwrap();
        match reader.next_component().unwrap().unwrap() {
            Component::RefsetItem(item) => {
                assert_eq!(item.simple_map().unwrap().map_target, "I51.9");
            }
            other => panic!("expected refset item, got {other:?}"),
        }
    }
}
