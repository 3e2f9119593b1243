//! RF2 file categories and release-tree discovery.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::types::{Rf2Error, Rf2Result};

/// The eleven importable RF2 file categories, in declared import order.
///
/// The discriminant order matters: the importer walks the categories in
/// *reverse* so that the most sequentially-identified files (concepts) are
/// loaded last, keeping writes append-friendly as the store grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `sct2_Concept_Snapshot_*` concept files.
    Concepts,
    /// `sct2_Description_Snapshot-en*` description files.
    Descriptions,
    /// `sct2_Relationship_Snapshot_*` (or stated) relationship files.
    Relationships,
    /// Refset descriptor refset files.
    RefsetDescriptorRefset,
    /// Language refset files.
    LanguageRefset,
    /// Simple refset files.
    SimpleRefset,
    /// Simple map refset files.
    SimpleMapRefset,
    /// Extended map refset files.
    ExtendedMapRefset,
    /// Complex map refset files.
    ComplexMapRefset,
    /// Attribute value refset files.
    AttributeValueRefset,
    /// Association refset files.
    AssociationRefset,
}

static FILENAME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"sct2_Concept_Snapshot_\S+_\S+\.txt",
        r"sct2_Description_Snapshot-en\S+_\S+\.txt",
        r"sct2_(Stated)*Relationship_Snapshot_\S+_\S+\.txt",
        r"der2_cciRefset_RefsetDescriptorSnapshot_\S+_\S+\.txt",
        r"der2_cRefset_LanguageSnapshot-\S+_\S+\.txt",
        r"der2_Refset_SimpleSnapshot_\S+_\S+\.txt",
        r"der2_sRefset_SimpleMapSnapshot_\S+_\S+\.txt",
        r"der2_iisssccRefset_ExtendedMapSnapshot_\S+_\S+\.txt",
        r"der2_iisssciRefset_ExtendedMapSnapshot_\S+_\S+\.txt",
        r"der2_cRefset_AttributeValueSnapshot_\S+_\S+\.txt",
        r"der2_cRefset_AssociationSnapshot_\S+_\S+\.txt",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("invalid filename pattern"))
    .collect()
});

impl FileKind {
    /// All categories in declared import order.
    pub const ALL: [FileKind; 11] = [
        FileKind::Concepts,
        FileKind::Descriptions,
        FileKind::Relationships,
        FileKind::RefsetDescriptorRefset,
        FileKind::LanguageRefset,
        FileKind::SimpleRefset,
        FileKind::SimpleMapRefset,
        FileKind::ExtendedMapRefset,
        FileKind::ComplexMapRefset,
        FileKind::AttributeValueRefset,
        FileKind::AssociationRefset,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|kind| *kind == self).unwrap()
    }

    /// The filename pattern matching this category.
    pub fn pattern(self) -> &'static Regex {
        &FILENAME_PATTERNS[self.index()]
    }

    /// The expected column names, in order.
    pub fn columns(self) -> &'static [&'static str] {
        const REFSET_HEADER: [&str; 6] = [
            "id",
            "effectiveTime",
            "active",
            "moduleId",
            "refsetId",
            "referencedComponentId",
        ];
        match self {
            FileKind::Concepts => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "definitionStatusId",
            ],
            FileKind::Descriptions => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "conceptId",
                "languageCode",
                "typeId",
                "term",
                "caseSignificanceId",
            ],
            FileKind::Relationships => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "sourceId",
                "destinationId",
                "relationshipGroup",
                "typeId",
                "characteristicTypeId",
                "modifierId",
            ],
            FileKind::RefsetDescriptorRefset => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "refsetId",
                "referencedComponentId",
                "attributeDescription",
                "attributeType",
                "attributeOrder",
            ],
            FileKind::LanguageRefset => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "refsetId",
                "referencedComponentId",
                "acceptabilityId",
            ],
            FileKind::SimpleRefset => &REFSET_HEADER,
            FileKind::SimpleMapRefset => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "refsetId",
                "referencedComponentId",
                "mapTarget",
            ],
            FileKind::ExtendedMapRefset => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "refsetId",
                "referencedComponentId",
                "mapGroup",
                "mapPriority",
                "mapRule",
                "mapAdvice",
                "mapTarget",
                "correlationId",
                "mapCategoryId",
            ],
            FileKind::ComplexMapRefset => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "refsetId",
                "referencedComponentId",
                "mapGroup",
                "mapPriority",
                "mapRule",
                "mapAdvice",
                "mapTarget",
                "correlationId",
                "mapBlock",
            ],
            FileKind::AttributeValueRefset => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "refsetId",
                "referencedComponentId",
                "valueId",
            ],
            FileKind::AssociationRefset => &[
                "id",
                "effectiveTime",
                "active",
                "moduleId",
                "refsetId",
                "referencedComponentId",
                "targetComponentId",
            ],
        }
    }

    /// Human-readable category name.
    pub fn name(self) -> &'static str {
        match self {
            FileKind::Concepts => "Concepts",
            FileKind::Descriptions => "Descriptions",
            FileKind::Relationships => "Relationships",
            FileKind::RefsetDescriptorRefset => "Refset Descriptor refset",
            FileKind::LanguageRefset => "Language refset",
            FileKind::SimpleRefset => "Simple refset",
            FileKind::SimpleMapRefset => "Simple map refset",
            FileKind::ExtendedMapRefset => "Extended map refset",
            FileKind::ComplexMapRefset => "Complex map refset",
            FileKind::AttributeValueRefset => "Attribute value refset",
            FileKind::AssociationRefset => "Association refset",
        }
    }

    /// Matches a base filename against every category; first match wins.
    pub fn match_filename(filename: &str) -> Option<FileKind> {
        FileKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.pattern().is_match(filename))
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An importable file found beneath a release root.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// The matched category.
    pub kind: FileKind,
    /// Full path to the file.
    pub path: PathBuf,
    /// File size in bytes, for progress reporting.
    pub size: u64,
}

/// Walks `root` and collects every file whose base name matches one of the
/// category patterns, together with the total byte size.
pub fn discover_files<P: AsRef<Path>>(root: P) -> Rf2Result<(Vec<DiscoveredFile>, u64)> {
    let root = root.as_ref();
    let mut discovered = Vec::new();
    let mut total_size = 0;

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy();
        if let Some(kind) = FileKind::match_filename(&filename) {
            let size = entry.metadata()?.len();
            total_size += size;
            discovered.push(DiscoveredFile {
                kind,
                path: entry.path().to_path_buf(),
                size,
            });
        }
    }

    if discovered.is_empty() {
        return Err(Rf2Error::NoImportableFiles {
            path: root.display().to_string(),
        });
    }
    Ok((discovered, total_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_filename() {
        assert_eq!(
            FileKind::match_filename("sct2_Concept_Snapshot_INT_20190731.txt"),
            Some(FileKind::Concepts)
        );
        assert_eq!(
            FileKind::match_filename("sct2_Description_Snapshot-en_INT_20190731.txt"),
            Some(FileKind::Descriptions)
        );
        assert_eq!(
            FileKind::match_filename("sct2_StatedRelationship_Snapshot_INT_20190731.txt"),
            Some(FileKind::Relationships)
        );
        assert_eq!(
            FileKind::match_filename("der2_cRefset_LanguageSnapshot-en_INT_20190731.txt"),
            Some(FileKind::LanguageRefset)
        );
        assert_eq!(
            FileKind::match_filename("der2_sRefset_SimpleMapSnapshot_INT_20190731.txt"),
            Some(FileKind::SimpleMapRefset)
        );
        assert_eq!(FileKind::match_filename("readme_en.txt"), None);
        // Full (non-snapshot) files are never imported.
        assert_eq!(
            FileKind::match_filename("sct2_Concept_Full_INT_20190731.txt"),
            None
        );
    }

    #[test]
    fn test_columns_match_category_arity() {
        assert_eq!(FileKind::Concepts.columns().len(), 5);
        assert_eq!(FileKind::Descriptions.columns().len(), 9);
        assert_eq!(FileKind::Relationships.columns().len(), 10);
        assert_eq!(FileKind::LanguageRefset.columns().len(), 7);
        assert_eq!(FileKind::ExtendedMapRefset.columns().len(), 13);
        assert_eq!(FileKind::ComplexMapRefset.columns().len(), 13);
    }

    #[test]
    fn test_discover_files() {
        let dir = tempfile::tempdir().unwrap();
        let terminology = dir.path().join("Snapshot").join("Terminology");
        std::fs::create_dir_all(&terminology).unwrap();
        std::fs::write(
            terminology.join("sct2_Concept_Snapshot_INT_20190731.txt"),
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n",
        )
        .unwrap();
        std::fs::write(terminology.join("notes.txt"), "ignored").unwrap();

        let (files, total) = discover_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].kind, FileKind::Concepts);
        assert_eq!(total, files[0].size);
    }

    #[test]
    fn test_discover_empty_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_files(dir.path()),
            Err(Rf2Error::NoImportableFiles { .. })
        ));
    }
}
