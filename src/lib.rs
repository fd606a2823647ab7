//! spdx-spreadsheet - Versioned two-way mapping between SPDX documents and spreadsheet workbooks
//!
//! This crate stores an SPDX document as a spreadsheet workbook (XLSX or ODS) and
//! reads such workbooks back into a model store. Every entity kind lives on its
//! own sheet (document info, packages, files, snippets, relationships,
//! annotations, external references, extracted licenses), and workbooks written
//! by older spreadsheet versions (2.0 through 2.2, including the legacy
//! reviewers sheet) are migrated on read.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use spdx_spreadsheet::model::ModelStore;
//! use spdx_spreadsheet::{SerializableStore, SpreadsheetStoreBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a store with default settings (XLSX, SPDX date format)
//!     let mut store = SpreadsheetStoreBuilder::new().build()?;
//!
//!     // Load an SPDX spreadsheet into the in-memory model store
//!     let namespace = store.deserialize(File::open("sbom.xlsx")?, false)?;
//!     for pkg in store.store().packages(&namespace) {
//!         println!("{} {}", pkg.id, pkg.name);
//!     }
//!
//!     // Write it back out
//!     store.serialize(File::create("sbom-copy.xlsx")?)?;
//!     Ok(())
//! }
//! ```
//!
//! # Building a document in memory
//!
//! ```rust,no_run
//! use spdx_spreadsheet::model::{ModelStore, Relationship, RelationshipType, SpdxDocument, SpdxPackage};
//! use spdx_spreadsheet::{SerializableStore, SpreadsheetFormat, SpreadsheetStoreBuilder};
//!
//! # fn main() -> Result<(), spdx_spreadsheet::SpreadsheetError> {
//! let namespace = "http://example.com/spdx/my-doc";
//! let mut doc = SpdxDocument::new(namespace, "my-doc");
//! doc.creation_info.creators.push("Tool: my-tool".to_string());
//! doc.creation_info.created = "2024-01-01T00:00:00Z".to_string();
//! doc.relationships.push(Relationship::new(RelationshipType::DESCRIBES, "SPDXRef-pkg"));
//!
//! let mut pkg = SpdxPackage::new("SPDXRef-pkg", "my-package");
//! pkg.download_location = Some("NOASSERTION".to_string());
//!
//! let mut store = SpreadsheetStoreBuilder::new()
//!     .with_format(SpreadsheetFormat::Ods)
//!     .build()?;
//! store.store_mut().put(namespace, doc.into());
//! store.store_mut().put(namespace, pkg.into());
//!
//! let mut ods = Vec::new();
//! store.serialize(&mut ods)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Checking a workbook without loading it
//!
//! ```rust,no_run
//! use std::fs::File;
//! use spdx_spreadsheet::SpdxSpreadsheet;
//!
//! # fn main() -> Result<(), spdx_spreadsheet::SpreadsheetError> {
//! let mut spreadsheet = SpdxSpreadsheet::open(File::open("sbom.xlsx")?)?;
//! spreadsheet.verify()?;
//! println!("spreadsheet version {}", spreadsheet.version());
//! # Ok(())
//! # }
//! ```

mod api;
mod builder;
mod codec;
mod error;
mod grid;
pub mod license;
pub mod model;
mod output;
mod parser;
mod security;
mod sheets;
mod spreadsheet;
mod store;
mod types;

// 公開API
pub use api::{DateFormat, SpreadsheetFormat, SPDX_DATE_FORMAT};
pub use builder::SpreadsheetStoreBuilder;
pub use codec::{
    csv_to_strings, parse_range, range_to_string, strings_to_csv, MAX_CHARACTERS_PER_CELL,
    MAX_EXTRACTED_TEXT_SIZE,
};
pub use error::{ErrorKind, Result, SpreadsheetError};
pub use license::{parse_license_list, AnyLicenseInfo};
pub use security::SecurityConfig;
pub use spreadsheet::{
    is_supported_version, SpdxSpreadsheet, ANNOTATIONS_SHEET_NAME, CURRENT_VERSION,
    DOCUMENT_INFO_SHEET_NAME, EXTERNAL_REFS_SHEET_NAME, EXTRACTED_LICENSE_SHEET_NAME,
    PACKAGE_INFO_SHEET_NAME, PER_FILE_SHEET_NAME, RELATIONSHIPS_SHEET_NAME,
    REVIEWERS_SHEET_NAME, SNIPPET_SHEET_NAME, SUPPORTED_VERSIONS, UNKNOWN_VERSION,
    VERSION_2_0_0, VERSION_2_1_0, VERSION_2_2_0,
};
pub use store::{SerializableStore, SpreadsheetStore};
