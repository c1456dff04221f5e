//! # lib_pubchem
//!
//! Maps NSC identifiers onto PubChem substance and compound records.
//! Modules are gated per folder, like the rest of the workspace's libraries:
//!
//! - `retrieve`: the single-shot JSON `ApiClient`.
//! - `pubchem`: record model, retry policy, fetcher and batch driver.
//! - `tabular`: CSV input column reader and result sheet writer.

#[cfg(feature = "retrieve")]
pub mod retrieve;

#[cfg(feature = "pubchem")]
pub mod pubchem;

#[cfg(feature = "tabular")]
pub mod tabular;

#[cfg(feature = "pubchem")]
pub use pubchem::*;
