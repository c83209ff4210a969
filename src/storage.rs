/// Writing the documents of one section.
pub mod arranger;
pub mod driver;
pub mod layout;
/// Markdown file reading and writing.
pub mod markdown;
pub mod report;
pub mod special_files;
pub mod static_assets;
pub mod verify;

pub use arranger::Arranger;
pub use driver::{Options, Restructurer};
pub use layout::{Layout, version_label};
pub use markdown::LoadError;
pub use report::{Issue, RunReport, SectionReport, VersionReport};
pub use special_files::SpecialFileError;
pub use static_assets::{Relocation, StaticAssetError};
pub use verify::{Verification, VersionCheck, verify};
