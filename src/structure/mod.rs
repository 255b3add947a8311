//! Structure recovery: turning extracted lines into first-pass Markdown.
//!
//! PDF text is classified from font metadata ([`FontClassifier`]), RTF plain
//! text from line-shape heuristics ([`TextStructurer`]). Both share the list
//! detection in [`lists`] and the title helpers in [`title`].

pub mod lists;
mod pdf;
mod rtf;
mod rules;
pub mod title;

pub use lists::{ListDetector, ListItem, ListMarker};
pub use pdf::FontClassifier;
pub use rtf::{is_all_uppercase, title_case, StructurerConfig, TextStructurer};
pub use rules::{ClassifierConfig, LineClass, RuleSet, StyleRule};
pub use title::title_from_path;
