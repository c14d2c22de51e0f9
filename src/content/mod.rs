//! Content tooling for lesson authors.
//!
//! - **Editor**: slide and path edits with validation
//! - **Import**: TOML lesson packs
//! - **Validation**: checks on admin-entered slides and texts

pub mod editor;
pub mod import;
pub mod validate;

pub use editor::{add_slide, delete_slide, edit_path, save_slide, update_text, PathEdit};
pub use import::{import_file, import_pack, parse_pack, ImportReport, LessonPack};
pub use validate::{validate_content, validate_slide, validate_text_template};
