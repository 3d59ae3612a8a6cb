pub mod question_bank;
pub mod transfer;

pub use question_bank::{BankStats, ChoicePatch, OrderingPatch, QuestionBank, SortOrder};
pub use transfer::{
    export_bytes, export_to_dir, import_bytes, import_path, require_records, ExportedFile,
    FileKind, IncomingFile,
};
