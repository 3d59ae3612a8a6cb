pub mod toml_loader;

pub use toml_loader::{bank_file_path, load_bank, save_bank, BankSnapshot};
