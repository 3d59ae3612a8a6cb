pub mod difficulty;
pub mod loaders;
pub mod question;

pub use difficulty::Difficulty;
pub use loaders::{load_bank, save_bank, BankSnapshot};
pub use question::{ChoiceOption, ChoiceQuestion, CorrectOrder, Label, OrderingQuestion, QuestionSet};
