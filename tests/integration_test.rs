use question_transfer::config::ImportLimits;
use question_transfer::models::loaders::{load_bank, save_bank};
use question_transfer::services::{XlsxCodec, XmlCodec};
use question_transfer::workflow::{export_to_dir, import_path, require_records, SortOrder};
use question_transfer::{
    export_bytes, import_bytes, ChoiceOption, ChoiceQuestion, CorrectOrder, Difficulty, FileKind,
    IncomingFile, Label, OrderingQuestion, QuestionBank, QuestionSet, TransferError,
};
use std::path::PathBuf;

const LITERAL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<questions>
  <fastest difficulty="1">
    <text>Arrange these numbers from smallest to largest</text>
    <a>30</a>
    <b>10</b>
    <c>40</c>
    <d>20</d>
    <correctOrder>
      <one>b</one>
      <two>d</two>
      <three>a</three>
      <four>c</four>
    </correctOrder>
  </fastest>
  <question>
    <category>Science</category>
    <text>What is H&lt;sub&gt;2&lt;/sub&gt;O commonly called?</text>
    <a correct="no">Salt</a>
    <b correct="yes">Water</b>
    <c correct="no">Sugar</c>
    <d correct="no">Oil</d>
  </question>
  <question>
    <category>Math</category>
    <text>What is 3 &amp; 4 added together?</text>
    <a correct="no">6</a>
    <b correct="no">8</b>
    <c correct="yes">7</c>
    <d correct="no">5</d>
  </question>
</questions>"#;

fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("question_transfer_{}_{}", tag, uuid::Uuid::new_v4()))
}

fn xml_file(name: &str, content: &str) -> IncomingFile {
    IncomingFile::new(name, None, content.as_bytes().to_vec())
}

#[test]
fn test_literal_xml_imports_and_reexports() {
    let set = import_bytes(&xml_file("bank.xml", LITERAL_XML), None, ImportLimits::default())
        .expect("导入 XML 失败");

    let ordering = set.ordering.as_ref().expect("应有抢答题");
    assert_eq!(ordering.correct_order.code(), "BDAC");
    assert_eq!(ordering.difficulty, Difficulty::Easy);
    assert_eq!(ordering.option(Label::D), "20");

    assert_eq!(set.choices.len(), 2);
    assert_eq!(set.choices[0].prompt, "What is H<sub>2</sub>O commonly called?");
    assert_eq!(set.choices[0].correct_label(), Some(Label::B));
    assert_eq!(set.choices[1].prompt, "What is 3 & 4 added together?");
    assert_eq!(set.choices[1].correct_label(), Some(Label::C));

    let exported = export_bytes(&set, FileKind::Xml).unwrap();
    let text = String::from_utf8(exported.bytes).unwrap();
    assert!(text.contains("3 &amp; 4"));
    assert!(text.contains("<one>b</one>"));

    let again = import_bytes(&xml_file(&exported.file_name, &text), Some(FileKind::Xml), ImportLimits::default())
        .unwrap();
    assert_eq!(again.choices.len(), 2);
    for (before, after) in set.choices.iter().zip(&again.choices) {
        assert_eq!(before.category, after.category);
        assert_eq!(before.prompt, after.prompt);
        assert_eq!(before.options, after.options);
        assert_ne!(before.id, after.id);
    }
    assert_eq!(
        again.ordering.map(|q| q.correct_order),
        set.ordering.map(|q| q.correct_order)
    );
}

#[test]
fn test_xml_to_xlsx_and_back() {
    let set = XmlCodec::new().parse(LITERAL_XML).unwrap();

    let exported = export_bytes(&set, FileKind::Xlsx).unwrap();
    assert_eq!(exported.file_name, "questions.xlsx");

    let upload = IncomingFile::new(
        "upload.bin",
        Some(exported.mime.clone()),
        exported.bytes,
    );
    let back = import_bytes(&upload, None, ImportLimits::default()).unwrap();

    assert_eq!(back.choices.len(), 2);
    assert_eq!(back.choices[1].category, "Math");
    assert_eq!(back.choices[1].correct_label(), Some(Label::C));
    let ordering = back.ordering.unwrap();
    assert_eq!(ordering.correct_order.code(), "BDAC");
    assert_eq!(ordering.prompt, "Arrange these numbers from smallest to largest");
}

#[test]
fn test_container_errors_through_facade() {
    let limits = ImportLimits::default();

    let huge = format!("<questions>{}</questions>", " ".repeat(limits.max_file_bytes));
    assert!(matches!(
        import_bytes(&xml_file("huge.xml", &huge), None, limits),
        Err(TransferError::TooLarge { .. })
    ));

    assert!(matches!(
        import_bytes(&xml_file("bank.pdf", LITERAL_XML), None, limits),
        Err(TransferError::UnsupportedFormat { .. })
    ));

    assert!(matches!(
        import_bytes(&xml_file("bank.xml", "<questions><question>"), None, limits),
        Err(TransferError::MalformedInput { .. })
    ));

    assert!(matches!(
        import_bytes(&xml_file("bank.xml", "<quiz/>"), None, limits),
        Err(TransferError::UnsupportedFormat { .. })
    ));

    assert!(matches!(
        XlsxCodec::new().parse(LITERAL_XML.as_bytes()),
        Err(TransferError::MalformedInput { .. })
    ));

    let empty = import_bytes(&xml_file("bank.xml", "<questions/>"), None, limits).unwrap();
    assert_eq!(require_records(empty), Err(TransferError::NoValidRecords));
}

#[test]
fn test_bank_selection_feeds_export() {
    let set = XmlCodec::new().parse(LITERAL_XML).unwrap();
    let mut bank = QuestionBank::new();
    bank.apply_import(set);

    let second_ordering = bank.add_ordering(
        "Another order",
        ["w", "x", "y", "z"].map(String::from),
        CorrectOrder::new([Label::D, Label::C, Label::B, Label::A]).unwrap(),
        Difficulty::Hard,
    );
    bank.select_ordering(second_ordering);
    assert_eq!(bank.ordering().iter().filter(|q| q.selected).count(), 1);

    let first_choice = bank.choices()[0].id;
    bank.toggle_choice_selection(first_choice);

    let selected = bank.selected_set();
    assert_eq!(selected.len(), 2);
    let exported = export_bytes(&selected, FileKind::Xml).unwrap();
    let text = String::from_utf8(exported.bytes).unwrap();
    assert!(text.contains("Another order"));
    assert!(text.contains("Science"));
    assert!(!text.contains("Math"));

    let descending: Vec<_> = bank
        .sorted_choices(SortOrder::Descending)
        .iter()
        .map(|q| q.category.as_str())
        .collect();
    assert_eq!(descending, ["Science", "Math"]);
}

#[tokio::test]
async fn test_files_and_account_round_trip() {
    let dir = temp_dir("it");
    let limits = ImportLimits::default();

    let set = QuestionSet::new(
        Some(OrderingQuestion::new(
            "Order",
            ["1", "2", "3", "4"].map(String::from),
            CorrectOrder::default(),
            Difficulty::Medium,
        )),
        vec![ChoiceQuestion::new(
            "General",
            "Pick",
            Label::ALL.map(|label| ChoiceOption::new(label.upper(), label == Label::A)),
            Difficulty::Unspecified,
        )],
    );

    let path = export_to_dir(&set, FileKind::Xlsx, &dir).await.unwrap();
    assert!(path.ends_with("questions.xlsx"));

    let imported = import_path(&path, None, limits).await.unwrap();
    assert_eq!(imported.len(), 2);
    assert_eq!(imported.choices[0].difficulty, Difficulty::Unspecified);

    let mut bank = QuestionBank::new();
    bank.apply_import(imported);
    save_bank(&dir, "carol", &bank).await.unwrap();
    let loaded = load_bank(&dir, "carol").await.unwrap();
    assert_eq!(loaded, bank);
    assert!(loaded.selected_ordering().is_some());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_import_path_missing_file() {
    let missing = temp_dir("missing").join("nothing.xml");
    let result = tokio_test::block_on(import_path(&missing, None, ImportLimits::default()));
    assert!(result.is_err());
}
