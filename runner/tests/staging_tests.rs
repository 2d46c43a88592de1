use grover_runner::runner::{stage_inputs, DATA_FILE, SMILES_COLUMN};
use proptest::prelude::*;

fn read_back(path: &std::path::Path) -> (String, Vec<String>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().get(0).unwrap().to_string();
    let rows = reader
        .records()
        .map(|r| r.unwrap().get(0).unwrap().to_string())
        .collect();
    (header, rows)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn staged_rows_match_input_order(
        molecules in prop::collection::vec("[A-Za-z0-9()\\[\\]=#@+/\\\\%.-]{1,40}", 0..20)
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE);

        stage_inputs(&path, &molecules).unwrap();

        let (header, rows) = read_back(&path);
        prop_assert_eq!(header, SMILES_COLUMN);
        prop_assert_eq!(rows, molecules);
    }
}

#[test]
fn smiles_with_commas_are_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DATA_FILE);
    let molecules = vec!["C,C".to_string(), "CCO".to_string()];

    stage_inputs(&path, &molecules).unwrap();

    let (_, rows) = read_back(&path);
    assert_eq!(rows, molecules);
}
