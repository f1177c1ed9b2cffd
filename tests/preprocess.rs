use kira_taxon::preprocess::{DefaultPreprocessor, NamePreprocessor};

#[test]
fn normalizes_dataset_names() {
    let cases = [
        ("Asellus2_aquaticus", "Asellus+aquaticus"),
        ("Chelifera", "Chelifera"),
        ("Foo_sp", "Foo"),
        ("Ephemerella_aroni_aurivillii", "Ephemerella+aurivillii"),
        ("Hydropsyche_larva", "Hydropsyche"),
        ("Gammarus_pulex_adult", "Gammarus+pulex"),
    ];
    for (raw, expected) in cases {
        assert_eq!(DefaultPreprocessor.preprocess(raw), expected, "input {raw}");
    }
}
