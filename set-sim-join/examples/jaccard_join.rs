use set_sim_join::tokenizer::QgramTokenizer;
use set_sim_join::{JoinConfig, SetSimJoiner, SideSpec, SimMeasure, Table};

fn main() {
    let mut ltable = Table::new(["id", "name", "city"]).unwrap();
    ltable.add_row([Some("a1"), Some("Jimbocho"), Some("Tokyo")]).unwrap();
    ltable.add_row([Some("a2"), Some("Kanda"), Some("Tokyo")]).unwrap();
    ltable.add_row([Some("a3"), None, Some("Osaka")]).unwrap();

    let mut rtable = Table::new(["id", "name"]).unwrap();
    rtable.add_row([Some("b1"), Some("Jinbocho")]).unwrap();
    rtable.add_row([Some("b2"), Some("Kanda")]).unwrap();

    // Joins on character bigrams with Jaccard similarity >= 0.5, also outputting the city.
    let tokenizer = QgramTokenizer::new(2, false).unwrap();
    let config = JoinConfig::new(SimMeasure::Jaccard, 0.5).unwrap();
    let output = SetSimJoiner::new(config)
        .join(
            &ltable,
            &SideSpec::left("id", "name").out_attrs(["city"]),
            &rtable,
            &SideSpec::right("id", "name"),
            &tokenizer,
        )
        .unwrap();

    println!("{}", output.header().join(","));
    for row in output.rows() {
        println!("{}", row.to_fields().join(","));
    }
    assert_eq!(output.key_pairs(), vec![("a1", "b1"), ("a2", "b2")]);
}
