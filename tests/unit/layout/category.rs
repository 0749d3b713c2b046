use std::collections::HashSet;

use super::*;

#[test]
fn ranks_are_a_total_order() {
    let ranks: HashSet<u8> = category_layouts().iter().map(|l| l.rank).collect();
    assert_eq!(ranks.len(), Category::ALL.len());

    for pair in category_layouts().windows(2) {
        assert!(pair[0].rank < pair[1].rank);
    }
}

#[test]
fn every_category_has_its_own_row() {
    for c in Category::ALL {
        assert_eq!(c.layout().category, c);
    }
}

#[test]
fn bands_are_well_formed_and_some_overlap() {
    for l in category_layouts() {
        assert!(0.0 <= l.band.top && l.band.top < l.band.bottom && l.band.bottom <= 1.0);
    }
    let top = Category::Top.layout().band;
    let bottom = Category::Bottom.layout().band;
    assert!(bottom.top < top.bottom);
}

#[test]
fn outerwear_paints_over_shoes() {
    assert!(Category::Outerwear.layout().rank > Category::Shoes.layout().rank);
    assert!(Category::Top.layout().rank > Category::Bottom.layout().rank);
}

#[test]
fn tags_parse_back_including_aliases() {
    for c in Category::ALL {
        assert_eq!(c.tag().parse::<Category>().unwrap(), c);
        assert_eq!(c.to_string(), c.tag());
    }
    assert_eq!("Shirt".parse::<Category>().unwrap(), Category::Top);
    assert_eq!(" pants ".parse::<Category>().unwrap(), Category::Bottom);
    assert!("scarf".parse::<Category>().is_err());
}

#[test]
fn serde_uses_lowercase_tags() {
    let json = serde_json::to_string(&Category::Outerwear).unwrap();
    assert_eq!(json, "\"outerwear\"");
    let back: Category = serde_json::from_str("\"shoes\"").unwrap();
    assert_eq!(back, Category::Shoes);
}
