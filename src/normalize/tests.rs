use std::collections::HashSet;

use super::*;

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Two structures with a global column: C (5 atoms) and O (3 atoms).
fn small_atom_table() -> AtomDescriptorTable {
    let mut table = AtomDescriptorTable::new();
    table.insert("C", "partial_charge", vec![-0.4, 0.1, 0.1, 0.1, 0.1]);
    table.insert("O", "partial_charge", vec![-0.8, 0.4, 0.4]);
    table
}

#[test]
fn test_global_column_endpoints() {
    let table = small_atom_table();
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();
    let bundle = normalizer
        .fit(&table, &cols(&["partial_charge"]), &reactions, &[], None, None)
        .unwrap();
    let scaled = normalizer
        .transform_atoms(&table, &cols(&["partial_charge"]), &bundle, None)
        .unwrap();
    // pooled range is [-0.8, 0.4]
    let o = scaled.values("O", "partial_charge").unwrap();
    assert_eq!(o[0], 0.0);
    assert_eq!(o[1], 1.0);
    let c = scaled.values("C", "partial_charge").unwrap();
    assert!((c[0] - (-0.4 + 0.8) / 1.2).abs() < 1e-6);
}

#[test]
fn test_atom_type_column_groups_by_element() {
    let mut table = AtomDescriptorTable::new();
    // methane: atoms are [C, H, H, H, H]
    table.insert("C", "NMR", vec![150.0, 30.0, 31.0, 32.0, 33.0]);
    // water: atoms are [O, H, H]
    table.insert("O", "NMR", vec![300.0, 28.0, 34.0]);
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();
    let bundle = normalizer
        .fit(&table, &cols(&["NMR"]), &reactions, &[], None, None)
        .unwrap();

    // one scaler per element, each with its own range
    assert_eq!(bundle.elements_seen("NMR"), vec!["C", "H", "O"]);
    let h = bundle.atom_type_scaler("NMR", "H").unwrap();
    assert_eq!(h.data_min(), 28.0);
    assert_eq!(h.data_max(), 34.0);

    let scaled = normalizer.transform_atoms(&table, &cols(&["NMR"]), &bundle, None).unwrap();
    // the lone C value is a degenerate range and maps to the feature minimum
    assert_eq!(scaled.values("C", "NMR").unwrap()[0], 0.0);
    // H values scale within the pooled H range across both structures
    assert_eq!(scaled.values("O", "NMR").unwrap()[1], 0.0);
    assert_eq!(scaled.values("O", "NMR").unwrap()[2], 1.0);
}

#[test]
fn test_unseen_atom_type_is_fatal() {
    let mut train = AtomDescriptorTable::new();
    train.insert("C", "NMR", vec![150.0, 30.0, 31.0, 32.0, 33.0]);
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();
    let bundle = normalizer
        .fit(&train, &cols(&["NMR"]), &reactions, &[], None, None)
        .unwrap();

    // selenium never appeared during fitting
    let mut test = AtomDescriptorTable::new();
    test.insert("[SeH2]", "NMR", vec![500.0, 40.0, 41.0]);
    let err = normalizer
        .transform_atoms(&test, &cols(&["NMR"]), &bundle, None)
        .unwrap_err();
    match err {
        ReaccionError::UnseenAtomType { element, descriptor } => {
            assert_eq!(element, "Se");
            assert_eq!(descriptor, "NMR");
        }
        other => panic!("expected UnseenAtomType, got {other:?}"),
    }
}

#[test]
fn test_missing_column_is_fatal() {
    let table = small_atom_table();
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();
    let err = normalizer
        .fit(&table, &cols(&["fukui_elec"]), &reactions, &[], None, None)
        .unwrap_err();
    assert!(matches!(err, ReaccionError::MissingDescriptor { .. }));
}

#[test]
fn test_length_mismatch_is_fatal() {
    let mut table = AtomDescriptorTable::new();
    // methane resolves to 5 atoms, vector has 3
    table.insert("C", "NMR", vec![150.0, 30.0, 31.0]);
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();
    let err = normalizer
        .fit(&table, &cols(&["NMR"]), &reactions, &[], None, None)
        .unwrap_err();
    assert!(matches!(err, ReaccionError::DimensionMismatch { .. }));
}

#[test]
fn test_reaction_column_standardized() {
    let mut reactions = ReactionDescriptorTable::new();
    reactions.insert("A>>B", "G", 1.0);
    reactions.insert("C>>D", "G", 3.0);
    let normalizer = DescriptorNormalizer::new();
    let atoms = AtomDescriptorTable::new();
    let bundle = normalizer
        .fit(&atoms, &[], &reactions, &cols(&["G"]), None, None)
        .unwrap();
    let scaled = normalizer
        .transform_reactions(&reactions, &cols(&["G"]), &bundle, None)
        .unwrap();
    // mean 2, population std 1
    assert!((scaled.value("A>>B", "G").unwrap() + 1.0).abs() < 1e-6);
    assert!((scaled.value("C>>D", "G").unwrap() - 1.0).abs() < 1e-6);
}

// FALSIFY-NL-001: scalers fitted on a reference subset carry no statistics
// from outside it. Fitting on {C} with or without the O row present must
// produce bit-identical bundles and bit-identical transforms.
#[test]
fn falsify_nl_001_reference_set_excludes_held_out_rows() {
    let full = small_atom_table();
    let mut train_only = AtomDescriptorTable::new();
    train_only.insert("C", "partial_charge", vec![-0.4, 0.1, 0.1, 0.1, 0.1]);

    let reference: HashSet<String> = ["C".to_string()].into_iter().collect();
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();

    let scoped = normalizer
        .fit(&full, &cols(&["partial_charge"]), &reactions, &[], Some(&reference), None)
        .unwrap();
    let isolated = normalizer
        .fit(&train_only, &cols(&["partial_charge"]), &reactions, &[], None, None)
        .unwrap();
    assert_eq!(scoped, isolated);

    let a = normalizer
        .transform_atoms(&full, &cols(&["partial_charge"]), &scoped, None)
        .unwrap();
    let b = normalizer
        .transform_atoms(&full, &cols(&["partial_charge"]), &isolated, None)
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_transform_skips_rows_outside_subset() {
    let mut table = small_atom_table();
    // a row without the required column, as left behind when the record
    // pre-filter drops everything referencing it
    table.insert("CC", "fukui_elec", vec![0.0; 8]);
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();
    let subset: HashSet<String> = ["C".to_string(), "O".to_string()].into_iter().collect();
    let bundle = normalizer
        .fit(&table, &cols(&["partial_charge"]), &reactions, &[], Some(&subset), None)
        .unwrap();

    let scaled = normalizer
        .transform_atoms(&table, &cols(&["partial_charge"]), &bundle, Some(&subset))
        .unwrap();
    assert!(scaled.contains_structure("C"));
    assert!(scaled.contains_structure("O"));
    assert!(!scaled.contains_structure("CC"));

    // without the subset the deficient row is reached and rejected
    let err = normalizer
        .transform_atoms(&table, &cols(&["partial_charge"]), &bundle, None)
        .unwrap_err();
    assert!(matches!(err, ReaccionError::MissingDescriptor { .. }));
}

// FALSIFY-NL-002: transformation is pure. Applying the same bundle twice
// yields bit-identical tables.
#[test]
fn falsify_nl_002_transform_is_pure() {
    let table = small_atom_table();
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();
    let bundle = normalizer
        .fit(&table, &cols(&["partial_charge"]), &reactions, &[], None, None)
        .unwrap();
    let a = normalizer
        .transform_atoms(&table, &cols(&["partial_charge"]), &bundle, None)
        .unwrap();
    let b = normalizer
        .transform_atoms(&table, &cols(&["partial_charge"]), &bundle, None)
        .unwrap();
    assert_eq!(a, b);
}

// FALSIFY-NL-003: bundles survive serialization without drifting.
#[test]
fn falsify_nl_003_bundle_serde_round_trip() {
    let table = small_atom_table();
    let normalizer = DescriptorNormalizer::new();
    let reactions = ReactionDescriptorTable::new();
    let bundle = normalizer
        .fit(&table, &cols(&["partial_charge"]), &reactions, &[], None, None)
        .unwrap();
    let json = serde_json::to_string(&bundle).expect("serialize");
    let restored: ScalerBundle = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(bundle, restored);
}
