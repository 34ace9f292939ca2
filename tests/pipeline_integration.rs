//! End-to-end pipeline tests.
//!
//! Runs the full protocol on a tiny hand-checkable dataset: three
//! reactions, three folds, one ensemble member, the mean baseline as the
//! model. With k = n every reaction is held out exactly once, so each
//! prediction file carries one row whose value must equal the mean target
//! of the two remaining reactions.

use std::collections::HashMap;

use reaccion::prelude::*;

const RXNS: [(&str, &str, f32, f32); 3] = [
    ("r0", "CO>>CO", 10.0, -1.0),
    ("r1", "CCO>>CCO", 20.0, 3.0),
    ("r2", "OCC>>OCC", 30.0, 5.0),
];

fn dataset() -> ReactionDataset {
    let records = RXNS
        .iter()
        .map(|&(id, rxn, ea, er)| ReactionRecord {
            rxn_id: id.to_string(),
            rxn_smiles: rxn.to_string(),
            activation_energy: ea,
            reaction_energy: er,
        })
        .collect();
    ReactionDataset::new(records)
}

fn descriptor_tables() -> (AtomDescriptorTable, ReactionDescriptorTable) {
    let mut atoms = AtomDescriptorTable::new();
    for smiles in ["CO", "CCO", "OCC"] {
        let mol = resolve(smiles).unwrap();
        for (offset, col) in ["partial_charge", "fukui_elec", "fukui_neu", "NMR"]
            .iter()
            .enumerate()
        {
            let values: Vec<f32> = (0..mol.atom_count())
                .map(|i| offset as f32 + 0.1 * i as f32)
                .collect();
            atoms.insert(smiles, col, values);
        }
        for (offset, col) in ["bond_order", "bond_length"].iter().enumerate() {
            let values: Vec<f32> = (0..mol.bond_count())
                .map(|i| 1.0 + offset as f32 + 0.05 * i as f32)
                .collect();
            atoms.insert(smiles, col, values);
        }
    }
    let mut reactions = ReactionDescriptorTable::new();
    for (i, &(_, rxn, _, _)) in RXNS.iter().enumerate() {
        for (offset, col) in ["G", "E_r", "G_alt1", "G_alt2"].iter().enumerate() {
            reactions.insert(rxn, col, i as f32 + 0.25 * offset as f32);
        }
    }
    (atoms, reactions)
}

fn mean_factory(_fold: usize, _member: usize) -> Box<dyn TrainableRegressor> {
    Box::new(MeanRegressor::new())
}

#[test]
fn leave_one_out_predictions_match_train_means() {
    let (atoms, reactions) = descriptor_tables();
    let dir = tempfile::tempdir().unwrap();

    let report = CrossValidation::new(3)
        .with_random_state(7)
        .with_epochs(1)
        .with_output_dir(dir.path())
        .run(dataset(), &atoms, &reactions, &mean_factory)
        .unwrap();

    assert_eq!(report.folds.len(), 3);
    assert_eq!(report.dropped_records, 0);

    let targets: HashMap<&str, (f32, f32)> = RXNS
        .iter()
        .map(|&(id, _, ea, er)| (id, (ea, er)))
        .collect();

    let mut seen_ids = Vec::new();
    for fold in 0..3 {
        let path = dir.path().join(format!("test_predicted_{fold}.csv"));
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "rxn_id,predicted_activation_energy,predicted_reaction_energy"
        );
        let row = lines.next().unwrap();
        assert!(lines.next().is_none());

        let fields: Vec<&str> = row.split(',').collect();
        let id = fields[0];
        let predicted_ea: f32 = fields[1].parse().unwrap();
        let predicted_er: f32 = fields[2].parse().unwrap();
        seen_ids.push(id.to_string());

        // mean baseline: the prediction is the mean of the other two
        let (ea_sum, er_sum) = targets
            .iter()
            .filter(|&(&other, _)| other != id)
            .fold((0.0f32, 0.0f32), |(a, b), (_, &(ea, er))| (a + ea, b + er));
        assert!((predicted_ea - ea_sum / 2.0).abs() < 1e-2, "fold {fold}: {predicted_ea}");
        assert!((predicted_er - er_sum / 2.0).abs() < 1e-2, "fold {fold}: {predicted_er}");
    }

    // every reaction held out exactly once
    seen_ids.sort();
    assert_eq!(seen_ids, vec!["r0", "r1", "r2"]);
}

#[test]
fn scores_are_exact_for_the_mean_baseline() {
    let (atoms, reactions) = descriptor_tables();
    let report = CrossValidation::new(3)
        .with_random_state(7)
        .with_epochs(1)
        .run(dataset(), &atoms, &reactions, &mean_factory)
        .unwrap();

    // single-row test slices: RMSE == MAE == |prediction - truth|
    for score in &report.folds {
        assert!((score.activation_rmse - score.activation_mae).abs() < 1e-4);
        assert!((score.reaction_rmse - score.reaction_mae).abs() < 1e-4);
    }
    // held-out errors for means of the other two: |10-25|, |20-20|, |30-15|
    let mut errors: Vec<f32> = report.folds.iter().map(|f| f.activation_rmse).collect();
    errors.sort_by(f32::total_cmp);
    assert!((errors[0] - 0.0).abs() < 1e-2);
    assert!((errors[1] - 15.0).abs() < 1e-2);
    assert!((errors[2] - 15.0).abs() < 1e-2);
}

#[test]
fn unseen_element_in_held_out_fold_aborts() {
    let mut records: Vec<ReactionRecord> = dataset().records().to_vec();
    records.push(ReactionRecord {
        rxn_id: "r3".to_string(),
        rxn_smiles: "[SeH2]>>[SeH2]".to_string(),
        activation_energy: 12.0,
        reaction_energy: 0.5,
    });

    let (mut atoms, mut reactions) = descriptor_tables();
    let mol = resolve("[SeH2]").unwrap();
    for col in ["partial_charge", "fukui_elec", "fukui_neu", "NMR"] {
        atoms.insert("[SeH2]", col, vec![0.3; mol.atom_count()]);
    }
    for col in ["bond_order", "bond_length"] {
        atoms.insert("[SeH2]", col, vec![1.0; mol.bond_count()]);
    }
    for col in ["G", "E_r", "G_alt1", "G_alt2"] {
        reactions.insert("[SeH2]>>[SeH2]", col, 0.1);
    }

    // k = n: the selenium reaction lands alone in some test slice, where
    // no training structure can supply a Se scaler
    let result = CrossValidation::new(4)
        .with_epochs(1)
        .run(ReactionDataset::new(records), &atoms, &reactions, &mean_factory);
    match result {
        Err(ReaccionError::UnseenAtomType { element, .. }) => assert_eq!(element, "Se"),
        other => panic!("expected UnseenAtomType, got {other:?}"),
    }
}
