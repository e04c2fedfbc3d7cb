use nerv_core::optim::{
    AdagradHyperParams, AdagradOptimizer, Optimizer, OptimizerState, SgdHyperParams,
};
use nerv_core::{GradCheckConfig, Loss, Model, NervError, ParamStore};

mod common;
use common::{classifier, pair_net, seeded_model};

#[test_log::test]
fn test_restored_model_computes_the_same_loss() -> Result<(), NervError> {
    let c = classifier();
    let model = seeded_model(&c, 21);
    let json = model.to_json()?;
    let restored = Model::from_json(&json)?;

    let mut nets = vec![
        pair_net(&c, "a", "b", vec![1.0, 0.0]),
        pair_net(&c, "zzz", "a", vec![0.0, 1.0]),
    ];
    let original = model.loss(&mut nets, true)?;
    let reloaded = restored.loss(&mut nets, true)?;
    assert_eq!(original, reloaded);
    assert_eq!(restored.weight("words")?, model.weight("words")?);
    Ok(())
}

#[test_log::test]
fn test_restored_variants_build_nets() -> Result<(), NervError> {
    let c = classifier();
    let restored = Model::from_json(&seeded_model(&c, 22).to_json()?)?;
    let words = restored.variant("words")?.clone();
    let table = words.slice_table().expect("keyed source keeps its table");
    assert!(table.contains("b"));
    assert_eq!(table.fallback(), "<unk>");

    // Variants from the restored model plug into new nets.
    let restored_classifier = common::Classifier {
        words,
        comp: restored.variant("comp")?.clone(),
        avg: restored.variant("avg")?.clone(),
        soft: restored.variant("soft")?.clone(),
    };
    let mut net = pair_net(&restored_classifier, "b", "a", vec![0.0, 1.0]);
    let mut loss = Loss::new();
    restored.forward(&mut net, Some(&mut loss))?;
    assert!(loss.get("soft") > 0.0);
    Ok(())
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(matches!(
        Model::from_json("{\"variants\": 3}"),
        Err(NervError::Serialization(_))
    ));
}

#[test]
fn test_loss_ledger_round_trip() {
    let mut loss = Loss::new();
    loss.add("soft", 0.25);
    loss.add("aux", 1.5);
    let json = serde_json::to_string(&loss).unwrap();
    let restored: Loss = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, loss);
}

#[test]
fn test_hyper_params_and_state_serialise() -> Result<(), NervError> {
    let hp: SgdHyperParams =
        serde_json::from_str(r#"{"lr": 0.05, "momentum": 0.9, "nesterov": true}"#)?;
    assert_eq!(hp.momentum, 0.9);
    assert!(hp.nesterov);

    let config: GradCheckConfig = serde_json::from_str(&serde_json::to_string(
        &GradCheckConfig {
            verbose: true,
            ..GradCheckConfig::default()
        },
    )?)?;
    assert!(config.verbose);

    let mut optimizer = AdagradOptimizer::new(AdagradHyperParams::default())?;
    let mut params = vec![1.0, 2.0];
    optimizer.update(&mut params, &[0.5, -0.5])?;
    let saved = serde_json::to_string(&optimizer.state())?;
    let state: OptimizerState = serde_json::from_str(&saved)?;
    let resumed = AdagradOptimizer::with_state(
        AdagradHyperParams::default(),
        state.accumulator().to_vec(),
    )?;
    assert_eq!(resumed.accumulator(), optimizer.accumulator());
    Ok(())
}
