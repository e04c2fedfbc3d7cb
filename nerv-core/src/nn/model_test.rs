use super::*;
use crate::nn::init::CompositionInit;
use crate::nn::vertex::Vertex;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

struct Variants {
    words: Arc<Variant>,
    comp: Arc<Variant>,
    soft: Arc<Variant>,
}

fn variants() -> Variants {
    Variants {
        words: Variant::keyed_source(
            "words",
            2,
            vec![
                ("a", vec![0.3, -0.2]),
                ("b", vec![-0.5, 0.1]),
                ("<unk>", vec![0.0, 0.4]),
            ],
            "<unk>",
        )
        .unwrap(),
        comp: Variant::weighted_sum("comp", 2, 2, CompositionInit::BlockIdentity),
        soft: Variant::softmax("soft", 2, 2),
    }
}

fn model(v: &Variants, seed: u64) -> Model {
    Model::with_rng(
        vec![v.words.clone(), v.comp.clone(), v.soft.clone()],
        &mut StdRng::seed_from_u64(seed),
    )
    .unwrap()
}

fn net(v: &Variants, left: &str, right: &str, target: Vec<f64>) -> Net {
    let mut net = Net::new();
    let l = net.add_vertex(Vertex::keyed(&v.words, left).unwrap());
    let r = net.add_vertex(Vertex::keyed(&v.words, right).unwrap());
    let c = net.add_vertex(Vertex::composition(&v.comp).unwrap());
    let s = net.add_vertex(Vertex::classifier(&v.soft, Some(target)).unwrap());
    net.connect(&[l, r], c).unwrap();
    net.add_edge(c, s).unwrap();
    net
}

#[test]
fn test_layout_and_initial_values() {
    let v = variants();
    let m = model(&v, 0);
    assert_eq!(m.len(), 6 + (8 + 2) + (4 + 2));
    assert_eq!(m.weight("words").unwrap(), &[0.3, -0.2, -0.5, 0.1, 0.0, 0.4]);
    assert_eq!(m.bias("comp").unwrap(), &[0.0, 0.0]);
    assert_eq!(m.bias("soft").unwrap(), &[0.0, 0.0]);
    assert!(m.weight("soft").unwrap().iter().any(|&w| w != 0.0));
}

#[test]
fn test_duplicate_variant_rejected() {
    let v = variants();
    let result = Model::new(vec![v.soft.clone(), Variant::softmax("soft", 2, 2)]);
    assert_eq!(
        result.unwrap_err(),
        NervError::DuplicateVariant("soft".to_string())
    );
}

#[test]
fn test_gradient_is_zeroed_twin() {
    let v = variants();
    let mut m = model(&v, 0);
    let mut gradient = m.gradient();
    assert_eq!(gradient.params().len(), m.len());
    assert!(gradient.params().iter().all(|&g| g == 0.0));

    gradient.weight_mut("words").unwrap()[0] = 42.0;
    assert_eq!(m.weight("words").unwrap()[0], 0.3);
    m.weight_mut("words").unwrap()[1] = 7.0;
    assert_eq!(gradient.weight("words").unwrap()[1], 0.0);
}

#[test]
fn test_clear_and_lookup() {
    let v = variants();
    let mut m = model(&v, 0);
    assert_eq!(m.variant("comp").unwrap().name(), "comp");
    assert!(matches!(m.variant("nope"), Err(NervError::UnknownVariant(_))));
    m.clear();
    assert!(m.params().iter().all(|&p| p == 0.0));
}

#[test]
fn test_weights_are_shared_across_nets() {
    let v = variants();
    let mut m = model(&v, 0);
    let mut first = net(&v, "a", "b", vec![1.0, 0.0]);
    let mut second = net(&v, "b", "b", vec![0.0, 1.0]);
    m.forward(&mut first, None).unwrap();
    m.forward(&mut second, None).unwrap();
    let before = (
        first.vertex(3).unwrap().activations().to_vec(),
        second.vertex(3).unwrap().activations().to_vec(),
    );

    m.weight_mut("comp").unwrap()[0] += 1.0;
    m.forward(&mut first, None).unwrap();
    m.forward(&mut second, None).unwrap();
    assert_ne!(first.vertex(3).unwrap().activations(), &before.0[..]);
    assert_ne!(second.vertex(3).unwrap().activations(), &before.1[..]);
}

#[test]
fn test_loss_normalises_by_batch() -> Result<(), NervError> {
    let v = variants();
    let m = model(&v, 3);
    let mut nets = vec![
        net(&v, "a", "b", vec![1.0, 0.0]),
        net(&v, "b", "a", vec![0.0, 1.0]),
    ];
    let summed = m.loss(&mut nets, false)?;
    let mean = m.loss(&mut nets, true)?;
    assert_relative_eq!(mean.get("soft"), summed.get("soft") / 2.0);
    assert_eq!(summed.get("comp"), 0.0);
    assert_eq!(m.loss(&mut [], true).unwrap_err(), NervError::EmptyBatch);
    Ok(())
}

#[test]
fn test_loss_and_gradient_normalises_gradient() -> Result<(), NervError> {
    let v = variants();
    let m = model(&v, 4);
    let mut nets = vec![
        net(&v, "a", "b", vec![1.0, 0.0]),
        net(&v, "b", "zzz", vec![0.0, 1.0]),
    ];
    let (_, summed) = m.loss_and_gradient(&mut nets, false)?;
    let (_, mean) = m.loss_and_gradient(&mut nets, true)?;
    for (s, n) in summed.params().iter().zip(mean.params()) {
        assert_relative_eq!(*n, s / 2.0, epsilon = 1e-15);
    }

    // The same as backpropagating each net on its own and adding up.
    let mut by_hand = m.gradient();
    for net in nets.iter_mut() {
        m.forward(net, None)?;
        by_hand.merge(&m.backward(net)?)?;
    }
    for (a, b) in by_hand.params().iter().zip(summed.params()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-15);
    }
    Ok(())
}

#[test]
fn test_accumulate_adds_up() -> Result<(), NervError> {
    let v = variants();
    let m = model(&v, 5);
    let mut nets = vec![net(&v, "a", "a", vec![1.0, 0.0])];
    let mut loss = Loss::new();
    let mut gradient = m.gradient();
    m.accumulate(&mut nets, &mut loss, &mut gradient)?;
    let once = (loss.total(), gradient.params().to_vec());
    m.accumulate(&mut nets, &mut loss, &mut gradient)?;
    assert_relative_eq!(loss.total(), 2.0 * once.0);
    for (twice, single) in gradient.params().iter().zip(&once.1) {
        assert_relative_eq!(*twice, 2.0 * single, epsilon = 1e-15);
    }
    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> Result<(), NervError> {
    let v = variants();
    let m = model(&v, 6);
    let keys = ["a", "b", "<unk>", "zzz"];
    let mut nets: Vec<Net> = (0..16)
        .map(|i| {
            let target = if i % 2 == 0 { vec![1.0, 0.0] } else { vec![0.0, 1.0] };
            net(&v, keys[i % 4], keys[(i / 4) % 4], target)
        })
        .collect();
    let (seq_loss, seq_grad) = m.loss_and_gradient(&mut nets, true)?;
    let (par_loss, par_grad) = m.par_loss_and_gradient(&mut nets, true)?;
    assert_relative_eq!(seq_loss.total(), par_loss.total(), epsilon = 1e-12);
    for (s, p) in seq_grad.params().iter().zip(par_grad.params()) {
        assert_relative_eq!(*s, *p, epsilon = 1e-12);
    }
    Ok(())
}

#[test]
fn test_json_round_trip() -> Result<(), NervError> {
    let v = variants();
    let m = model(&v, 7);
    let restored = Model::from_json(&m.to_json()?)?;
    assert_eq!(restored, m);
    let table = restored.variant("words")?.slice_table().unwrap();
    assert_eq!(table.keys(), vec!["a", "b", "<unk>"]);
    assert_eq!(table.slot("unseen"), 2);
    Ok(())
}

#[test]
fn test_from_json_rejects_wrong_buffer_size() {
    let v = variants();
    let m = model(&v, 8);
    let mut value: serde_json::Value = serde_json::from_str(&m.to_json().unwrap()).unwrap();
    value["params"].as_array_mut().unwrap().pop();
    let result = Model::from_json(&value.to_string());
    assert!(matches!(result, Err(NervError::Serialization(_))));
}

#[test]
fn test_seeding_decides_equality() {
    let v = variants();
    assert_eq!(model(&v, 9), model(&v, 9));
    assert_ne!(model(&v, 9), model(&v, 10));
}

#[test]
fn test_from_json_rejects_tampered_variants() {
    let v = variants();
    let m = model(&v, 11);
    let saved: serde_json::Value = serde_json::from_str(&m.to_json().unwrap()).unwrap();

    // A slot past the end of the dictionary.
    let mut value = saved.clone();
    value["variants"][0]["kind"]["KeyedSource"]["table"]["slots"]["a"] = serde_json::json!(7);
    assert!(matches!(
        Model::from_json(&value.to_string()),
        Err(NervError::Serialization(_))
    ));

    // Two keys sharing one slot.
    let mut value = saved.clone();
    value["variants"][0]["kind"]["KeyedSource"]["table"]["slots"]["a"] = serde_json::json!(1);
    assert!(matches!(
        Model::from_json(&value.to_string()),
        Err(NervError::Serialization(_))
    ));

    // Initial representations that no longer cover the dictionary.
    let mut value = saved.clone();
    value["variants"][0]["kind"]["KeyedSource"]["initial"]
        .as_array_mut()
        .unwrap()
        .truncate(2);
    assert!(matches!(
        Model::from_json(&value.to_string()),
        Err(NervError::Serialization(_))
    ));

    // A composition whose fan-in disagrees with its arity.
    let mut value = saved;
    value["variants"][1]["fan_in"] = serde_json::json!(3);
    assert!(matches!(
        Model::from_json(&value.to_string()),
        Err(NervError::Serialization(_))
    ));
}
