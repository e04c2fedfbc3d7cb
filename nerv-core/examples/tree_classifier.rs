//! # Tree classifier
//!
//! Trains a tiny recursive classifier over binary trees of words:
//!
//! 1. Keyed-source embeddings for a small dictionary, `<unk>` as fallback.
//! 2. One weighted-sum composition shared by every internal node.
//! 3. One softmax classifier shared by every node, with a target at each.
//! 4. A finite-difference check of the gradient before training.
//! 5. AdaGrad driven by a `Minimizer` over the whole corpus.
//!
//! Run with `RUST_LOG=debug cargo run --example tree_classifier` to see the
//! engine's own logging.

use std::sync::Arc;

use log::info;
use nerv_core::optim::{AdagradHyperParams, AdagradOptimizer, Minimizer};
use nerv_core::{
    check_gradients, CompositionInit, GradCheckConfig, Model, NervError, Net, Variant, Vertex,
    VertexId,
};

const DIMS: usize = 4;
const LABELS: usize = 2;

enum Tree {
    Leaf(&'static str, usize),
    Node(Box<Tree>, Box<Tree>, usize),
}

fn leaf(word: &'static str, label: usize) -> Box<Tree> {
    Box::new(Tree::Leaf(word, label))
}

fn node(left: Box<Tree>, right: Box<Tree>, label: usize) -> Box<Tree> {
    Box::new(Tree::Node(left, right, label))
}

struct Variants {
    words: Arc<Variant>,
    comp: Arc<Variant>,
    soft: Arc<Variant>,
}

fn onehot(label: usize) -> Vec<f64> {
    let mut target = vec![0.0; LABELS];
    target[label] = 1.0;
    target
}

/// Adds `tree` to `net` and returns the vertex holding its representation.
fn build(tree: &Tree, variants: &Variants, net: &mut Net) -> Result<VertexId, NervError> {
    let (id, label) = match tree {
        Tree::Leaf(word, label) => (net.add_vertex(Vertex::keyed(&variants.words, *word)?), *label),
        Tree::Node(left, right, label) => {
            let l = build(left, variants, net)?;
            let r = build(right, variants, net)?;
            let comp = net.add_vertex(Vertex::composition(&variants.comp)?);
            net.connect(&[l, r], comp)?;
            (comp, *label)
        }
    };
    let soft = net.add_vertex(Vertex::classifier(&variants.soft, Some(onehot(label)))?);
    net.add_edge(id, soft)?;
    Ok(id)
}

fn corpus() -> Vec<Box<Tree>> {
    vec![
        node(leaf("not", 0), leaf("good", 1), 0),
        node(leaf("very", 1), leaf("good", 1), 1),
        node(leaf("not", 0), leaf("bad", 0), 1),
        node(leaf("very", 1), leaf("bad", 0), 0),
        node(leaf("not", 0), node(leaf("very", 1), leaf("good", 1), 1), 0),
        node(leaf("not", 0), node(leaf("very", 1), leaf("bad", 0), 0), 1),
        node(leaf("quite", 1), leaf("good", 1), 1),
    ]
}

fn main() -> Result<(), NervError> {
    env_logger::init();

    let dictionary = ["good", "bad", "not", "very", "<unk>"]
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let repr = (0..DIMS)
                .map(|d| if d == i % DIMS { 0.5 } else { 0.0 })
                .collect();
            (*word, repr)
        });
    let variants = Variants {
        words: Variant::keyed_source("words", DIMS, dictionary, "<unk>")?,
        comp: Variant::weighted_sum("comp", DIMS, 2, CompositionInit::BlockIdentity),
        soft: Variant::softmax("soft", LABELS, DIMS),
    };
    let model = Model::new(vec![
        variants.words.clone(),
        variants.comp.clone(),
        variants.soft.clone(),
    ])?;

    let mut nets = corpus()
        .iter()
        .map(|tree| {
            let mut net = Net::new();
            build(tree, &variants, &mut net)?;
            Ok::<_, NervError>(net)
        })
        .collect::<Result<Vec<_>, _>>()?;
    println!("{} trees, {} parameters", nets.len(), model.len());

    let report = check_gradients(&model, &mut nets[..2], &GradCheckConfig::default())?;
    println!(
        "gradient check: {} components, {} mismatching regions",
        report.checked,
        report.mismatches.len()
    );

    let objective = |model: &Model| {
        let (loss, gradient) = model.par_loss_and_gradient(&mut nets, true)?;
        Ok((loss, gradient.into_params()))
    };
    let optimizer = AdagradOptimizer::new(AdagradHyperParams::default())?;
    let mut minimizer = Minimizer::new(model, optimizer, objective);

    for _ in 0..300 {
        let step = minimizer.step()?;
        if step.iteration % 25 == 0 {
            println!("step {:>4}  loss {:.5}", step.iteration, step.loss.total());
        }
        info!("accumulator norm {:.4}", step.accumulator.iter().map(|a| a * a).sum::<f64>().sqrt());
    }

    let model = minimizer.into_params();
    println!("saved model: {} bytes of JSON", model.to_json()?.len());
    Ok(())
}
