use std::sync::Arc;

use nerv_core::{CompositionInit, Model, Net, Variant, Vertex};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Variants of the two-word classifier used across the integration tests.
#[allow(dead_code)]
pub struct Classifier {
    pub words: Arc<Variant>,
    pub comp: Arc<Variant>,
    pub avg: Arc<Variant>,
    pub soft: Arc<Variant>,
}

#[allow(dead_code)]
pub fn classifier() -> Classifier {
    Classifier {
        words: Variant::keyed_source(
            "words",
            2,
            vec![
                ("a", vec![0.4, -0.1]),
                ("b", vec![-0.3, 0.7]),
                ("<unk>", vec![0.05, 0.05]),
            ],
            "<unk>",
        )
        .expect("valid dictionary"),
        comp: Variant::weighted_sum("comp", 2, 2, CompositionInit::BlockIdentity),
        avg: Variant::average("avg", 2, CompositionInit::Gradual),
        soft: Variant::softmax("soft", 2, 2),
    }
}

#[allow(dead_code)]
pub fn seeded_model(c: &Classifier, seed: u64) -> Model {
    Model::with_rng(
        vec![c.words.clone(), c.comp.clone(), c.avg.clone(), c.soft.clone()],
        &mut StdRng::seed_from_u64(seed),
    )
    .expect("distinct variant names")
}

/// `left` and `right` composed by weighted sum, then classified.
#[allow(dead_code)]
pub fn pair_net(c: &Classifier, left: &str, right: &str, target: Vec<f64>) -> Net {
    let mut net = Net::new();
    let l = net.add_vertex(Vertex::keyed(&c.words, left).unwrap());
    let r = net.add_vertex(Vertex::keyed(&c.words, right).unwrap());
    let comp = net.add_vertex(Vertex::composition(&c.comp).unwrap());
    let soft = net.add_vertex(Vertex::classifier(&c.soft, Some(target)).unwrap());
    net.connect(&[l, r], comp).unwrap();
    net.add_edge(comp, soft).unwrap();
    net
}

/// Every word averaged, then classified.
#[allow(dead_code)]
pub fn bag_net(c: &Classifier, words: &[&str], target: Vec<f64>) -> Net {
    let mut net = Net::new();
    let avg = net.add_vertex(Vertex::composition(&c.avg).unwrap());
    for word in words {
        let w = net.add_vertex(Vertex::keyed(&c.words, *word).unwrap());
        net.add_edge(w, avg).unwrap();
    }
    let soft = net.add_vertex(Vertex::classifier(&c.soft, Some(target)).unwrap());
    net.add_edge(avg, soft).unwrap();
    net
}
