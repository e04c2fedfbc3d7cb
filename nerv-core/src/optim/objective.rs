//! Objective functions as consumed by [`crate::optim::Minimizer`].
//!
//! An objective maps a parameter container to its loss and gradient. Any
//! `FnMut(&P) -> Evaluation<L>` closure is one.

use crate::error::NervError;

/// Loss and flat gradient at one point.
pub type Evaluation<L> = Result<(L, Vec<f64>), NervError>;

/// Joins a loss function and a separate gradient function into one objective.
pub fn split<P, L, F, G>(mut func: F, mut fprime: G) -> impl FnMut(&P) -> Evaluation<L>
where
    P: ?Sized,
    F: FnMut(&P) -> Result<L, NervError>,
    G: FnMut(&P) -> Result<Vec<f64>, NervError>,
{
    move |params: &P| Ok((func(params)?, fprime(params)?))
}
