//! Likelihood model for methylation counts grouped on the sample tree
//!

use statrs::function::beta::ln_beta;

/// Beta-binomial log-likelihood of one sample's methylated count, given the pooled counts of
/// its sample group
///
/// Terms which only depend on the sample's own counts are left out, since they are constant
/// over all groupings.
///
/// If either pooled count is not positive the likelihood is undefined, in which case the sample
/// contributes 0.
///
/// # Arguments
/// * `x` - Methylated count of the sample
/// * `n` - Total coverage of the sample
/// * `a` - Pooled methylated count of the sample's group, including the sample
/// * `b` - Pooled unmethylated count of the sample's group, including the sample
///
pub fn group_log_likelihood(x: f64, n: f64, a: f64, b: f64) -> f64 {
    let alpha = a + x;
    let beta = b + n - x;
    if !(a > 0.0 && b > 0.0 && alpha > 0.0 && beta > 0.0) {
        return 0.0;
    }
    let ll = ln_beta(alpha, beta) - ln_beta(a, b);
    if ll.is_nan() { 0.0 } else { ll }
}

/// Log prior of one specific set of `n_mutation` edges being mutated, with each of `n_edges`
/// edges mutated independently with probability `p_mutation`
///
pub fn mutation_prior(n_mutation: usize, p_mutation: f64, n_edges: usize) -> f64 {
    assert!(
        p_mutation > 0.0 && p_mutation < 1.0,
        "Mutation probability must be in (0,1), found: {p_mutation}"
    );
    let n_mutation = n_mutation as f64;
    let n_edges = n_edges as f64;
    n_mutation * p_mutation.ln() + (n_edges - n_mutation) * (1.0 - p_mutation).ln()
}
