#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    #[error("{horizon} days x {sims} simulations exceeds the path cell limit of {limit}")]
    ResourceExhausted {
        horizon: usize,
        sims: usize,
        limit: usize,
    },

    #[error("price path matrix has an inconsistent shape: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl SimError {
    pub(crate) fn invalid(name: &'static str, reason: &'static str) -> Self {
        Self::InvalidParameter { name, reason }
    }
}
