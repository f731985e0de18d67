use std::{fmt, str::FromStr};

use crate::{
    error::NnError,
    ops::{LayerOps, ParallelOps, ReferenceOps},
};

/// Controls how the layers of the network are executed.
///
/// The strategy is resolved once into a [`LayerOps`] implementation when the classifier is
/// built; it is never consulted again while running.
///
/// # Example
///
/// ```
/// use facecnn_nn::parallel::ExecutionStrategy;
///
/// let strategy: ExecutionStrategy = "fixed:4".parse().unwrap();
/// assert_eq!(strategy, ExecutionStrategy::Fixed(4));
///
/// // the legacy integer codes are accepted as well
/// assert_eq!("0".parse::<ExecutionStrategy>().unwrap(), ExecutionStrategy::Reference);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Run every layer sequentially on the calling thread.
    ///
    /// Useful for debugging and as the baseline the parallel layers are checked against.
    Reference,

    /// Distribute every layer over the global rayon thread pool.
    #[default]
    Parallel,

    /// Distribute every layer over a dedicated pool of `n` threads.
    ///
    /// The pool is built once, when the strategy is resolved.
    Fixed(usize),
}

impl ExecutionStrategy {
    /// Resolve the strategy into the layer implementation it selects.
    ///
    /// # Errors
    ///
    /// Fails for [`ExecutionStrategy::Fixed`] with zero threads or when the pool cannot be
    /// built.
    pub fn build(self) -> Result<Box<dyn LayerOps>, NnError> {
        Ok(match self {
            ExecutionStrategy::Reference => Box::new(ReferenceOps),
            ExecutionStrategy::Parallel => Box::new(ParallelOps::new()),
            ExecutionStrategy::Fixed(n) => Box::new(ParallelOps::with_threads(n)?),
        })
    }
}

impl FromStr for ExecutionStrategy {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "reference" | "0" => Ok(ExecutionStrategy::Reference),
            "parallel" | "1" => Ok(ExecutionStrategy::Parallel),
            other => other
                .strip_prefix("fixed:")
                .and_then(|n| n.parse::<usize>().ok())
                .map(ExecutionStrategy::Fixed)
                .ok_or_else(|| NnError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStrategy::Reference => write!(f, "reference"),
            ExecutionStrategy::Parallel => write!(f, "parallel"),
            ExecutionStrategy::Fixed(n) => write!(f, "fixed:{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() -> Result<(), NnError> {
        assert_eq!("reference".parse::<ExecutionStrategy>()?, ExecutionStrategy::Reference);
        assert_eq!("Parallel".parse::<ExecutionStrategy>()?, ExecutionStrategy::Parallel);
        assert_eq!("1".parse::<ExecutionStrategy>()?, ExecutionStrategy::Parallel);
        assert_eq!(" fixed:3 ".parse::<ExecutionStrategy>()?, ExecutionStrategy::Fixed(3));
        Ok(())
    }

    #[test]
    fn test_parse_unknown() {
        for s in ["2", "fast", "fixed:", "fixed:x", ""] {
            assert!(matches!(
                s.parse::<ExecutionStrategy>(),
                Err(NnError::UnknownStrategy(_))
            ));
        }
    }

    #[test]
    fn test_display_round_trip() -> Result<(), NnError> {
        for strategy in [
            ExecutionStrategy::Reference,
            ExecutionStrategy::Parallel,
            ExecutionStrategy::Fixed(2),
        ] {
            assert_eq!(strategy.to_string().parse::<ExecutionStrategy>()?, strategy);
        }
        Ok(())
    }

    #[test]
    fn test_build() -> Result<(), NnError> {
        assert_eq!(ExecutionStrategy::Reference.build()?.name(), "reference");
        assert_eq!(ExecutionStrategy::default().build()?.name(), "parallel");
        assert_eq!(ExecutionStrategy::Fixed(1).build()?.name(), "parallel");
        assert!(ExecutionStrategy::Fixed(0).build().is_err());
        Ok(())
    }
}
