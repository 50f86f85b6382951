//! The unit-of-work contract the runner measures.

use std::error::Error;

/// Error type returned by [`Operation::execute`].
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// A named, repeatable unit of work.
///
/// Implementations own whatever state they need (a connection, a key
/// counter); the runner only calls `execute` in a tight sequential loop and
/// uses `name` for reporting.
pub trait Operation {
    /// Stable, human-readable label.
    fn name(&self) -> &str;

    /// Perform one unit of work. `iteration` is the zero-based call index
    /// within the current run.
    fn execute(&mut self, iteration: u64) -> Result<(), BoxError>;
}

impl<T: Operation + ?Sized> Operation for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn execute(&mut self, iteration: u64) -> Result<(), BoxError> {
        (**self).execute(iteration)
    }
}

/// Adapts a closure into an [`Operation`].
pub struct FnOperation<F> {
    name: String,
    f: F,
}

impl<F> FnOperation<F>
where
    F: FnMut(u64) -> Result<(), BoxError>,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Operation for FnOperation<F>
where
    F: FnMut(u64) -> Result<(), BoxError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, iteration: u64) -> Result<(), BoxError> {
        (self.f)(iteration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_operation_passes_iteration() {
        let mut seen = Vec::new();
        {
            let mut op = FnOperation::new("collect", |i| {
                seen.push(i);
                Ok(())
            });
            assert_eq!(op.name(), "collect");
            for i in 0..4 {
                op.execute(i).unwrap();
            }
        }
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_boxed_operation_delegates() {
        let mut op: Box<dyn Operation> =
            Box::new(FnOperation::new("fails", |_| Err("boom".into())));
        assert_eq!(op.name(), "fails");
        assert_eq!(op.execute(0).unwrap_err().to_string(), "boom");
    }
}
