use thiserror::Error;

/// Aborts the current unit of work or commit.
///
/// When a commit fails, the host tree may be left partially updated.
#[derive(Debug, Error)]
pub enum Error<E>
where
	E: std::error::Error + 'static,
{
	#[error("host adapter failed to {operation}")]
	Host {
		operation: &'static str,
		#[source]
		source: E,
	},
}

pub(crate) fn host<E: std::error::Error + 'static>(operation: &'static str) -> impl FnOnce(E) -> Error<E> {
	move |source| Error::Host { operation, source }
}
