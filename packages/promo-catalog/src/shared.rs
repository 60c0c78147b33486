use std::sync::{Arc, RwLock};

use crate::Catalog;

/// Hot-swappable handle to the current catalog snapshot.
///
/// Readers take an `Arc` clone and keep scoring against it even while a
/// reload swaps in a replacement, so a rebuild never exposes a
/// partially-loaded catalog to in-flight requests.
#[derive(Debug)]
pub struct SharedCatalog {
	inner: RwLock<Arc<Catalog>>,
}
impl SharedCatalog {
	pub fn new(catalog: Catalog) -> Self {
		Self { inner: RwLock::new(Arc::new(catalog)) }
	}

	pub fn snapshot(&self) -> Arc<Catalog> {
		self.inner.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// Replaces the current snapshot in one reference update and returns
	/// the previous one.
	pub fn swap(&self, catalog: Catalog) -> Arc<Catalog> {
		let mut guard = self.inner.write().unwrap_or_else(|err| err.into_inner());

		std::mem::replace(&mut *guard, Arc::new(catalog))
	}
}
