//! Memory-mapped file storage.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use memmap::MmapMut;
use parking_lot::RwLock;

use error::{ErrorKind, Result};
use storage::{Lease, Storage};

/// Growth headroom applied when a write outruns the mapped capacity,
/// as a percent of the current capacity.
const DEFAULT_EXPANSION: usize = 50;

pub struct MapInner {
	file: Option<File>,
	map: Option<MmapMut>,
}

impl MapInner {
	pub fn bytes(&self) -> &[u8] {
		self.map.as_ref().map(|map| &map[..]).unwrap_or(&[])
	}
}

/// One OS file owned through a resizable memory map. Capacity equals
/// the file length; growth truncates nothing and happens under the
/// write lock, so leases never observe a remap.
pub struct MapFile {
	path: PathBuf,
	expansion: usize,
	inner: RwLock<MapInner>,
	logical: AtomicUsize,
	faulted: AtomicBool,
	space: AtomicUsize,
}

impl MapFile {
	/// Wrap an existing file; `load` maps it.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		if !path.as_ref().is_file() {
			return Err(ErrorKind::NotFound.into());
		}
		Ok(Self::unmapped(path, DEFAULT_EXPANSION))
	}

	/// Create a new file of at least `minimum_bytes`; `load` maps it.
	pub fn create<P: AsRef<Path>>(path: P, minimum_bytes: usize) -> Result<Self> {
		let file = OpenOptions::new()
			.read(true)
			.write(true)
			.create_new(true)
			.open(path.as_ref())?;
		// Zero-length maps are rejected by some platforms.
		file.set_len(minimum_bytes.max(1) as u64)?;
		file.sync_all()?;
		Ok(Self::unmapped(path, DEFAULT_EXPANSION))
	}

	pub fn with_expansion(mut self, expansion: usize) -> Self {
		self.expansion = expansion.max(1);
		self
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn unmapped<P: AsRef<Path>>(path: P, expansion: usize) -> Self {
		MapFile {
			path: path.as_ref().to_owned(),
			expansion,
			inner: RwLock::new(MapInner { file: None, map: None }),
			logical: AtomicUsize::new(0),
			faulted: AtomicBool::new(false),
			space: AtomicUsize::new(0),
		}
	}

	fn check_loaded(&self) -> Result<()> {
		if !self.is_loaded() {
			return Err(ErrorKind::UnloadedFile(self.path.clone()).into());
		}
		Ok(())
	}

	fn check_faulted(&self) -> Result<()> {
		if self.faulted.load(Ordering::Acquire) {
			return Err(ErrorKind::DiskFull(self.space.load(Ordering::Acquire)).into());
		}
		Ok(())
	}

	// Grow the file and remap. Caller holds the write lock.
	fn grow(&self, inner: &mut MapInner, capacity: usize) -> Result<()> {
		let file = inner.file.as_ref()
			.expect("grow is called on a loaded map; qed");

		if let Err(err) = file.set_len(capacity as u64) {
			let current = inner.map.as_ref().map(|map| map.len()).unwrap_or(0);
			self.space.store(capacity - current, Ordering::Release);
			self.faulted.store(true, Ordering::Release);
			warn!("storage {:?} grow to {} failed: {}", self.path, capacity, err);
			return Err(ErrorKind::DiskFull(capacity - current).into());
		}

		// Remap at the new length; the old view is dropped first.
		inner.map = None;
		inner.map = Some(unsafe { MmapMut::map_mut(file)? });
		Ok(())
	}
}

impl Storage for MapFile {
	fn load(&self) -> Result<()> {
		let mut inner = self.inner.write();
		if inner.map.is_some() {
			return Ok(());
		}

		let file = OpenOptions::new().read(true).write(true).open(&self.path)?;
		let map = unsafe { MmapMut::map_mut(&file)? };
		self.logical.store(map.len(), Ordering::Release);
		inner.file = Some(file);
		inner.map = Some(map);
		Ok(())
	}

	fn unload(&self) -> Result<()> {
		let mut inner = self.inner.write();
		if let Some(map) = inner.map.take() {
			map.flush()?;
		}
		// Give back the growth headroom so the file length equals the
		// committed size at the next open. Zero-length files cannot
		// be mapped, so empty bodies keep one byte.
		if let Some(file) = inner.file.take() {
			let logical = self.logical.load(Ordering::Acquire).max(1);
			file.set_len(logical as u64)?;
			file.sync_all()?;
		}
		Ok(())
	}

	fn is_loaded(&self) -> bool {
		self.inner.read().map.is_some()
	}

	fn size(&self) -> usize {
		self.logical.load(Ordering::Acquire)
	}

	fn capacity(&self) -> usize {
		self.inner.read().map.as_ref().map(|map| map.len()).unwrap_or(0)
	}

	fn read(&self) -> Result<Lease> {
		self.check_loaded()?;
		Ok(Lease::Map(self.inner.read()))
	}

	fn write_at(&self, offset: usize, bytes: &[u8]) -> Result<()> {
		let inner = self.inner.read();
		let map = match inner.map {
			Some(ref map) => map,
			None => return Err(ErrorKind::UnloadedFile(self.path.clone()).into()),
		};
		assert!(offset + bytes.len() <= map.len(),
			"write beyond mapped capacity");

		// Writers target disjoint unpublished regions, or head cells
		// under the owning head's write lock; the map read lock only
		// excludes remapping.
		unsafe {
			let target = map.as_ptr().add(offset) as *mut u8;
			ptr::copy_nonoverlapping(bytes.as_ptr(), target, bytes.len());
		}

		Ok(())
	}

	fn allocate(&self, bytes: usize) -> Result<usize> {
		self.check_faulted()?;
		let offset = self.logical.fetch_add(bytes, Ordering::AcqRel);
		let required = offset + bytes;

		if required > self.capacity() {
			let target = required.max(
				self.capacity() + self.capacity() * self.expansion / 100);
			if let Err(err) = self.reserve(target) {
				self.logical.fetch_sub(bytes, Ordering::AcqRel);
				return Err(err);
			}
		}

		Ok(offset)
	}

	fn resize(&self, size: usize) -> Result<()> {
		self.check_faulted()?;
		if size > self.capacity() {
			self.reserve(size)?;
		}
		self.logical.store(size, Ordering::Release);
		Ok(())
	}

	fn truncate(&self, size: usize) -> Result<()> {
		if size < self.size() {
			self.logical.store(size, Ordering::Release);
		}
		Ok(())
	}

	fn reserve(&self, capacity: usize) -> Result<()> {
		self.check_loaded()?;
		self.check_faulted()?;

		let mut inner = self.inner.write();
		let current = inner.map.as_ref().map(|map| map.len()).unwrap_or(0);
		if capacity <= current {
			return Ok(());
		}

		self.grow(&mut inner, capacity)
	}

	fn flush(&self) -> Result<()> {
		let inner = self.inner.read();
		if let Some(ref map) = inner.map {
			map.flush()?;
		}
		Ok(())
	}

	fn get_space(&self) -> usize {
		self.space.load(Ordering::Acquire)
	}

	fn reload(&self) -> Result<()> {
		if !self.faulted.load(Ordering::Acquire) {
			return Ok(());
		}

		let needed = self.capacity() + self.space.load(Ordering::Acquire);
		let mut inner = self.inner.write();
		self.faulted.store(false, Ordering::Release);
		self.space.store(0, Ordering::Release);

		let result = self.grow(&mut inner, needed);
		if result.is_ok() {
			info!("storage {:?} recovered from disk full", self.path);
		}
		result
	}
}

impl Drop for MapFile {
	fn drop(&mut self) {
		let mut inner = self.inner.write();
		if let Some(map) = inner.map.take() {
			let _ = map.flush();
		}
	}
}
