//! Reading and writing graph data from and to disk.
//!
//! Graphs are stored as a directory of raw binary arrays, one file per attribute.
//! Single arrays go through the `Load` and `Store` traits,
//! whole graphs through `Deconstruct` and `Reconstruct`.
//!
//! # Example
//!
//! ```no_run
//! # use core_matrix::io::*;
//!
//! let levels = Vec::<u32>::load_from("graph/level")?;
//! levels.write_to(&"output/level")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    ffi::OsStr,
    fs::{metadata, File},
    io::{prelude::*, Error, ErrorKind, Result},
    mem,
    path::Path,
    slice,
};

/// Access the data of an object as a slice of bytes.
///
/// Do not use this Trait but rather the `Store` trait.
pub trait DataBytes {
    fn data_bytes(&self) -> &[u8];
}

/// Mutable access to the internal data of an object so serialized bytes can be read into it.
///
/// Do not use this Trait but rather the `Load` trait.
pub trait DataBytesMut {
    fn data_bytes_mut(&mut self) -> &mut [u8];
}

impl<T: Copy> DataBytes for [T] {
    fn data_bytes(&self) -> &[u8] {
        let num_bytes = self.len() * mem::size_of::<T>();
        unsafe { slice::from_raw_parts(self.as_ptr() as *const u8, num_bytes) }
    }
}

impl<T: Copy> DataBytes for Vec<T> {
    fn data_bytes(&self) -> &[u8] {
        self[..].data_bytes()
    }
}

impl<T: Copy> DataBytesMut for Vec<T> {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        let num_bytes = self.len() * mem::size_of::<T>();
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr() as *mut u8, num_bytes) }
    }
}

/// Write objects to disk.
pub trait Store: DataBytes {
    /// Writes the serialized object to the file with the given path
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: DataBytes> Store for T {}
impl<T> Store for [T] where [T]: DataBytes {}

/// Load serialized data back into objects.
pub trait Load: DataBytesMut + Sized {
    /// Create an object of the correct size for the given number of serialized bytes.
    /// Fails if the byte count does not fit the element size.
    fn new_with_bytes(num_bytes: usize) -> Result<Self>;

    /// Load the file at `path` into a freshly created object.
    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let metadata = metadata(path.as_ref())?;
        let mut file = File::open(path)?;

        let mut object = Self::new_with_bytes(metadata.len() as usize)?;
        file.read_exact(object.data_bytes_mut())?;

        Ok(object)
    }
}

impl<T: Default + Copy> Load for Vec<T> {
    fn new_with_bytes(num_bytes: usize) -> Result<Self> {
        if num_bytes % mem::size_of::<T>() != 0 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("file size {} is not a multiple of the element size {}", num_bytes, mem::size_of::<T>()),
            ));
        }
        Ok(vec![T::default(); num_bytes / mem::size_of::<T>()])
    }
}

/// Serialize objects which need more than a single file.
pub trait Deconstruct: Sized {
    /// Should call the `store_callback` for each file that should be written to disk.
    /// The first param of the callback is a name to identify the file, the second param the data to be stored.
    fn store_each(&self, store_callback: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()>;

    /// Store this object in the directory `dir`.
    fn deconstruct_to<D: AsRef<OsStr>>(&self, dir: &D) -> Result<()> {
        let path = Path::new(dir);

        self.store_each(&|name, object: &dyn Store| object.write_to(&path.join(name)))
    }
}

/// Callback handle for loading the files of a `Reconstruct` object.
#[derive(Debug)]
pub struct Loader<'a> {
    path: &'a Path,
}

impl<'a> Loader<'a> {
    /// Load the file stored under `name` by the `store_each` callback.
    pub fn load<T: Load, P: AsRef<Path>>(&self, name: P) -> Result<T> {
        T::load_from(self.path.join(name))
    }

    /// Optional parts of an object may be missing on disk.
    pub fn exists<P: AsRef<Path>>(&self, name: P) -> bool {
        self.path.join(name).exists()
    }
}

/// Deserialize objects which need more than a single file.
pub trait Reconstruct: Sized {
    /// Should use the loader passed along to load all the necessary files back.
    fn reconstruct_with(loader: Loader) -> Result<Self>;

    /// Reconstruct an object from the directory `dir`.
    fn reconstruct_from<D: AsRef<OsStr>>(dir: &D) -> Result<Self> {
        let path = Path::new(dir);
        Self::reconstruct_with(Loader { path })
    }
}
