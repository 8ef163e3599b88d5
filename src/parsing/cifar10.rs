//! Reader for the binary version of CIFAR-10
//!
//! A batch file is `ITEM_COUNT` records packed back to back, each record being
//! one label byte followed by a 3x32x32 image stored as red, green and blue planes.
//! The files can be downloaded from <https://www.cs.toronto.edu/~kriz/cifar.html>
use super::{
    Dataset, ReaderError, Result, DEPTH, HEIGHT, ITEM_COUNT, LABEL_BYTES, RECORD_BYTES, WIDTH,
};
use memmap2::Mmap;
use ndarray::{Array1, Array3, Array4};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// The canonical batch files of the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFile {
    Data1,
    Data2,
    Data3,
    Data4,
    Data5,
    Test,
}

impl BatchFile {
    /// Training batches, in the order they are concatenated
    pub const TRAIN: [BatchFile; 5] = [
        BatchFile::Data1,
        BatchFile::Data2,
        BatchFile::Data3,
        BatchFile::Data4,
        BatchFile::Data5,
    ];
    pub const TEST: BatchFile = BatchFile::Test;

    pub fn file_name(self) -> &'static str {
        match self {
            BatchFile::Data1 => "data_batch_1.bin",
            BatchFile::Data2 => "data_batch_2.bin",
            BatchFile::Data3 => "data_batch_3.bin",
            BatchFile::Data4 => "data_batch_4.bin",
            BatchFile::Data5 => "data_batch_5.bin",
            BatchFile::Test => "test_batch.bin",
        }
    }

    /// Files to load for the given selection, training batches first
    pub fn selected(train: bool, test: bool) -> Vec<BatchFile> {
        let mut files = vec![];

        if train {
            files.extend_from_slice(&BatchFile::TRAIN);
        }
        if test {
            files.push(BatchFile::TEST);
        }

        files
    }
}

/// Which batches to load and where they live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub path: PathBuf,
    pub train: bool,
    pub test: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            path: PathBuf::from("."),
            train: true,
            test: false,
        }
    }
}

impl ReaderConfig {
    /// Load a config from a JSON file. Missing fields take their default value
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<ReaderConfig> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| ReaderError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// CIFAR-10 images and labels, decoded eagerly at construction
pub struct BatchReader {
    items: Dataset,
}

impl BatchReader {
    /// Decode the selected batches found in `path`.
    /// Fails as a whole if any selected file is missing, unreadable or truncated
    pub fn new<P: AsRef<Path>>(path: P, train: bool, test: bool) -> Result<BatchReader> {
        let dir = path.as_ref();
        let mut items = Dataset::new();

        for batch in BatchFile::selected(train, test) {
            items.extend(read_batch(&dir.join(batch.file_name()))?);
        }

        Ok(BatchReader { items })
    }

    pub fn from_config(config: &ReaderConfig) -> Result<BatchReader> {
        BatchReader::new(&config.path, config.train, config.test)
    }

    /// Labels of every record, in dataset order
    pub fn get_labels(&self) -> Vec<u8> {
        self.items.iter().map(|(label, _)| *label).collect()
    }

    /// Images of every record, aligned with `get_labels`
    pub fn get_images(&self) -> Vec<Array3<u8>> {
        self.items.iter().map(|(_, image)| image.clone()).collect()
    }

    pub fn items(&self) -> &[(u8, Array3<u8>)] {
        &self.items
    }

    pub fn into_items(self) -> Dataset {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Labels as a (n,) array
    pub fn labels_array(&self) -> Array1<u8> {
        Array1::from(self.get_labels())
    }

    /// Images stacked into a (n, 3, 32, 32) array
    pub fn images_array(&self) -> Result<Array4<u8>> {
        let flat: Vec<u8> = self
            .items
            .iter()
            .flat_map(|(_, image)| image.iter().copied())
            .collect();

        Ok(Array4::from_shape_vec(
            (self.items.len(), DEPTH, HEIGHT, WIDTH),
            flat,
        )?)
    }
}

/// Map one batch file and decode all of its records.
/// The file and the map are released when this returns
fn read_batch(path: &Path) -> Result<Dataset> {
    let io_err = |source: std::io::Error| ReaderError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let size = file.metadata().map_err(io_err)?.len();
    check_len(path, size, ITEM_COUNT)?;

    // SAFETY: the file is opened read-only and the map never outlives this call
    let mmap = unsafe { Mmap::map(&file) }.map_err(io_err)?;

    decode_records(path, &mmap, ITEM_COUNT)
}

fn check_len(path: &Path, size: u64, item_count: usize) -> Result<()> {
    let required = (item_count * RECORD_BYTES) as u64;

    if size < required {
        return Err(ReaderError::Truncated {
            path: path.to_path_buf(),
            size,
            required,
        });
    }

    Ok(())
}

/// Decode the first `item_count` records of `bytes`.
/// Record i starts at `i * RECORD_BYTES`; trailing bytes after the last record are ignored.
/// `path` is only used to report a truncated buffer
pub fn decode_records(path: &Path, bytes: &[u8], item_count: usize) -> Result<Dataset> {
    check_len(path, bytes.len() as u64, item_count)?;

    let mut items = Dataset::with_capacity(item_count);

    for record in bytes[..item_count * RECORD_BYTES].chunks_exact(RECORD_BYTES) {
        let label = record[0];
        let image =
            Array3::from_shape_vec((DEPTH, HEIGHT, WIDTH), record[LABEL_BYTES..].to_vec())?;

        items.push((label, image));
    }

    Ok(items)
}
