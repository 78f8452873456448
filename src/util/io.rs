//! Buffered file access with errors that name the file: the binary graph
//! loader, the bincode cache, and the distance dump all go through here.

use crate::error::{io_error, DeltaSurgeError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

pub fn open_reader(file_path: &str) -> Result<BufReader<File>, DeltaSurgeError> {
    let file = File::open(file_path)
        .map_err(|e| io_error(format!("Could not open '{}' for reading: {}", file_path, e)))?;
    Ok(BufReader::new(file))
}

pub fn create_writer(file_path: &str) -> Result<BufWriter<File>, DeltaSurgeError> {
    let file = File::create(file_path)
        .map_err(|e| io_error(format!("Could not create '{}' for writing: {}", file_path, e)))?;
    Ok(BufWriter::new(file))
}

pub fn write_bytes(
    writer: &mut BufWriter<File>,
    file_path: &str,
    bytes: &[u8],
) -> Result<(), DeltaSurgeError> {
    writer
        .write_all(bytes)
        .map_err(|e| io_error(format!("Could not write to '{}': {}", file_path, e)))
}
