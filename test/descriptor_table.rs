//! Integration Tests for the Descriptor Table
//!
//! Tests slot allocation, the zero/no-op conventions, and whole-file loading
//! against real files in a scratch directory.

use std::path::Path;

use anyhow::Result;
use hostrt::{load, DescriptorTable, NO_DESCRIPTOR};

fn path_bytes(path: &Path) -> Vec<u8> {
    path.to_str().unwrap().as_bytes().to_vec()
}

// =============================================================================
// Slot Allocation
// =============================================================================

#[test]
fn test_fill_table_first_fit() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut table = DescriptorTable::new();

    for expected in 0..128 {
        let path = dir.path().join(format!("f{}.txt", expected));
        let fd = table.open(&path_bytes(&path), false);
        assert_eq!(fd, Some(expected));
    }
    assert_eq!(table.len_open(), 128);

    // Table exhausted
    let extra = dir.path().join("extra.txt");
    assert_eq!(table.open(&path_bytes(&extra), false), None);
    assert!(!extra.exists());

    for fd in 0..128 {
        table.close(fd);
    }
    assert_eq!(table.len_open(), 0);
    Ok(())
}

#[test]
fn test_closed_slot_reused_before_higher_slots() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut table = DescriptorTable::new();

    let a = table.open(&path_bytes(&dir.path().join("a")), false);
    let b = table.open(&path_bytes(&dir.path().join("b")), false);
    let c = table.open(&path_bytes(&dir.path().join("c")), false);
    assert_eq!((a, b, c), (Some(0), Some(1), Some(2)));

    table.close(1);
    assert!(!table.is_open(1));
    assert_eq!(table.open(&path_bytes(&dir.path().join("d")), true), Some(1));
    assert_eq!(table.open(&path_bytes(&dir.path().join("e")), false), Some(3));
    Ok(())
}

#[test]
fn test_failed_open_leaves_slot_vacant() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut table = DescriptorTable::with_capacity(1);

    assert_eq!(table.open(&path_bytes(&dir.path().join("missing")), true), None);
    assert!(!table.is_open(0));
    assert_eq!(table.open(&path_bytes(&dir.path().join("ok")), false), Some(0));
    Ok(())
}

#[test]
fn test_small_capacity() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut table = DescriptorTable::with_capacity(2);
    assert_eq!(table.capacity(), 2);

    assert_eq!(table.open(&path_bytes(&dir.path().join("0")), false), Some(0));
    assert_eq!(table.open(&path_bytes(&dir.path().join("1")), false), Some(1));
    assert_eq!(table.open(&path_bytes(&dir.path().join("2")), false), None);
    Ok(())
}

// =============================================================================
// Close
// =============================================================================

#[test]
fn test_close_any_integer_is_harmless() {
    let mut table = DescriptorTable::new();
    for fd in [
        i32::MIN,
        NO_DESCRIPTOR,
        0,
        1,
        127,
        128,
        129,
        1000,
        i32::MAX,
    ] {
        table.close(fd);
        table.close(fd);
    }
    assert_eq!(table.len_open(), 0);
}

#[test]
fn test_close_twice_after_open() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut table = DescriptorTable::new();
    let fd = table.open(&path_bytes(&dir.path().join("x")), false).unwrap();

    table.close(fd);
    table.close(fd);
    assert!(!table.is_open(fd));
    Ok(())
}

// =============================================================================
// Read / Write Conventions
// =============================================================================

#[test]
fn test_write_to_input_descriptor_is_noop() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("in.txt");
    std::fs::write(&path, b"keep")?;

    let mut table = DescriptorTable::new();
    let fd = table.open(&path_bytes(&path), true).unwrap();
    table.write_range(fd, b"overwrite", 0, 9)?;
    // Even an out-of-range slice is not checked when nothing is written
    table.write_range(fd, b"ab", 1, 100)?;
    table.close(fd);

    assert_eq!(std::fs::read(&path)?, b"keep");
    Ok(())
}

#[test]
fn test_write_to_unopened_descriptor_is_noop() -> Result<()> {
    let mut table = DescriptorTable::new();
    table.write_range(0, b"data", 0, 4)?;
    table.write_range(-5, b"data", 0, 4)?;
    table.write_range(128, b"data", 0, 4)?;
    Ok(())
}

#[test]
fn test_read_whole_file_byte_by_byte() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bytes.bin");
    let data: Vec<u8> = (0..=255).collect();
    std::fs::write(&path, &data)?;

    let mut table = DescriptorTable::new();
    let fd = table.open(&path_bytes(&path), true).unwrap();
    assert_eq!(table.available(fd)?, 256);

    let mut read = Vec::new();
    while let Some(byte) = table.read(fd)? {
        read.push(byte);
    }
    assert_eq!(read, data);
    assert_eq!(table.available(fd)?, 0);
    Ok(())
}

#[test]
fn test_write_hi_then_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("hi.txt");
    let name = path_bytes(&path);

    let mut table = DescriptorTable::new();
    let fd = table.open(&name, false);
    assert_eq!(fd, Some(0));

    table.write_range(0, &[72, 105], 0, 2)?;
    table.close(0);

    assert_eq!(load(&name), Some(vec![72, 105]));
    Ok(())
}

// =============================================================================
// Load
// =============================================================================

#[test]
fn test_load_does_not_consume_a_slot() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.txt");
    std::fs::write(&path, b"contents")?;

    let table = DescriptorTable::new();
    assert_eq!(load(&path_bytes(&path)), Some(b"contents".to_vec()));
    assert_eq!(table.len_open(), 0);
    Ok(())
}

#[test]
fn test_load_large_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("large.bin");
    let data: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, &data)?;

    assert_eq!(load(&path_bytes(&path)), Some(data));
    Ok(())
}

#[test]
fn test_load_failures_are_none() -> Result<()> {
    let dir = tempfile::tempdir()?;
    assert_eq!(load(&path_bytes(&dir.path().join("missing"))), None);
    assert_eq!(load(&path_bytes(dir.path())), None);
    Ok(())
}
