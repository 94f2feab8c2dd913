// Tests for loading programs through the file manager

use gantry_host::file_manager::FileManager;
use gantry_host::gcode::{CommandLetter, GCodeError};
use std::fs as stdfs;
use std::io::Write;
use tempfile::tempdir;

#[tokio::test]
async fn test_read_program_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("led_test.gcode");
    let mut file = stdfs::File::create(&path).unwrap();
    writeln!(file, "; header").unwrap();
    writeln!(file, "G1 X10 Y20").unwrap();
    writeln!(file, "M150 P0 R255 G255 B255 I0.2").unwrap();
    writeln!(file, "G1 X").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "M30").unwrap();
    file.flush().unwrap();

    let program = FileManager::new().read_program(path.to_str().unwrap()).await.unwrap();
    assert_eq!(program.len(), 4);
    let lines = program.lines();
    assert_eq!(lines[0].number, 2);
    assert_eq!(lines[0].parsed.as_ref().unwrap().letter, CommandLetter::G);
    assert!(matches!(lines[2].parsed, Err(GCodeError::Malformed { .. })));
    assert_eq!(lines[3].number, 6);
    assert_eq!(lines[3].parsed.as_ref().unwrap().name(), "M30");
}

#[tokio::test]
async fn test_read_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.gcode");
    let result = FileManager::new().read_program(path.to_str().unwrap()).await;
    assert!(result.is_err());
}
