#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, Once},
};

/// Axis aligned cube with half extent 0.5 around the origin, without normals
/// or texture coordinates, as ShapeNet meshes usually come.
pub const CUBE_OBJ: &str = "\
mtllib missing.mtl
o Cube
v -0.5 -0.5 -0.5
v 0.5 -0.5 -0.5
v 0.5 0.5 -0.5
v -0.5 0.5 -0.5
v -0.5 -0.5 0.5
v 0.5 -0.5 0.5
v 0.5 0.5 0.5
v -0.5 0.5 0.5
f 1 4 3 2
f 5 6 7 8
f 1 2 6 5
f 2 3 7 6
f 3 4 8 7
f 4 1 5 8
";

/// A cube scaled down to half extent 0.25.
pub fn small_cube_obj() -> String {
    CUBE_OBJ
        .lines()
        .map(|line| match line.strip_prefix("v ") {
            Some(coords) => {
                let scaled = coords
                    .split_whitespace()
                    .map(|c| (c.parse::<f32>().unwrap() * 0.5).to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("v {scaled}")
            }
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_file(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    fs::write(&path, contents).expect("write fixture");
    path
}

/// A solid colour image of the given size, saved as PNG.
pub fn write_solid_png(path: &Path, size: u32, rgba: [u8; 4]) -> PathBuf {
    let img = image::RgbaImage::from_pixel(size, size, image::Rgba(rgba));
    img.save(path).expect("write texture fixture");
    path.to_path_buf()
}

/// Relative path -> contents for every file below `root`.
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).expect("read snapshot directory") {
            let path = entry.expect("directory entry").path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                files.insert(rel, fs::read(&path).expect("read snapshot file"));
            }
        }
    }
    files
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

pub fn assert_close3(actual: [f32; 3], expected: [f32; 3]) {
    for i in 0..3 {
        assert!(
            (actual[i] - expected[i]).abs() < 1e-4,
            "component {i}: expected {expected:?}, got {actual:?}"
        );
    }
}

/// Logger that keeps every record so tests can assert on emitted messages.
struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};

/// Installs the capturing logger once per test binary.
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger installed");
        log::set_max_level(log::LevelFilter::Trace);
    });
}

/// Whether a record at `level` containing `needle` was logged so far.
pub fn logged(level: log::Level, needle: &str) -> bool {
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .any(|(l, msg)| *l == level && msg.contains(needle))
}
