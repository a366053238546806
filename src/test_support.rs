use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::Utf8PathBuf;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh, already-created directory under the system temp dir.
pub fn unique_temp_dir() -> Utf8PathBuf {
    let mut dir = std::env::temp_dir();
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("stconf-test-{}-{ts}-{seq}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    Utf8PathBuf::from_path_buf(dir).unwrap()
}

/// Whether directory permission bits actually restrict this process.
///
/// Call after making `dir` read-only: root and similar users can still write.
#[cfg(unix)]
pub fn permissions_enforced(dir: &camino::Utf8Path) -> bool {
    let marker = dir.join(".stconf-permission-check");
    match fs::write(&marker, b"") {
        Ok(()) => {
            let _ = fs::remove_file(&marker);
            false
        }
        Err(_) => true,
    }
}
