use std::fmt::Write as _;

use anyhow::{Context, Result};
use camino::Utf8Path;
use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::materialize::{
    CONFIG_DIR, CONFIG_FILE, DirState, FilesystemError, Materialized, Preview,
};
use crate::payload::ConfigPayload;

const RULE_WIDTH: usize = 50;
const TREE_RULE_WIDTH: usize = 40;

pub struct TreeOptions {
    pub max_depth: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self { max_depth: 6 }
    }
}

// Directories that only add noise to a project overview.
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    ".cache",
    ".idea",
    ".vscode",
    "__pycache__",
    ".venv",
    "venv",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".ipynb_checkpoints",
    "node_modules",
    "target",
];

fn rule(width: usize) -> String {
    "=".repeat(width)
}

pub fn banner() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🎯 Streamlit Config Creator");
    let _ = writeln!(out, "{}", rule(RULE_WIDTH));
    let _ = writeln!(
        out,
        "This will create {}/{} for optimal performance\n",
        CONFIG_DIR, CONFIG_FILE
    );
    out
}

/// True when `root` holds `app.py` or any other top-level Python file.
pub fn detect_python_project(root: &Utf8Path) -> Result<bool> {
    if root.join("app.py").is_file() {
        return Ok(true);
    }
    let entries = root
        .read_dir_utf8()
        .with_context(|| format!("listing {}", root))?;
    Ok(entries
        .filter_map(|e| e.ok())
        .any(|entry| entry.file_name().ends_with(".py")))
}

pub fn project_detection(is_python: bool) -> &'static str {
    if is_python {
        "📍 Detected Python project - proceeding with config creation\n"
    } else {
        "⚠️  No Python files detected. Make sure you're in your project directory.\n"
    }
}

pub fn dry_run(preview: &Preview) -> String {
    let mut out = String::new();
    if preview.directory_collision {
        let _ = writeln!(
            out,
            "[dry-run] would fail: {} exists but is not a directory",
            preview.directory
        );
        return out;
    }
    if preview.directory_exists {
        let _ = writeln!(out, "[dry-run] directory already exists: {}", preview.directory);
    } else {
        let _ = writeln!(out, "[dry-run] would create directory {}", preview.directory);
    }
    let verb = if preview.file_exists { "overwrite" } else { "create" };
    let _ = writeln!(
        out,
        "[dry-run] would {} {} ({} bytes)",
        verb, preview.path, preview.bytes
    );
    out
}

pub fn success(done: &Materialized) -> String {
    let mut out = String::new();
    match done.directory_state {
        DirState::Created => {
            let _ = writeln!(out, "✅ Created directory: {}", done.directory);
        }
        DirState::Existing => {
            let _ = writeln!(out, "📁 Directory already exists: {}", done.directory);
        }
    }
    let _ = writeln!(out, "✅ Created config file: {}", done.path);
    let _ = writeln!(out, "📄 File size: {} bytes", done.size_on_disk);
    if let Some(modified) = done.modified {
        let stamp: DateTime<Local> = modified.into();
        let _ = writeln!(out, "🕒 Written at: {}", stamp.format("%Y-%m-%d %H:%M:%S"));
    }
    let _ = writeln!(out, "🚀 Ready for Streamlit Cloud deployment!");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", rule(RULE_WIDTH));
    let _ = writeln!(out, "🎉 SUCCESS! Your Streamlit configuration is ready!");
    let _ = writeln!(out, "{}", rule(RULE_WIDTH));
    out
}

pub fn failure(err: &FilesystemError) -> String {
    let mut out = String::new();
    if let Some(directory) = err.created_directory() {
        let _ = writeln!(out, "✅ Created directory: {}", directory);
    }
    let _ = writeln!(out, "❌ Error creating config file: {}", err);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "❌ Configuration creation failed. Please check permissions and try again."
    );
    out
}

fn is_materialized_config(parent: &Utf8Path, name: &str) -> bool {
    name == CONFIG_FILE && parent.file_name() == Some(CONFIG_DIR)
}

fn walk_directory(
    path: &Utf8Path,
    output: &mut String,
    depth: usize,
    opts: &TreeOptions,
) -> Result<()> {
    if depth >= opts.max_depth {
        return Ok(());
    }

    let indent = "  ".repeat(depth);
    let mut entries: Vec<_> = path
        .read_dir_utf8()
        .with_context(|| format!("listing {}", path))?
        .filter_map(|e| e.ok())
        .collect();
    entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));

    let (dirs, files): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false));

    for entry in files {
        let name = entry.file_name();
        if is_materialized_config(path, name) {
            let _ = writeln!(output, "{}✅ {}", indent, name);
        } else if !name.starts_with('.') {
            let _ = writeln!(output, "{}{}", indent, name);
        }
    }

    for entry in dirs {
        let name = entry.file_name();
        if SKIPPED_DIRS.contains(&name) {
            debug!(path = %entry.path(), "skipping directory in tree");
            continue;
        }
        let _ = writeln!(output, "{}{}/", indent, name);
        walk_subdirectory(entry.path(), output, depth + 1, opts);
    }

    Ok(())
}

// Unreadable subdirectories are listed without contents; only the root is fatal.
fn walk_subdirectory(
    path: &Utf8Path,
    output: &mut String,
    depth: usize,
    opts: &TreeOptions,
) {
    if let Err(err) = walk_directory(path, output, depth, opts) {
        warn!(path = %path, error = %err, "skipping unreadable directory");
    }
}

/// Indented listing of `root`; hidden files are left out except the config.
pub fn project_tree(root: &Utf8Path, opts: &TreeOptions) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "\n📁 Current Project Structure:");
    let _ = writeln!(out, "{}", rule(TREE_RULE_WIDTH));

    let name = root
        .canonicalize_utf8()
        .ok()
        .and_then(|p| p.file_name().map(str::to_owned))
        .unwrap_or_else(|| root.to_string());
    let _ = writeln!(out, "{}/", name);

    walk_directory(root, &mut out, 1, opts)?;
    Ok(out)
}

pub fn next_steps(payload: &ConfigPayload) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n🚀 Next Steps:");
    let _ = writeln!(out, "1. Test locally: streamlit run app.py");
    let _ = writeln!(
        out,
        "2. Commit to GitHub: git add . && git commit -m 'Add Streamlit config'"
    );
    let _ = writeln!(out, "3. Deploy to Streamlit Cloud");

    let _ = writeln!(out, "\n💡 Your dashboard will now have:");
    match payload.settings() {
        Ok(settings) => {
            if let Some(color) = &settings.theme.primary_color {
                let font = settings.theme.font.as_deref().unwrap_or("default font");
                let _ = writeln!(out, "   - Theme with primary color {} ({})", color, font);
            }
            if let Some(upload) = settings.server.max_upload_size {
                let message = settings.server.max_message_size.unwrap_or(upload);
                let _ = writeln!(
                    out,
                    "   - Uploads up to {} MB, messages up to {} MB",
                    upload, message
                );
            }
            let mut security = Vec::new();
            if settings.server.enable_xsrf_protection == Some(true) {
                security.push("XSRF protection");
            }
            if settings.browser.gather_usage_stats == Some(false) {
                security.push("usage stats off");
            }
            if settings.browser.show_error_details == Some(false) {
                security.push("error details hidden");
            }
            if !security.is_empty() {
                let _ = writeln!(out, "   - Security: {}", security.join(", "));
            }
        }
        Err(err) => debug!(error = %err, "payload settings unavailable for summary"),
    }
    match payload.sections() {
        Ok(sections) if !sections.is_empty() => {
            let _ = writeln!(out, "   - Sections: {}", sections.join(", "));
        }
        Ok(_) => {}
        Err(err) => debug!(error = %err, "payload sections unavailable for summary"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use std::io;

    use crate::test_support::unique_temp_dir;

    #[test]
    fn detects_python_projects() {
        let root = unique_temp_dir();
        assert!(!detect_python_project(&root).unwrap());

        fs::write(root.join("dashboard.py"), "import streamlit\n").unwrap();
        assert!(detect_python_project(&root).unwrap());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn app_py_alone_counts_as_python_project() {
        let root = unique_temp_dir();
        fs::write(root.join("app.py"), "").unwrap();
        assert!(detect_python_project(&root).unwrap());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn tree_hides_dotfiles_but_marks_config() {
        let root = unique_temp_dir();
        fs::create_dir_all(root.join(CONFIG_DIR)).unwrap();
        fs::write(root.join(CONFIG_DIR).join(CONFIG_FILE), "[theme]\n").unwrap();
        fs::write(root.join("app.py"), "").unwrap();
        fs::write(root.join(".env"), "SECRET=1").unwrap();
        fs::create_dir_all(root.join(".git").join("objects")).unwrap();
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("data").join("prices.csv"), "").unwrap();

        let tree = project_tree(&root, &TreeOptions::default()).unwrap();
        assert!(tree.contains("  app.py\n"));
        assert!(tree.contains("  .streamlit/\n"));
        assert!(tree.contains("    ✅ config.toml\n"));
        assert!(tree.contains("  data/\n"));
        assert!(tree.contains("    prices.csv\n"));
        assert!(!tree.contains(".env"));
        assert!(!tree.contains(".git"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn vanished_subdirectory_is_skipped() {
        let root = unique_temp_dir();
        let mut out = String::from("kept\n");
        walk_subdirectory(&root.join("gone"), &mut out, 2, &TreeOptions::default());
        assert_eq!(out, "kept\n");

        assert!(project_tree(&root.join("gone"), &TreeOptions::default()).is_err());

        let _ = fs::remove_dir_all(&root);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_keeps_rest_of_tree() {
        use std::os::unix::fs::PermissionsExt;

        let root = unique_temp_dir();
        let locked = root.join("a_locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("secret.txt"), "").unwrap();
        fs::create_dir_all(root.join("b_open")).unwrap();
        fs::write(root.join("b_open").join("notes.txt"), "").unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let readable_anyway = fs::read_dir(&locked).is_ok();
        let tree = project_tree(&root, &TreeOptions::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let tree = tree.unwrap();
        assert!(tree.contains("  a_locked/\n"));
        assert!(tree.contains("  b_open/\n"));
        assert!(tree.contains("    notes.txt\n"));
        if !readable_anyway {
            assert!(!tree.contains("secret.txt"));
        }

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn tree_stops_at_max_depth() {
        let root = unique_temp_dir();
        let deep = root.join("a").join("b").join("c");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("hidden_by_depth.txt"), "").unwrap();

        let tree = project_tree(&root, &TreeOptions { max_depth: 3 }).unwrap();
        assert!(tree.contains("    b/\n"));
        assert!(!tree.contains("c/"));
        assert!(!tree.contains("hidden_by_depth.txt"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn success_reports_directory_state_and_size() {
        let done = Materialized {
            directory: Utf8PathBuf::from(CONFIG_DIR),
            directory_state: DirState::Existing,
            path: Utf8PathBuf::from(".streamlit/config.toml"),
            bytes_written: 42,
            size_on_disk: 42,
            modified: None,
        };
        let text = success(&done);
        assert!(text.starts_with("📁 Directory already exists: .streamlit\n"));
        assert!(text.contains("✅ Created config file: .streamlit/config.toml\n"));
        assert!(text.contains("📄 File size: 42 bytes\n"));
        assert!(!text.contains("Written at"));
    }

    #[test]
    fn failure_includes_reason() {
        let err = FilesystemError::Write {
            path: Utf8PathBuf::from(".streamlit/config.toml"),
            created_directory: None,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        let text = failure(&err);
        assert!(text.starts_with("❌ Error creating config file: "));
        assert!(text.contains("writing .streamlit/config.toml: permission denied"));
        assert!(text.contains("check permissions and try again"));
    }

    #[test]
    fn failure_mentions_directory_created_before_write() {
        let err = FilesystemError::Write {
            path: Utf8PathBuf::from(".streamlit/config.toml"),
            created_directory: Some(Utf8PathBuf::from(CONFIG_DIR)),
            source: io::Error::new(io::ErrorKind::Other, "no space left on device"),
        };
        let text = failure(&err);
        assert!(text.starts_with("✅ Created directory: .streamlit\n"));
        assert!(text.contains("❌ Error creating config file: writing .streamlit/config.toml"));
    }

    #[test]
    fn dry_run_warns_when_directory_path_is_taken() {
        let preview = Preview {
            directory: Utf8PathBuf::from(CONFIG_DIR),
            directory_exists: false,
            directory_collision: true,
            path: Utf8PathBuf::from(".streamlit/config.toml"),
            file_exists: false,
            bytes: 10,
        };
        let text = dry_run(&preview);
        assert_eq!(
            text,
            "[dry-run] would fail: .streamlit exists but is not a directory\n"
        );
    }

    #[test]
    fn dry_run_describes_pending_changes() {
        let preview = Preview {
            directory: Utf8PathBuf::from(CONFIG_DIR),
            directory_exists: true,
            directory_collision: false,
            path: Utf8PathBuf::from(".streamlit/config.toml"),
            file_exists: true,
            bytes: 10,
        };
        let text = dry_run(&preview);
        assert!(text.contains("directory already exists: .streamlit"));
        assert!(text.contains("would overwrite .streamlit/config.toml (10 bytes)"));
    }

    #[test]
    fn next_steps_summarize_embedded_settings() {
        let text = next_steps(ConfigPayload::streamlit().unwrap());
        assert!(text.contains("1. Test locally: streamlit run app.py"));
        assert!(text.contains("Theme with primary color #1f77b4 (sans serif)"));
        assert!(text.contains("Uploads up to 200 MB, messages up to 200 MB"));
        assert!(text.contains("Security: XSRF protection, usage stats off, error details hidden"));
        assert!(text.contains("Sections: theme, server, browser, logger, client"));
    }
}
