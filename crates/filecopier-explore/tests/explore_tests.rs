use chrono::{TimeZone, Utc};
use filecopier_explore::{
    CopyConfig, CopyError, DirEntryInfo, Explorer, FileSystem, LocalFs, copy_files,
    copy_files_with,
};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn create_test_tree() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("src/nested/deep")).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();

    fs::write(root.join("main.rs"), "fn main() {}").unwrap();
    fs::write(root.join("Cargo.toml"), "[package]").unwrap();
    fs::write(root.join("README.md"), "# readme").unwrap();
    fs::write(root.join("src/lib.rs"), "pub mod nested;").unwrap();
    fs::write(root.join("src/notes.txt"), "skip me").unwrap();
    fs::write(root.join("src/nested/mod.rs"), "pub mod deep;").unwrap();
    fs::write(root.join("src/nested/deep/data.bin"), [0u8, 159, 146, 150]).unwrap();
    fs::write(root.join("src/nested/deep/leaf.rs"), "// leaf").unwrap();
    fs::write(root.join("docs/guide.MD"), "case differs").unwrap();

    temp
}

/// Every regular file under `root`, keyed by its path relative to `root`.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

fn config(src: &Path, out: &Path, types: &str, workers: usize) -> CopyConfig {
    CopyConfig::from_raw_types(src, out, types, workers).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_copies_exactly_the_matched_files() {
    let src = create_test_tree();
    let out = TempDir::new().unwrap();

    let summary = copy_files(config(src.path(), out.path(), "rs,toml", 4))
        .await
        .unwrap();

    let copied = snapshot(&summary.output_root);
    let expected: BTreeMap<PathBuf, Vec<u8>> = snapshot(src.path())
        .into_iter()
        .filter(|(path, _)| {
            let name = path.to_string_lossy();
            name.ends_with(".rs") || name.ends_with(".toml")
        })
        .collect();

    assert_eq!(copied, expected);
    assert_eq!(summary.files_copied, 5);
    assert_eq!(summary.dirs_explored, 6);
    assert_eq!(
        summary.bytes_copied,
        expected.values().map(|v| v.len() as u64).sum::<u64>()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_output_root_is_timestamped_under_output_dir() {
    let src = create_test_tree();
    let out = TempDir::new().unwrap();

    let summary = copy_files(config(src.path(), out.path(), "rs", 2))
        .await
        .unwrap();

    assert_eq!(summary.output_root.parent(), Some(out.path()));
    let name = summary.output_root.file_name().unwrap().to_string_lossy();
    assert_eq!(
        name,
        format!("copied_files_{}", summary.started_at.timestamp())
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_count_does_not_change_result() {
    let src = create_test_tree();
    let out_one = TempDir::new().unwrap();
    let out_eight = TempDir::new().unwrap();

    let one = copy_files(config(src.path(), out_one.path(), "rs,bin,md", 1))
        .await
        .unwrap();
    let eight = copy_files(config(src.path(), out_eight.path(), "rs,bin,md", 8))
        .await
        .unwrap();

    assert_eq!(snapshot(&one.output_root), snapshot(&eight.output_root));
    assert_eq!(one.files_copied, eight.files_copied);
    assert_eq!(one.dirs_explored, eight.dirs_explored);
}

#[tokio::test]
async fn test_no_matches_still_creates_empty_root() {
    let src = create_test_tree();
    let out = TempDir::new().unwrap();

    let summary = copy_files(config(src.path(), out.path(), "xyz", 3))
        .await
        .unwrap();

    assert!(summary.output_root.is_dir());
    assert_eq!(fs::read_dir(&summary.output_root).unwrap().count(), 0);
    assert_eq!(summary.files_copied, 0);
}

#[tokio::test]
async fn test_repeated_root_name_in_tree() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("proj");
    fs::create_dir_all(src.join("lib/proj")).unwrap();
    fs::write(src.join("lib/proj/inner.rs"), "inner").unwrap();
    let out = TempDir::new().unwrap();

    let summary = copy_files(config(&src, out.path(), "rs", 2)).await.unwrap();

    assert_eq!(
        fs::read_to_string(summary.output_root.join("lib/proj/inner.rs")).unwrap(),
        "inner"
    );
}

#[tokio::test]
async fn test_missing_source_is_configuration_error() {
    let temp = TempDir::new().unwrap();
    let err = copy_files(config(&temp.path().join("nope"), temp.path(), "rs", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, CopyError::ConfigurationInvalid { .. }));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_same_second_runs_collide() {
    let src = create_test_tree();
    let out = TempDir::new().unwrap();
    let fs: Arc<dyn FileSystem> = Arc::new(LocalFs);
    let started = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let later = Utc.timestamp_opt(1_700_000_001, 0).unwrap();

    let first = Explorer::new(config(src.path(), out.path(), "rs", 2), Arc::clone(&fs))
        .started_at(started)
        .run(CancellationToken::new())
        .await
        .unwrap();
    let second = Explorer::new(config(src.path(), out.path(), "rs", 2), Arc::clone(&fs))
        .started_at(later)
        .run(CancellationToken::new())
        .await
        .unwrap();
    assert_ne!(first.output_root, second.output_root);

    let err = Explorer::new(config(src.path(), out.path(), "rs", 2), fs)
        .started_at(started)
        .run(CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        CopyError::OutputDirCreate { path, .. } => assert_eq!(path, first.output_root),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let src = create_test_tree();
    let out = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = copy_files_with(
        config(src.path(), out.path(), "rs", 2),
        Arc::new(LocalFs),
        cancel,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CopyError::Cancelled));
}

/// Local filesystem that fails chosen operations and tracks concurrent listings.
#[derive(Default)]
struct FaultyFs {
    deny_list: Option<PathBuf>,
    deny_write: Option<String>,
    sorted: bool,
    listing_delay: Duration,
    listing_now: AtomicUsize,
    listing_peak: AtomicUsize,
}

impl FileSystem for FaultyFs {
    fn dir_exists(&self, path: &Path) -> bool {
        LocalFs.dir_exists(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        LocalFs.create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        LocalFs.create_dir_all(path)
    }

    fn list_entries(&self, path: &Path) -> io::Result<Vec<DirEntryInfo>> {
        let now = self.listing_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.listing_peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.listing_delay);
        let result = if self.deny_list.as_deref() == Some(path) {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        } else {
            LocalFs.list_entries(path).map(|mut entries| {
                if self.sorted {
                    entries.sort_by(|a, b| a.name.cmp(&b.name));
                }
                entries
            })
        };
        self.listing_now.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        LocalFs.read_file(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        if name.is_some() && name == self.deny_write {
            return Err(io::Error::other("disk full"));
        }
        LocalFs.write_file(path, contents)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_unreadable_directory_fails_run() {
    let src = create_test_tree();
    let out = TempDir::new().unwrap();
    let locked = src.path().join("src/nested");
    let fs = Arc::new(FaultyFs {
        deny_list: Some(locked.clone()),
        ..Default::default()
    });

    let err = copy_files_with(
        config(src.path(), out.path(), "rs", 4),
        fs,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    match err {
        CopyError::DirectoryRead { path, source } => {
            assert_eq!(path, locked);
            assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Only files from directories listed before the failure can exist.
    let allowed = [Path::new("main.rs"), Path::new("src/lib.rs")];
    let copied = snapshot(out.path());
    for path in copied.keys() {
        let rel: PathBuf = path.components().skip(1).collect();
        assert!(allowed.contains(&rel.as_path()), "unexpected copy: {path:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_dispatch_after_failure() {
    let src = TempDir::new().unwrap();
    let bad = src.path().join("a_bad");
    fs::create_dir(&bad).unwrap();
    fs::create_dir(src.path().join("b_good")).unwrap();
    fs::write(src.path().join("b_good/x.rs"), "x").unwrap();
    let out = TempDir::new().unwrap();
    let fs = Arc::new(FaultyFs {
        deny_list: Some(bad.clone()),
        sorted: true,
        listing_delay: Duration::from_millis(20),
        ..Default::default()
    });

    // One worker and a FIFO queue: `a_bad` is dispatched before `b_good`,
    // and its permit only comes back once its error is recorded.
    let err = copy_files_with(
        config(src.path(), out.path(), "rs", 1),
        fs,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CopyError::DirectoryRead { ref path, .. } if *path == bad));
    let copied = snapshot(out.path());
    assert!(
        copied.keys().all(|p| !p.ends_with("b_good/x.rs")),
        "copied after failure: {copied:?}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_write_failure_surfaces_one_error() {
    let src = create_test_tree();
    let out = TempDir::new().unwrap();
    let fs = Arc::new(FaultyFs {
        deny_write: Some("leaf.rs".to_string()),
        ..Default::default()
    });

    let err = copy_files_with(
        config(src.path(), out.path(), "rs", 4),
        fs,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CopyError::FileWrite { ref path, .. } if path.ends_with("src/nested/deep/leaf.rs")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_running_tasks_never_exceed_workers() {
    let temp = TempDir::new().unwrap();
    for i in 0..24 {
        let dir = temp.path().join(format!("d{i}"));
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("f.rs"), format!("{i}")).unwrap();
    }
    let out = TempDir::new().unwrap();
    let fs = Arc::new(FaultyFs {
        listing_delay: Duration::from_millis(5),
        ..Default::default()
    });

    let summary = copy_files_with(
        config(temp.path(), out.path(), "rs", 3),
        Arc::clone(&fs) as Arc<dyn FileSystem>,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(summary.files_copied, 24);
    assert_eq!(summary.dirs_explored, 25);
    assert!(fs.listing_peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(fs.listing_now.load(Ordering::SeqCst), 0);
}
