use std::error::Error;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use tokio::time::sleep;

use pollwatch::bus::{ChangeMessage, LocalBus, FILE_CHANGED_TOPIC};
use pollwatch::discovery::PatternDiscovery;
use pollwatch::fs::RealFileSystem;
use pollwatch::types::WatchOptions;
use pollwatch::watch::Supervisor;
use pollwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const TICK: Duration = Duration::from_millis(10);

fn supervisor(bus: &Arc<LocalBus>) -> Supervisor {
    Supervisor::new(
        Arc::new(RealFileSystem),
        Arc::new(PatternDiscovery::new(["**/*.md"])),
        bus.clone(),
    )
}

/// Same walk-through as the in-memory test, against a real temp directory and
/// the local broadcast bus.
#[tokio::test(start_paused = true)]
async fn changes_on_disk_reach_bus_subscribers() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let root = dir.path().to_path_buf();
    fs::write(root.join("a.md"), "H1")?;
    fs::write(root.join("ignored.rs"), "fn main() {}")?;

    let bus = Arc::new(LocalBus::new());
    let mut rx = bus.subscribe(FILE_CHANGED_TOPIC);
    let supervisor = supervisor(&bus);

    supervisor.start_watching(&root, WatchOptions::default().with_interval(TICK))?;
    assert_eq!(supervisor.list_watched(), vec![root.clone()]);

    sleep(Duration::from_millis(5)).await;
    assert!(rx.try_recv().is_err(), "baseline must not publish");

    fs::write(root.join("a.md"), "H2")?;
    fs::write(root.join("ignored.rs"), "fn main() { loop {} }")?;
    sleep(TICK).await;
    assert_eq!(
        rx.try_recv()?,
        ChangeMessage::FileChanged {
            path: root.join("a.md")
        }
    );
    assert!(rx.try_recv().is_err());

    fs::create_dir_all(root.join("nested"))?;
    fs::write(root.join("nested/b.md"), "H3")?;
    sleep(TICK).await;
    assert_eq!(
        rx.try_recv()?,
        ChangeMessage::FileChanged {
            path: root.join("nested/b.md")
        }
    );
    assert!(rx.try_recv().is_err());

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn start_then_stop_leaves_nothing_watched() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let bus = Arc::new(LocalBus::new());
    let supervisor = supervisor(&bus);

    supervisor.start_watching(dir.path(), WatchOptions::default().with_interval(TICK))?;
    sleep(Duration::from_millis(5)).await;
    with_timeout(supervisor.stop_watching(dir.path())).await?;

    assert!(supervisor.list_watched().is_empty());
    Ok(())
}

/// The watched path goes through a symlinked parent and does not exist yet
/// when watching starts. Creating it must not change which key stops it.
#[cfg(unix)]
#[tokio::test(start_paused = true)]
async fn root_behind_symlink_created_later_can_be_stopped() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    fs::create_dir(dir.path().join("real"))?;
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link"))?;
    let watched = dir.path().join("link/proj");

    let bus = Arc::new(LocalBus::new());
    let mut rx = bus.subscribe(FILE_CHANGED_TOPIC);
    let supervisor = supervisor(&bus);

    let handle = supervisor.start_watching(&watched, WatchOptions::default().with_interval(TICK))?;
    sleep(Duration::from_millis(5)).await;

    fs::create_dir(dir.path().join("real/proj"))?;
    fs::write(dir.path().join("real/proj/a.md"), "H1")?;
    sleep(TICK).await;
    assert_eq!(
        rx.try_recv()?,
        ChangeMessage::FileChanged {
            path: watched.join("a.md")
        }
    );

    with_timeout(supervisor.stop_watching(&watched)).await?;
    assert!(supervisor.list_watched().is_empty());
    assert!(handle.stop_requested());

    Ok(())
}

/// A directory link back to the root must not multiply events or stall the
/// scan.
#[cfg(unix)]
#[tokio::test(start_paused = true)]
async fn self_referencing_links_report_each_file_once() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let root = dir.path().to_path_buf();
    fs::write(root.join("a.md"), "H1")?;
    std::os::unix::fs::symlink(&root, root.join("loop"))?;
    std::os::unix::fs::symlink(&root, root.join("again"))?;

    let bus = Arc::new(LocalBus::new());
    let mut rx = bus.subscribe(FILE_CHANGED_TOPIC);
    let supervisor = supervisor(&bus);

    supervisor.start_watching(&root, WatchOptions::default().with_interval(TICK))?;
    sleep(Duration::from_millis(5)).await;

    fs::write(root.join("a.md"), "H2")?;
    sleep(TICK).await;
    assert_eq!(
        rx.try_recv()?,
        ChangeMessage::FileChanged {
            path: root.join("a.md")
        }
    );
    assert!(rx.try_recv().is_err(), "aliases through links must not be reported");

    with_timeout(supervisor.stop_watching(&root)).await?;
    Ok(())
}
