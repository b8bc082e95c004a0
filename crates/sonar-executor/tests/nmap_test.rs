//! Process-level tests against fake nmap scripts.
//!
//! Everything runs in one test function: writing an executable while another
//! test thread forks can leave the file busy (ETXTBSY) when it is exec'd.

#![cfg(unix)]

use sonar_core::{ExecutionContext, JobParameters, ScanError, ScanType};
use sonar_executor::{NmapExecutor, ScanExecutor};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const WRITE_REPORT: &str = r#"
if [ "$1" = "--version" ]; then
  echo "Nmap version 7.94 ( https://nmap.org )"
  echo "Platform: x86_64-pc-linux-gnu"
  exit 0
fi
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-oX" ]; then out="$2"; fi
  shift
done
cat "$FIXTURE" > "$out"
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/report.xml");
    let script = format!(
        "#!/bin/sh\nFIXTURE='{}'\n{}",
        fixture.display(),
        body
    );
    fs::write(&path, script).expect("write fake nmap");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake nmap");
    path
}

fn params() -> JobParameters {
    JobParameters::new("10.0.0.0/30")
        .with_ports("22,80,445")
        .with_scan_type(ScanType::Connect)
        .with_timing_template(3)
}

#[tokio::test]
async fn fake_nmap_end_to_end() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let ok = write_script(dir.path(), "nmap-ok", WRITE_REPORT);
    let slow = write_script(dir.path(), "nmap-slow", "exec sleep 30\n");
    let broken = write_script(
        dir.path(),
        "nmap-broken",
        "echo 'Failed to resolve \"10.0.0.0/30\".' >&2\nexit 1\n",
    );
    let garbage = write_script(
        dir.path(),
        "nmap-garbage",
        "for a in \"$@\"; do last=\"$a\"; done\nprintf '<nmaprun><host>' > \"$last\"\n",
    );

    // Successful run
    let executor = NmapExecutor::new(ok.to_string_lossy());
    let ctx = ExecutionContext::with_timeout(Duration::from_secs(30));
    let result = executor
        .execute_scan(&ctx, &params())
        .await
        .expect("scan succeeds");

    assert_eq!(result.up_hosts, 1);
    assert_eq!(result.hosts.len(), 1);
    assert!(!result.id.is_empty());
    assert!(result.scan_id.is_empty());
    let expected_prefix = format!("{} 10.0.0.0/30 -p 22,80,445 -sT -T3 -oX ", ok.display());
    assert!(
        result.command.starts_with(&expected_prefix),
        "unexpected command: {}",
        result.command
    );
    assert!(result.command.ends_with(".xml"));

    assert!(executor.is_available().await);
    assert_eq!(
        executor.version().await.expect("version"),
        "Nmap version 7.94 ( https://nmap.org )"
    );

    // Deadline tears the child down
    let executor = NmapExecutor::new(slow.to_string_lossy());
    let ctx = ExecutionContext::with_timeout(Duration::from_millis(200));
    let started = Instant::now();
    let err = executor.execute_scan(&ctx, &params()).await.unwrap_err();
    assert!(matches!(err, ScanError::Timeout(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));

    // Explicit cancellation
    let token = CancellationToken::new();
    let ctx = ExecutionContext::new(token.clone(), Duration::from_secs(30));
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });
    let started = Instant::now();
    let err = executor.execute_scan(&ctx, &params()).await.unwrap_err();
    canceller.await.expect("canceller joins");
    assert!(matches!(err, ScanError::Canceled(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(10));

    // Non-zero exit
    let executor = NmapExecutor::new(broken.to_string_lossy());
    let ctx = ExecutionContext::with_timeout(Duration::from_secs(30));
    let err = executor.execute_scan(&ctx, &params()).await.unwrap_err();
    assert!(matches!(err, ScanError::Internal { .. }), "got {err:?}");

    // Unparsable report
    let executor = NmapExecutor::new(garbage.to_string_lossy());
    let err = executor.execute_scan(&ctx, &params()).await.unwrap_err();
    assert!(
        matches!(err, ScanError::Internal { ref message, .. } if message == "failed to parse nmap output"),
        "got {err:?}"
    );

    // Missing binary
    let executor = NmapExecutor::new(dir.path().join("missing-nmap").to_string_lossy());
    let err = executor.execute_scan(&ctx, &params()).await.unwrap_err();
    assert!(matches!(err, ScanError::Internal { .. }), "got {err:?}");
    assert!(!executor.is_available().await);
    assert!(matches!(
        executor.version().await,
        Err(ScanError::Unavailable(_))
    ));
}
