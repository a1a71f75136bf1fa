//! 历史日志维护: 过期删除与 gzip 压缩.

use super::LoggingConfig;
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error};

/// 一次维护的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// 删除的过期文件数
    pub removed: usize,
    /// 新压缩的文件数
    pub compressed: usize,
}

pub(super) fn spawn_maintenance_task(handle: &tokio::runtime::Handle, config: LoggingConfig) {
    handle.spawn(async move {
        let period = Duration::from_secs(config.cleanup_interval_seconds.max(1));
        let mut interval = tokio::time::interval(period);
        loop {
            // 首次 tick 立即完成
            interval.tick().await;
            let config = config.clone();
            match tokio::task::spawn_blocking(move || run_maintenance(&config)).await {
                Ok(Ok(report)) => debug!(
                    "日志维护完成: removed={}, compressed={}",
                    report.removed, report.compressed
                ),
                Ok(Err(err)) => error!("日志维护失败: {err:#}"),
                Err(err) => error!("日志维护任务异常: {err}"),
            }
        }
    });
}

/// 执行一次维护
///
/// 早于 `retention_days` 的文件删除; 其余非当天的 `.log` 在 `compress_history` 开启时压缩为 `.log.gz`.
/// 单个文件失败不影响其他文件.
pub fn run_maintenance(config: &LoggingConfig) -> Result<MaintenanceReport> {
    let today = Local::now().date_naive();
    maintain_directory(config, today)
}

fn maintain_directory(config: &LoggingConfig, today: NaiveDate) -> Result<MaintenanceReport> {
    let mut report = MaintenanceReport::default();
    let directory = Path::new(&config.directory);
    if !directory.exists() {
        return Ok(report);
    }

    let cutoff = today - ChronoDuration::days(config.retention_days);
    let entries = fs::read_dir(directory)
        .with_context(|| format!("读取日志目录失败, path={}", directory.display()))?;

    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some((date, compressed)) = parse_log_file_name(&file_name, &config.file_prefix) else {
            continue;
        };
        let path = entry.path();

        if date < cutoff {
            match fs::remove_file(&path) {
                Ok(()) => report.removed += 1,
                Err(err) => error!("删除过期日志失败, path={}: {err}", path.display()),
            }
            continue;
        }

        if config.compress_history && !compressed && date < today {
            match compress_to_gz(&path) {
                Ok(true) => report.compressed += 1,
                Ok(false) => {}
                Err(err) => error!("压缩日志失败: {err:#}"),
            }
        }
    }

    Ok(report)
}

/// 压缩为 `<path>.gz` 并删除原文件; 目标已存在时跳过
fn compress_to_gz(path: &Path) -> Result<bool> {
    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    if gz_path.exists() {
        return Ok(false);
    }

    let mut input =
        File::open(path).with_context(|| format!("打开待压缩日志失败, path={}", path.display()))?;
    let output = File::create(&gz_path)
        .with_context(|| format!("创建压缩日志失败, path={}", gz_path.display()))?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)
        .with_context(|| format!("删除已压缩日志失败, path={}", path.display()))?;
    Ok(true)
}

/// 解析 `<prefix>.<YYYY-MM-DD>.log[.gz]`, 返回日期与是否已压缩
fn parse_log_file_name(file_name: &str, prefix: &str) -> Option<(NaiveDate, bool)> {
    let rest = file_name.strip_prefix(prefix)?.strip_prefix('.')?;
    let (date_part, compressed) = match rest.strip_suffix(".log.gz") {
        Some(date_part) => (date_part, true),
        None => (rest.strip_suffix(".log")?, false),
    };
    if date_part.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    Some((date, compressed))
}
