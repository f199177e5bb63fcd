//! 日志系统配置
//!
//! 控制台输出加可选的文件持久化，按文件大小滚动，自动清理过期日志

use crate::config::LogConfig;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "order-intake";

/// 日志文件写入器（内部状态）
///
/// 负责日志文件的创建、按大小滚动和写入
struct RollingLogFileInner {
    /// 服务启动时间戳（格式：YYYY-MM-DD-HHMMSS）
    start_timestamp: String,
    /// 日志目录路径
    log_dir: PathBuf,
    /// 当前文件句柄
    current_file: Option<File>,
    /// 当前文件序号（0 为基础文件，1、2、3... 为滚动文件）
    current_index: u32,
    /// 单个文件最大大小（字节）
    max_file_size: u64,
    /// 当前文件已写入的字节数
    current_size: u64,
}

impl RollingLogFileInner {
    fn new(log_dir: PathBuf, max_file_size: u64) -> io::Result<Self> {
        let start_timestamp = Local::now().format("%Y-%m-%d-%H%M%S").to_string();

        let mut inner = Self {
            start_timestamp,
            log_dir,
            current_file: None,
            current_index: 0,
            max_file_size,
            current_size: 0,
        };

        inner.open_next_file()?;

        Ok(inner)
    }

    /// 生成日志文件路径
    fn file_path(&self, index: u32) -> PathBuf {
        let filename = if index == 0 {
            format!("{}.{}.log", LOG_FILE_PREFIX, self.start_timestamp)
        } else {
            format!("{}.{}_{}.log", LOG_FILE_PREFIX, self.start_timestamp, index)
        };
        self.log_dir.join(filename)
    }

    fn open_next_file(&mut self) -> io::Result<()> {
        let path = self.file_path(self.current_index);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        self.current_file = Some(file);
        self.current_size = 0;

        Ok(())
    }

    /// 滚动到新文件
    fn rotate(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.current_file.take() {
            file.flush()?;
        }

        self.current_index += 1;
        self.open_next_file()
    }

    fn write_data(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.current_size + buf.len() as u64 > self.max_file_size {
            self.rotate()?;
        }

        match &mut self.current_file {
            Some(file) => {
                let written = file.write(buf)?;
                self.current_size += written as u64;
                Ok(written)
            }
            None => Err(io::Error::new(io::ErrorKind::Other, "日志文件未打开")),
        }
    }

    fn flush_file(&mut self) -> io::Result<()> {
        if let Some(file) = &mut self.current_file {
            file.flush()?;
        }
        Ok(())
    }
}

/// 日志文件写入器（线程安全包装）
///
/// 实现 Write trait，作为 tracing-appender 的输出目标
pub struct RollingLogFile {
    inner: Arc<Mutex<RollingLogFileInner>>,
}

impl RollingLogFile {
    pub fn new(log_dir: PathBuf, max_file_size: u64) -> io::Result<Self> {
        let inner = RollingLogFileInner::new(log_dir, max_file_size)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }
}

impl Write for RollingLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        inner.write_data(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.flush_file()
    }
}

impl Clone for RollingLogFile {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// 日志系统守卫
/// 必须保持存活，否则日志写入线程会终止
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// 初始化日志系统
///
/// # Arguments
/// * `config` - 日志配置
///
/// # Returns
/// * `LogGuard` - 日志守卫，需要保持存活直到程序结束
pub fn init_logging(config: &LogConfig) -> LogGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_ansi(true);

    if !config.enabled {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        info!("日志系统初始化完成（仅控制台输出）");
        return LogGuard { _file_guard: None };
    }

    if let Err(e) = fs::create_dir_all(&config.log_dir) {
        eprintln!(
            "创建日志目录失败: {:?}, 错误: {}, 回退到仅控制台输出",
            config.log_dir, e
        );
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return LogGuard { _file_guard: None };
    }

    let rolling_file = match RollingLogFile::new(config.log_dir.clone(), config.max_file_size) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("创建日志文件失败: {}, 回退到仅控制台输出", e);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .init();
            return LogGuard { _file_guard: None };
        }
    };

    let (non_blocking, file_guard) = tracing_appender::non_blocking(rolling_file);

    // 文件输出层（不带 ANSI 颜色）
    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        "日志系统初始化完成: 目录={:?}, 保留天数={}, 级别={}, 单文件最大={:.1}MB",
        config.log_dir,
        config.retention_days,
        config.level,
        config.max_file_size as f64 / 1024.0 / 1024.0
    );

    cleanup_old_logs(&config.log_dir, config.retention_days);

    LogGuard {
        _file_guard: Some(file_guard),
    }
}

/// 清理过期日志文件
///
/// 文件格式：order-intake.YYYY-MM-DD-HHMMSS.log 和 order-intake.YYYY-MM-DD-HHMMSS_N.log
fn cleanup_old_logs(log_dir: &Path, retention_days: u32) {
    let today = Local::now().date_naive();
    let retention = chrono::Duration::days(retention_days as i64);

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("读取日志目录失败: {:?}, 错误: {}", log_dir, e);
            return;
        }
    };

    let mut deleted_count = 0;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|s| s.to_str()) {
            Some(name) => name,
            None => continue,
        };

        if !filename.starts_with(LOG_FILE_PREFIX) || !filename.ends_with(".log") {
            continue;
        }

        let should_delete = match extract_date_from_filename(filename) {
            Some(date_str) => match chrono::NaiveDate::parse_from_str(&date_str, "%Y-%m-%d") {
                Ok(file_date) => today.signed_duration_since(file_date) > retention,
                Err(_) => false,
            },
            None => false,
        };

        if should_delete {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!("删除过期日志文件失败: {:?}, 错误: {}", path, e);
            } else {
                deleted_count += 1;
                tracing::debug!("已删除过期日志文件: {:?}", path);
            }
        }
    }

    if deleted_count > 0 {
        info!("已清理 {} 个过期日志文件", deleted_count);
    }
}

/// 从文件名中提取日期部分 (YYYY-MM-DD)
fn extract_date_from_filename(filename: &str) -> Option<String> {
    let name = filename.strip_prefix(LOG_FILE_PREFIX)?;
    let name = name.strip_prefix('.')?;
    let name = name.strip_suffix(".log")?;

    // 格式：YYYY-MM-DD-HHMMSS 或 YYYY-MM-DD-HHMMSS_N
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() >= 3 {
        Some(format!("{}-{}-{}", parts[0], parts[1], parts[2]))
    } else {
        None
    }
}
