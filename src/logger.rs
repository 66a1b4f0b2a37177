use std::fmt;
use std::io::Write;

use chrono::{DateTime, Local};
use env_logger::Builder;
use log::{Level, LevelFilter};

use crate::config::LoggingConfig;

/// 这些依赖在 info 级别下过于嘈杂
const QUIET_MODULES: [&str; 3] = ["hyper", "reqwest", "tower_http"];

fn level_color(level: Level) -> &'static str {
    match level {
        Level::Error => "\x1b[31m\x1b[1m", // 红色
        Level::Warn => "\x1b[33m\x1b[1m",  // 黄色
        Level::Info => "\x1b[32m\x1b[1m",  // 绿色
        Level::Debug => "\x1b[36m\x1b[1m", // 青色
        Level::Trace => "\x1b[90m\x1b[1m", // 灰色
    }
}

/// 单行日志：`12:00:01.250 INFO  [ThrowCoach::server] 消息`
fn format_line(
    out: &mut impl Write,
    time: DateTime<Local>,
    level: Level,
    target: &str,
    args: &fmt::Arguments<'_>,
    color: bool,
) -> std::io::Result<()> {
    let time = time.format("%H:%M:%S%.3f");
    if color {
        writeln!(out, "{} {}{:<5}\x1b[0m [{}] {}", time, level_color(level), level, target, args)
    } else {
        writeln!(out, "{} {:<5} [{}] {}", time, level, target, args)
    }
}

/// 初始化日志；RUST_LOG 优先于配置中的级别，设置 NO_COLOR 时关闭颜色
pub fn init_logger(config: &LoggingConfig) {
    let color = config.color && std::env::var_os("NO_COLOR").is_none();

    let mut builder = Builder::from_env(env_logger::Env::default().default_filter_or(config.level.as_str()));
    for module in QUIET_MODULES {
        builder.filter_module(module, LevelFilter::Warn);
    }
    builder
        .format(move |buf, record| {
            format_line(buf, Local::now(), record.level(), record.target(), record.args(), color)
        })
        .init();
}
