use std::io::Write;

use anstyle::{AnsiColor, Color, RgbColor, Style};

/// 日志的默认级别，可以通过 `RUST_LOG` 覆盖
const DEFAULT_LEVEL: log::LevelFilter = log::LevelFilter::Info;

/// 初始化全局 logger
///
/// 输出格式：`[HH:MM:SS] LEVEL [file:line] message`
///
/// 重复调用是安全的，只有第一次调用会生效
pub fn init_log() {
    init_log_with_level(DEFAULT_LEVEL);
}

pub fn init_log_with_level(level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .format(|buf, record| {
            let level_style = level_style(record.level());
            let file_style = Style::new().fg_color(Some(Color::Rgb(RgbColor(110, 110, 110))));
            let msg_style = Style::new().fg_color(Some(Color::Rgb(RgbColor(75, 75, 75))));

            let time = chrono::Local::now().format("%H:%M:%S");
            let file = short_file_name(record.file().unwrap_or(""));
            let line = record.line().unwrap_or(!0);

            writeln!(
                buf,
                "{level_style}[{time}] {}{level_style:#} {file_style}[{file}:{line}]{file_style:#} \
                 {msg_style}{}{msg_style:#}",
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .parse_default_env()
        .try_init();

    if result.is_err() {
        log::debug!("logger already initialized");
    }
}

fn level_style(level: log::Level) -> Style {
    let color = match level {
        log::Level::Error => AnsiColor::Red,
        log::Level::Warn => AnsiColor::Yellow,
        log::Level::Info => AnsiColor::Green,
        log::Level::Debug => AnsiColor::Blue,
        log::Level::Trace => AnsiColor::Magenta,
    };
    Style::new().fg_color(Some(Color::Ansi(color)))
}

/// 只保留文件名，兼容 windows 和 unix 的路径分隔符
fn short_file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_file_name_strips_both_separators() {
        assert_eq!(short_file_name("engine\\crates\\ember-gfx\\src\\lib.rs"), "lib.rs");
        assert_eq!(short_file_name("engine/crates/ember-gfx/src/device.rs"), "device.rs");
        assert_eq!(short_file_name("main.rs"), "main.rs");
        assert_eq!(short_file_name(""), "");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_log();
        init_log_with_level(log::LevelFilter::Debug);
    }
}
