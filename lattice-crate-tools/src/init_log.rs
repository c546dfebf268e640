use std::io::Write;

/// 初始化 env_logger
///
/// 默认使用 `default_level`，设置了 `RUST_LOG` 时以环境变量为准。
/// 重复调用只有第一次生效。
pub fn init_log(default_level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .format(|buf, record| {
            let level_color = match record.level() {
                log::Level::Error => anstyle::AnsiColor::Red,
                log::Level::Warn => anstyle::AnsiColor::Yellow,
                log::Level::Info => anstyle::AnsiColor::Green,
                log::Level::Debug => anstyle::AnsiColor::Blue,
                log::Level::Trace => anstyle::AnsiColor::Magenta,
            };
            let level_style =
                buf.default_level_style(record.level()).fg_color(Some(anstyle::Color::Ansi(level_color)));
            let grey_style =
                anstyle::Style::new().fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(110, 110, 110))));

            let line = record.line().unwrap_or(0);
            let file = record.file().unwrap_or("").rsplit(['/', '\\']).next().unwrap_or("");
            let time = chrono::Local::now().format("%H:%M:%S%.3f");
            let level = record.level();

            writeln!(
                buf,
                "{level_style}[{time}] {level:<5}{level_style:#} {grey_style}[{file}:{line}]{grey_style:#} {}",
                record.args()
            )
        })
        .filter(None, default_level)
        .parse_default_env()
        .try_init();

    if let Err(err) = result {
        log::debug!("logger already initialized: {}", err);
    }
}
