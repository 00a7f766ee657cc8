//! Startup tasks: logger, encoder check, folder initialization.

use crate::config::{ExecutorConfig, RunConfig};
use anstyle::{AnsiColor, Style};
use anyhow::{Context, Result, bail};
use env_logger::Builder;
use log::{LevelFilter, info, kv::Key};
use std::{fs, io::Write};

// ────────────────────────────────────────────────────────────────
// Logger Initialization
// ────────────────────────────────────────────────────────────────

/// Installs the global logger. `RUST_LOG` refines `level` when set.
pub fn initialize_logger(level: LevelFilter) -> Result<()> {
    Builder::new()
        .format(|buf, record| {
            let dim = Style::new().dimmed();
            let ts = buf.timestamp();

            let level_style = buf.default_level_style(record.level());

            let dur_style = Style::new().fg_color(Some(AnsiColor::Cyan.into()));
            let dur = record
                .key_values()
                .get(Key::from("duration"))
                .map(|v| format!("{:>10}", v.to_string()))
                .unwrap_or_else(|| " ".repeat(10));

            writeln!(
                buf,
                "{}{}{} {}{:<5}{} {}{}{} {}{}{} {}",
                dim.render(),
                ts,
                dim.render_reset(),
                level_style.render(),
                record.level(),
                level_style.render_reset(),
                dim.render(),
                record.target(),
                dim.render_reset(),
                dur_style.render(),
                dur,
                dur_style.render_reset(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .context("failed to install logger")
}

// ────────────────────────────────────────────────────────────────
// Encoder Check
// ────────────────────────────────────────────────────────────────

/// Refuses to start when the encoder binary is missing, before anything is claimed.
pub fn check_encoder(config: &ExecutorConfig) -> Result<()> {
    let binary = &config.binary_path;
    match fs::metadata(binary) {
        Ok(meta) if meta.is_file() => {
            info!("Using encoder {:?}", binary);
            Ok(())
        }
        Ok(_) => bail!("encoder path {:?} is not a file", binary),
        Err(err) => Err(err).with_context(|| {
            format!(
                "encoder {:?} is not installed; set RECAST_ENCODER to its location",
                binary
            )
        }),
    }
}

// ────────────────────────────────────────────────────────────────
// Folder Initialization
// ────────────────────────────────────────────────────────────────

/// Creates the marker and archive roots. The source root is never created.
pub fn initialize_folder(config: &RunConfig) -> Result<()> {
    for dir in [&config.log_root, &config.archive_root] {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {:?}", dir))?;
    }
    Ok(())
}
