use {
    anyhow::Result,
    std::{
        fs::{
            create_dir_all,
            File,
        },
        path::Path,
        sync::Arc,
    },
    tracing::Level,
    tracing_subscriber::{
        fmt::{
            layer,
            writer::MakeWriterExt,
        },
        layer::SubscriberExt,
        util::SubscriberInitExt,
    },
};

/// Install a subscriber that logs training to `path` and/or stdout.
///
/// A writer is only installed when it has a level, and then receives events
/// at or above that level. With neither level nothing is installed and no
/// log file is created.
pub fn setup_logging(
    path: &dyn AsRef<Path>,
    file_level: Option<Level>,
    stdout_level: Option<Level>,
) -> Result<()> {
    if file_level.is_none() && stdout_level.is_none() {
        return Ok(());
    }

    let file_layer = match file_level {
        Some(level) => {
            if let Some(dir) = path.as_ref().parent() {
                create_dir_all(dir)?;
            }
            let log_file = Arc::new(File::create(path)?);
            Some(layer().with_writer(log_file.with_max_level(level)).with_ansi(false))
        }
        None => None,
    };

    let stdout_layer = stdout_level.map(|level| {
        layer()
            .with_writer(std::io::stdout.with_max_level(level))
            .compact()
            .with_line_number(true)
            .with_thread_ids(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(())
}
