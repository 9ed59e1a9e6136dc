use log::LevelFilter;

pub fn setup(is_debug: bool) -> Result<(), fern::InitError> {
    let log_level = if is_debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%H:%M:%S%.3f]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log_level);

    if is_debug {
        logger = logger.chain(std::io::stdout());
    } else {
        let log_path = data::data_path(Some("pulseboard.log"));
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        logger = logger.chain(fern::log_file(log_path)?);
    }

    logger.apply()?;
    Ok(())
}
