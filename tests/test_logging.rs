use doorwatch::logging;

#[test]
fn test_logging_writes_file() -> anyhow::Result<()> {
    let data_dir = tempfile::tempdir()?;

    logging::init_logging(data_dir.path(), "test")?;
    tracing::info!("Test info message");
    tracing::warn!("Test warning message");

    let log_file = logging::log_file_path(data_dir.path());
    assert!(log_file.exists());

    let contents = std::fs::read_to_string(&log_file)?;
    assert!(contents.contains("New test session"));
    // Written by the file layer, not the separator
    assert!(contents.contains("Test info message"), "{}", contents);
    assert!(contents.contains("Test warning message"), "{}", contents);

    Ok(())
}
