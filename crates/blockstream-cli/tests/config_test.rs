use blockstream_cli::Config;
use std::io::Write;

#[test]
fn test_explicit_file_layers_over_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[parser]\npreview_partial_lines = true\n\n[stream]\nchannel_capacity = 8").unwrap();

    let config = Config::load(Some(file.path())).unwrap();
    assert!(config.parser.preview_partial_lines);
    assert_eq!(config.stream.channel_capacity, 8);
    assert_eq!(config.stream.chunk_size, 16);

    let session = config.session();
    assert_eq!(session.channel_capacity, 8);
    assert!(session.parser.preview_partial_lines);
}

#[test]
fn test_missing_explicit_file_fails() {
    assert!(Config::load(Some(std::path::Path::new("/nonexistent/blockstream.toml"))).is_err());
}
