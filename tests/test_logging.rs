//! Tests for logging configuration and format parsing
//!
//! Tests the pure functions in the logging module that turn LOG_FORMAT,
//! LOG_LEVEL and LOG_SPANS values into subscriber settings.

use refine_loop::observability::logging::{parse_level, parse_spans_flag, LogFormat};
use tracing::Level;

#[test]
fn test_log_format_parse_known_values() {
    assert!(matches!(LogFormat::parse("json"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("PRETTY"), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("Compact"), LogFormat::Compact));
}

#[test]
fn test_log_format_parse_invalid_defaults_to_json() {
    assert!(matches!(LogFormat::parse("invalid"), LogFormat::Json));
    assert!(matches!(LogFormat::parse(""), LogFormat::Json));
    assert!(matches!(LogFormat::parse("yaml"), LogFormat::Json));
}

#[test]
fn test_log_format_parse_whitespace() {
    assert!(matches!(LogFormat::parse("  pretty  "), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("compact\n"), LogFormat::Compact));
    assert!(matches!(LogFormat::parse("\tjson"), LogFormat::Json));
}

#[test]
fn test_log_level_from_environment_value() {
    assert_eq!(parse_level("error"), Level::ERROR);
    assert_eq!(parse_level("WARN"), Level::WARN);
    assert_eq!(parse_level("debug\n"), Level::DEBUG);
    assert_eq!(parse_level("Trace"), Level::TRACE);
    assert_eq!(parse_level("verbose"), Level::INFO);
    assert_eq!(parse_level(""), Level::INFO);
}

#[test]
fn test_spans_flag() {
    assert!(parse_spans_flag("true"));
    assert!(parse_spans_flag(" TRUE "));
    assert!(!parse_spans_flag("1"));
    assert!(!parse_spans_flag("yes"));
    assert!(!parse_spans_flag(""));
}

#[test]
fn test_repeated_initialization_is_harmless() {
    refine_loop::observability::init_logging(Level::WARN, LogFormat::Compact, false);
    refine_loop::observability::init_logging(Level::DEBUG, LogFormat::Json, true);
}
