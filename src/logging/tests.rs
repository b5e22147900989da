use super::*;

#[test]
fn test_log_format_parse() {
    assert_eq!(LogFormat::parse("json"), LogFormat::Json);
    assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
    assert_eq!(LogFormat::parse("term"), LogFormat::Term);
    assert_eq!(LogFormat::parse(""), LogFormat::Term);
    assert_eq!(LogFormat::parse("yaml"), LogFormat::Term);
}

#[test]
fn test_root_loggers_accept_records() {
    for format in [LogFormat::Term, LogFormat::Json] {
        let log = root(format).new(o!("function" => "logging::tests"));
        info!(log, "logger ready"; "format" => ?format);
    }
}

